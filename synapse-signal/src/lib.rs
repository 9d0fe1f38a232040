//! Synchronous signal/slot primitive.
//!
//! A [`Signal`] holds an ordered set of subscribers and, on emission, invokes
//! each live subscriber with the same argument. Subscriptions are represented
//! by [`Connection`] handles: dropping a connection unsubscribes it, and
//! dropping the signal makes every outstanding connection inert without
//! destroying it.
//!
//! Emission is mutation-safe under reentrancy: a slot invoked during an
//! emission may disconnect any connection (itself included, visited or not),
//! connect new slots, trigger a nested emission of the same signal, or drop
//! the signal outright. The subscriber registry is a linked list over a slab
//! (`synapse-collections`), so connect and disconnect are O(1) with no
//! per-subscription allocation beyond the slot itself.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use synapse_signal::Signal;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sig = Signal::new();
//!
//! let mut conns: Vec<_> = (1..=3)
//!     .map(|i| {
//!         let log = Rc::clone(&log);
//!         sig.connect(move |_: &i32| log.borrow_mut().push(i))
//!     })
//!     .collect();
//!
//! sig.emit(&0);
//! assert_eq!(*log.borrow(), [1, 2, 3]);
//!
//! // Dropping the second connection unsubscribes it
//! drop(conns.remove(1));
//! sig.emit(&0);
//! assert_eq!(*log.borrow(), [1, 2, 3, 1, 3]);
//! ```
//!
//! # Reentrancy
//!
//! Slot closures are `'static`, so a slot that wants to reach back into its
//! own signal captures an [`Emitter`] (a weak handle, cloneable) rather than
//! borrowing the [`Signal`]:
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use synapse_signal::Signal;
//!
//! let sig = Signal::new();
//! let emitter = sig.emitter();
//!
//! let depth = Rc::new(Cell::new(0));
//! let _conn = {
//!     let depth = Rc::clone(&depth);
//!     sig.connect(move |v: &u32| {
//!         depth.set(depth.get().max(*v));
//!         if *v < 3 {
//!             emitter.emit(&(*v + 1)); // nested emission of the same signal
//!         }
//!     })
//! };
//!
//! sig.emit(&1);
//! assert_eq!(depth.get(), 3);
//! ```
//!
//! # Threading
//!
//! Single-threaded by design: `Signal`, `Connection` and `Emitter` are
//! `!Send`. Reentrant calls from slots on the same thread are the only form
//! of concurrent mutation the structure defends against; cross-thread use
//! requires external synchronization this crate does not provide.

#![warn(missing_docs)]

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use synapse_collections::{Key, List, SlabListStorage};

type SlotStorage<T> = SlabListStorage<Slot<T>>;
type SlotList<T> = List<Slot<T>, SlotStorage<T>, usize>;

/// One subscriber entry in the registry.
///
/// The callable is reference-counted so an emission can invoke it without
/// keeping the registry borrowed, and so a nested emission may re-enter the
/// slot currently executing.
struct Slot<T> {
    func: Rc<dyn Fn(&T)>,
}

/// Active-iteration marker for one in-progress emission.
///
/// `cursor` is the key of the next slot to invoke, `usize::NONE` once the
/// walk is finished. Disconnects repair every live frame so a cursor never
/// points at a removed slot.
struct Frame {
    cursor: usize,
}

struct Core<T> {
    slots: SlotStorage<T>,
    order: SlotList<T>,
    /// Stack of in-progress emissions; the last entry is the innermost.
    frames: Vec<Frame>,
    /// Set when the owning [`Signal`] is dropped. In-flight emissions abort
    /// at their next resume; connections observing this are inert.
    dead: bool,
}

impl<T> Core<T> {
    fn new() -> Self {
        Self {
            slots: SlotStorage::new(),
            order: SlotList::new(),
            frames: Vec::new(),
            dead: false,
        }
    }
}

/// Pops the emission frame on scope exit, including panic unwind out of a
/// slot, so the marker stack always matches the call stack.
struct FrameGuard<'a, T> {
    core: &'a Rc<RefCell<Core<T>>>,
}

impl<T> Drop for FrameGuard<'_, T> {
    fn drop(&mut self) {
        self.core.borrow_mut().frames.pop();
    }
}

/// Runs one emission over `core`'s current subscriber list.
///
/// The registry is never left borrowed across a slot invocation; every
/// iteration re-borrows it from scratch, which is what makes connect,
/// disconnect, nested emission and signal drop legal inside a slot.
fn emit_frames<T>(core: &Rc<RefCell<Core<T>>>, arg: &T) {
    let frame_idx = {
        let mut c = core.borrow_mut();
        if c.dead {
            return;
        }
        let head = c.order.front_key().unwrap_or(usize::NONE);
        c.frames.push(Frame { cursor: head });
        c.frames.len() - 1
    };

    let _guard = FrameGuard { core };

    loop {
        let func = {
            let mut c = core.borrow_mut();
            debug_assert_eq!(
                frame_idx + 1,
                c.frames.len(),
                "emission frames must unwind in LIFO order"
            );

            let cur = c.frames[frame_idx].cursor;
            if cur.is_none() {
                break;
            }

            // Advance past the slot before invoking it: if the slot
            // disconnects itself, the cursor is already elsewhere.
            let next = c.order.next_key(&c.slots, cur).unwrap_or(usize::NONE);
            c.frames[frame_idx].cursor = next;

            let slot = c
                .order
                .get(&c.slots, cur)
                .expect("emission cursor on a removed slot");
            Rc::clone(&slot.func)
        };

        func(arg);

        // The slot may have dropped the signal, possibly several emissions
        // deep. Stop without touching the registry further.
        if core.borrow().dead {
            break;
        }
    }
}

/// The publisher half: an ordered set of live connections plus the emission
/// machinery.
///
/// Non-copyable and non-cloneable; dropping the signal invalidates every
/// outstanding [`Connection`] (they remain safe to hold, query and drop).
pub struct Signal<T> {
    core: Rc<RefCell<Core<T>>>,
}

impl<T> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            core: Rc::new(RefCell::new(Core::new())),
        }
    }

    /// Registers `func` as a subscriber, appended after all existing ones.
    ///
    /// The returned [`Connection`] owns the subscription: the slot stays
    /// registered for as long as the handle is alive and not explicitly
    /// disconnected.
    ///
    /// Connecting from inside a slot is allowed; the new subscriber is
    /// visited by the in-progress emission iff the cursor has not yet
    /// reached the end of the list.
    pub fn connect<F>(&self, func: F) -> Connection<T>
    where
        F: Fn(&T) + 'static,
    {
        let mut c = self.core.borrow_mut();
        let c = &mut *c;
        let key = c.order.push_back(
            &mut c.slots,
            Slot {
                func: Rc::new(func),
            },
        );

        Connection {
            core: Rc::downgrade(&self.core),
            key,
        }
    }

    /// Invokes every live subscriber with `arg`, in connection order.
    ///
    /// Mutations performed by the slots take effect immediately: a
    /// disconnected not-yet-visited slot is skipped, a slot connected during
    /// the walk is visited if the cursor has not passed the tail, and a
    /// nested emission runs to completion before the outer one resumes.
    ///
    /// A panic from a slot propagates to the caller; already-invoked slots
    /// keep their effects, later slots are not invoked for this emission,
    /// and the signal remains fully usable.
    pub fn emit(&self, arg: &T) {
        emit_frames(&self.core, arg);
    }

    /// Returns a weak emission handle.
    ///
    /// An [`Emitter`] is what a slot captures to re-enter its own signal
    /// (nested emission). It is also the only way an emission can outlive
    /// the `Signal` value itself, which is what makes drop-during-emission
    /// expressible.
    pub fn emitter(&self) -> Emitter<T> {
        Emitter {
            core: Rc::downgrade(&self.core),
        }
    }

    /// Returns the number of live connections.
    pub fn connection_count(&self) -> usize {
        self.core.borrow().slots.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.core.borrow().order.is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Signal<T> {
    /// Marks every outstanding connection inert and aborts in-flight
    /// emissions at their next resume. Nothing is unlinked: frames still on
    /// the call stack may hold cursors into the list, and the registry
    /// storage stays alive until the outermost of them unwinds.
    fn drop(&mut self) {
        self.core.borrow_mut().dead = true;
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish_non_exhaustive()
    }
}

/// An owning handle for one subscription.
///
/// Created only by [`Signal::connect`]. Move-only: there is deliberately no
/// `Clone`, so exactly one handle controls each subscription. Moving the
/// handle does not touch the subscription's position in the emission order.
///
/// A connection is *inert* once it has been disconnected or its signal has
/// been dropped; an inert connection is safe to hold, query, invoke (a
/// no-op) and drop.
#[must_use = "dropping a connection immediately unsubscribes it"]
pub struct Connection<T> {
    core: Weak<RefCell<Core<T>>>,
    /// Slot key, `usize::NONE` once the handle went inert.
    key: usize,
}

impl<T> Connection<T> {
    /// Unsubscribes this connection. No-op if already inert.
    ///
    /// Every in-progress emission whose cursor currently rests on this slot
    /// is advanced past it (innermost emission first) before the slot is
    /// unlinked, so no iteration is left pointing at a removed node.
    pub fn disconnect(&mut self) {
        let key = self.key;
        self.key = usize::NONE;
        if key.is_none() {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };

        let removed = {
            let mut c = core.borrow_mut();
            if c.dead {
                return;
            }

            let next = c.order.next_key(&c.slots, key).unwrap_or(usize::NONE);
            for frame in c.frames.iter_mut().rev() {
                if frame.cursor == key {
                    frame.cursor = next;
                }
            }

            let c = &mut *c;
            c.order.remove(&mut c.slots, key)
        };

        // Drop the callable after releasing the borrow: its captures may
        // reach back into this signal when dropped.
        drop(removed);
    }

    /// Returns `true` if this connection is still subscribed to a live
    /// signal.
    pub fn is_connected(&self) -> bool {
        if self.key.is_none() {
            return false;
        }
        match self.core.upgrade() {
            Some(core) => !core.borrow().dead,
            None => false,
        }
    }

    /// Invokes the stored slot with `arg` iff the connection is live;
    /// silent no-op otherwise.
    ///
    /// This is the same liveness rule emission relies on: a connection that
    /// went inert between being captured and being called does nothing.
    pub fn invoke(&self, arg: &T) {
        if self.key.is_none() {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };

        let func = {
            let c = core.borrow();
            if c.dead {
                return;
            }
            match c.order.get(&c.slots, self.key) {
                Some(slot) => Rc::clone(&slot.func),
                None => return,
            }
        };

        func(arg);
    }
}

impl<T> Drop for Connection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// A weak, cloneable emission handle.
///
/// Emitting through a dead handle is a silent no-op. See
/// [`Signal::emitter`].
pub struct Emitter<T> {
    core: Weak<RefCell<Core<T>>>,
}

impl<T> Emitter<T> {
    /// Invokes every live subscriber with `arg`, exactly like
    /// [`Signal::emit`]. No-op if the signal has been dropped.
    ///
    /// The handle keeps the registry storage alive for the duration of the
    /// emission, so a slot that drops the `Signal` mid-walk aborts the
    /// emission instead of freeing memory out from under it.
    pub fn emit(&self, arg: &T) {
        if let Some(core) = self.core.upgrade() {
            emit_frames(&core, arg);
        }
    }

    /// Returns `true` while the signal behind this handle is alive.
    pub fn is_alive(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => !core.borrow().dead,
            None => false,
        }
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}
