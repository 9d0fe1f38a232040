//! Linked collections over external storage.
//!
//! This crate separates storage from structure: a slab-like [`Storage`] owns
//! the elements and hands out stable keys, while a [`List`] coordinates keys
//! without owning any data. The embedded prev/next links make subscribe-style
//! workloads cheap:
//!
//! - **O(1) link/unlink** from anywhere, given only a node's key
//! - **No per-node allocation** beyond the storage slot itself
//! - **Stable keys**: removing one node never invalidates another's key
//! - **Shared storage**: several lists can coordinate nodes in one pool
//! - **O(1) splicing**: relink whole node ranges without touching elements
//!
//! # Quick Start
//!
//! ```
//! use synapse_collections::{List, SlabListStorage};
//!
//! // Storage owns the data (wrapped in ListNode internally)
//! let mut storage: SlabListStorage<u64> = SlabListStorage::new();
//!
//! // The list coordinates keys into storage
//! let mut queue: List<u64, SlabListStorage<u64>> = List::new();
//!
//! let key = queue.push_back(&mut storage, 42);
//!
//! // O(1) removal from anywhere
//! assert_eq!(queue.remove(&mut storage, key), Some(42));
//! ```
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a list must use the storage instance its nodes live in.
//! This is the caller's responsibility (same discipline as the `slab`
//! crate); the list has no way to detect a mismatch.

#![warn(missing_docs)]

pub mod key;
pub mod list;
pub mod storage;

pub use key::Key;
pub use list::{Cursor, Iter, Keys, List, ListNode, SlabListStorage};
pub use storage::{Storage, UnboundedStorage};
