#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`ObjectPool`], a thread-safe registry that maps a type identity to a
//! queue of idle instances of that type.
//!
//! Instead of dropping short-lived heap objects and allocating new ones, callers
//! [`release()`][ObjectPool::release] instances back to the pool and later
//! [`acquire()`][ObjectPool::acquire] them again. Released instances are reset to their default
//! state via [`Poolable::reset()`] before they are cached.
//!
//! # Concurrency
//!
//! The registry lock is only taken to look up or create the entry of a type. All acquire and
//! release traffic for a type then only takes that type's own queue lock, so different types
//! never contend with each other. The usage counters reported by [`PoolStats`] are updated
//! outside of any lock and are approximate.
//!
//! # Process-wide pool
//!
//! [`ObjectPool::global()`] returns a lazily initialized process-wide pool for callers that do
//! not want to pass a pool handle around. Independent pools can be created with
//! [`ObjectPool::new()`] and shared by cloning the handle.
//!
//! # Example
//!
//! ```rust
//! use object_pool::{ObjectPool, Poolable};
//!
//! #[derive(Default)]
//! struct Buffer {
//!     bytes: Vec<u8>,
//! }
//!
//! impl Poolable for Buffer {
//!     fn reset(&mut self) {
//!         self.bytes.clear();
//!     }
//! }
//!
//! let pool = ObjectPool::new();
//!
//! let mut buffer = pool.acquire::<Buffer>().unwrap();
//! buffer.bytes.extend_from_slice(b"hello");
//! let address = &raw const *buffer;
//!
//! pool.release(buffer).unwrap();
//!
//! // The same instance comes back, already reset.
//! let buffer = pool.acquire::<Buffer>().unwrap();
//! assert_eq!(&raw const *buffer, address);
//! assert!(buffer.bytes.is_empty());
//! ```

mod entry;
mod error;
mod pool;
mod poolable;

pub(crate) use entry::PoolEntry;
pub use entry::PoolStats;
pub use error::*;
pub use pool::*;
pub use poolable::*;
