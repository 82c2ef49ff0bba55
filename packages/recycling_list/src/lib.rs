#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`RecyclingList`], a doubly-linked list whose removed nodes are cached
//! and reissued on subsequent insertions instead of being discarded.
//!
//! Workloads that repeatedly add and remove short-lived entries (per-frame events, per-key
//! registrations) can use the list without putting pressure on the allocator: once the list has
//! grown to its working size, insertions are a dequeue from the idle-node cache plus a field write.
//!
//! # Node handles
//!
//! Insertions return a [`NodeHandle`] that identifies the node for later access or removal. Each
//! time a node is linked into the list it receives a fresh generation, so a handle that outlives
//! its node is detected as stale instead of silently referring to whatever value now occupies the
//! reused node.
//!
//! # Example
//!
//! ```rust
//! use recycling_list::RecyclingList;
//!
//! let mut list = RecyclingList::new();
//!
//! let a = list.push_back("a".to_string());
//! let c = list.push_back("c".to_string());
//! list.insert_before(c, "b".to_string()).unwrap();
//!
//! assert_eq!(list.iter().collect::<Vec<_>>(), ["a", "b", "c"]);
//!
//! // Removal hands back the value and caches the node.
//! assert_eq!(list.remove(a).unwrap(), "a");
//! assert_eq!(list.idle_len(), 1);
//!
//! // The stale handle is rejected.
//! assert!(list.remove(a).is_err());
//!
//! // The cached node is reissued on the next insertion.
//! list.push_front("z".to_string());
//! assert_eq!(list.idle_len(), 0);
//! ```

mod error;
mod handle;
mod list;

pub use error::*;
pub use handle::*;
pub use list::*;
