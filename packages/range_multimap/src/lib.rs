#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`RangeMultiMap`], a multi-valued map in which the values of each key
//! are stored as a contiguous run of nodes (a bucket) in one shared
//! [`RecyclingList`][recycling_list::RecyclingList].
//!
//! Each bucket is described by a [`Range`]: the handle of its first value node and the handle of
//! a private terminal node that marks the exclusive end of the bucket. New values for an existing
//! key are inserted immediately before the terminal, which keeps the bucket contiguous and leaves
//! the range unchanged for anyone holding a copy of it.
//!
//! Because the backing list recycles its nodes, workloads that repeatedly register and
//! unregister short-lived values do not put pressure on the allocator.
//!
//! # Example
//!
//! ```rust
//! use range_multimap::RangeMultiMap;
//!
//! let mut map = RangeMultiMap::new();
//!
//! map.add("fruit", "apple");
//! map.add("veg", "leek");
//! map.add("fruit", "pear");
//!
//! let fruit = map.get(&"fruit").unwrap();
//! assert_eq!(map.values(fruit).copied().collect::<Vec<_>>(), ["apple", "pear"]);
//!
//! assert!(map.remove(&"fruit", &"apple"));
//! assert_eq!(map.count(&"fruit"), 1);
//! ```

mod error;
mod map;
mod range;

pub use error::*;
pub use map::*;
pub use range::*;
pub use recycling_list::NodeHandle;
