use recycling_list::NodeHandle;

use crate::{Error, Result};

/// Describes one key's bucket in a [`RangeMultiMap`][crate::RangeMultiMap].
///
/// A range is an immutable `(first, terminal)` pair of node handles. The bucket consists of every
/// node from `first` up to but excluding `terminal`. The terminal node is a private sentinel of
/// the map; it holds no value and is never yielded when enumerating the range.
///
/// Ranges are plain values. A copy obtained from the map stays valid for as long as the bucket's
/// first node is not removed; removing the first value of a bucket makes the map record a new
/// range starting at the successor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Range {
    first: NodeHandle,
    terminal: NodeHandle,
}

impl Range {
    /// Creates a range from its first node and its terminal node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RangeConstruction`] if `first` and `terminal` are the same node.
    pub fn new(first: NodeHandle, terminal: NodeHandle) -> Result<Self> {
        if first == terminal {
            return Err(Error::RangeConstruction { node: first });
        }

        Ok(Self { first, terminal })
    }

    /// The first value node of the bucket.
    #[must_use]
    pub fn first(&self) -> NodeHandle {
        self.first
    }

    /// The terminal sentinel node that marks the exclusive end of the bucket.
    #[must_use]
    pub fn terminal(&self) -> NodeHandle {
        self.terminal
    }
}
