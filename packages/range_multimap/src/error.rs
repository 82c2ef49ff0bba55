use recycling_list::NodeHandle;
use thiserror::Error;

/// Errors that can occur when operating on a [`RangeMultiMap`][crate::RangeMultiMap] or
/// constructing a [`Range`][crate::Range].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A range was constructed with the same node as both its first and terminal node.
    ///
    /// A bucket always contains its terminal node plus at least one value node, so such a range
    /// cannot describe a bucket.
    #[error("range endpoints must be distinct nodes but both are {node}")]
    RangeConstruction {
        /// The node that was given as both endpoints.
        node: NodeHandle,
    },

    /// An operation on the backing list failed.
    #[error(transparent)]
    List(#[from] recycling_list::Error),
}

/// A specialized `Result` type for multi-map operations, returning the crate's [`Error`] type as
/// the error value.
pub type Result<T> = std::result::Result<T, Error>;
