use thiserror::Error;

use crate::NodeHandle;

/// Errors that can occur when operating on a [`RecyclingList`][crate::RecyclingList].
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The handle does not refer to a node that is currently linked into the list.
    ///
    /// This happens when the node was removed (and possibly reissued to a new value) after the
    /// handle was obtained, or when the handle was obtained from a different list.
    #[error("node handle {handle} does not refer to a linked node")]
    StaleHandle {
        /// The handle that was rejected.
        handle: NodeHandle,
    },
}

/// A specialized `Result` type for list operations, returning the crate's [`Error`] type as the
/// error value.
pub type Result<T> = std::result::Result<T, Error>;
