use thiserror::Error;

/// Errors that can occur when operating on an [`ObjectPool`][crate::ObjectPool].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller referred to a type the pool cannot serve, such as a type identity for which no
    /// constructor has been registered.
    #[error("invalid argument: {problem}")]
    InvalidArgument {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The pool entry that serves the requested type identity holds instances of another type.
    #[error("pool entry holds instances of {actual} but {expected} was requested")]
    TypeMismatch {
        /// The type the caller asked for.
        expected: &'static str,

        /// The type the pool entry was created for.
        actual: &'static str,
    },

    /// Strict checking is enabled and the released instance is already in the idle queue.
    #[error("instance of {type_name} was released to the pool twice")]
    DoubleRelease {
        /// The type of the instance that was released twice.
        type_name: &'static str,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's [`Error`] type as the
/// error value.
pub type Result<T> = std::result::Result<T, Error>;
