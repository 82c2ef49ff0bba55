use std::error::Error as StdError;

use thiserror::Error;

use crate::EventId;

/// A type-erased error raised by an event handler.
pub type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur when operating on an [`EventBus`][crate::EventBus].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A second handler was subscribed to an event that already has one, but the bus does not
    /// allow multiple handlers per event.
    #[error("event {id} does not allow multiple handlers")]
    MultiHandlerNotAllowed {
        /// The event the handler was subscribed to.
        id: EventId,
    },

    /// A handler was subscribed to an event it is already subscribed to, but the bus does not
    /// allow duplicate handlers.
    #[error("event {id} does not allow duplicate handlers")]
    DuplicateHandlerNotAllowed {
        /// The event the handler was subscribed to.
        id: EventId,
    },

    /// The handler to unsubscribe is not subscribed to the event.
    #[error("event {id} has no such handler")]
    HandlerNotFound {
        /// The event the handler was unsubscribed from.
        id: EventId,
    },

    /// An event was dispatched but it has no handler, there is no default handler and the bus
    /// does not allow events without handlers.
    ///
    /// The payload has already been returned to the pool when this error is raised.
    #[error("event {id} has no handler")]
    NoHandler {
        /// The event that was dispatched.
        id: EventId,
    },

    /// An event handler failed.
    ///
    /// Dispatch of the event stops at the failing handler. The payload and its envelope have
    /// already been returned to the pool when this error is raised.
    #[error("event handler failed")]
    Handler(#[source] BoxedError),

    /// The object pool that backs payloads and envelopes rejected an operation.
    #[error(transparent)]
    Pool(#[from] object_pool::Error),
}

impl Error {
    /// Wraps an error raised by an event handler.
    ///
    /// # Example
    ///
    /// ```rust
    /// use event_bus::Error;
    ///
    /// let error = Error::handler("inventory is full");
    /// assert_eq!(error.to_string(), "event handler failed");
    /// ```
    pub fn handler(error: impl Into<BoxedError>) -> Self {
        Self::Handler(error.into())
    }
}

/// A specialized `Result` type for event bus operations, returning the crate's [`Error`] type as
/// the error value.
pub type Result<T> = std::result::Result<T, Error>;
