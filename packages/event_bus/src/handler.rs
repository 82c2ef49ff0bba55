use std::fmt;
use std::sync::Arc;

use crate::{Event, EventBus, Result};

type Callback<E, S> = dyn Fn(&EventBus<E, S>, &S, &E) -> Result<()> + Send + Sync;

/// A callback that handles events dispatched by an [`EventBus`].
///
/// A handler receives the bus that dispatches the event, so it can subscribe, unsubscribe and
/// fire further events while it runs.
///
/// Handlers are compared by identity: clones of one handler are the same handler, while two
/// handlers created from identical closures are different handlers. Keep a clone of a handler to
/// unsubscribe it later.
///
/// # Example
///
/// ```rust
/// use event_bus::Handler;
/// # use event_bus::{Event, EventId};
/// # use object_pool::Poolable;
/// #
/// # #[derive(Default)]
/// # struct Tick;
/// #
/// # impl Poolable for Tick {
/// #     fn reset(&mut self) {}
/// # }
/// #
/// # impl Event for Tick {
/// #     fn id(&self) -> EventId {
/// #         0
/// #     }
/// # }
///
/// let handler = Handler::<Tick>::new(|_bus, _sender, _tick| Ok(()));
///
/// assert_eq!(handler, handler.clone());
/// assert_ne!(handler, Handler::new(|_bus, _sender, _tick| Ok(())));
/// ```
pub struct Handler<E, S = ()>
where
    E: Event,
    S: Send + 'static,
{
    callback: Arc<Callback<E, S>>,
}

impl<E, S> Handler<E, S>
where
    E: Event,
    S: Send + 'static,
{
    /// Creates a handler from a callback.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&EventBus<E, S>, &S, &E) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, bus: &EventBus<E, S>, sender: &S, payload: &E) -> Result<()> {
        (self.callback)(bus, sender, payload)
    }
}

impl<E, S> Clone for Handler<E, S>
where
    E: Event,
    S: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E, S> PartialEq for Handler<E, S>
where
    E: Event,
    S: Send + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl<E, S> Eq for Handler<E, S>
where
    E: Event,
    S: Send + 'static,
{
}

impl<E, S> fmt::Debug for Handler<E, S>
where
    E: Event,
    S: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("callback", &Arc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
