use std::collections::VecDeque;
use std::sync::Arc;
use std::{fmt, mem};

use object_pool::ObjectPool;
use parking_lot::Mutex;
use tracing::trace;

use crate::envelope::Envelope;
use crate::{Event, Result};

type EnvelopeQueue<E, S> = Mutex<VecDeque<Box<Envelope<E, S>>>>;

/// A handle that fires deferred events into the queue of an [`EventBus`][crate::EventBus].
///
/// The bus itself must stay on its dispatch thread. Producers are the way to fire events from
/// other threads: they are cheap to clone and can be sent to and shared between threads. Events
/// fired through any producer of a bus are dispatched by the next
/// [`EventBus::update()`][crate::EventBus::update] call on the dispatch thread, in the order in
/// which they were enqueued.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use event_bus::{EventBus, EventBusMode};
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
/// let bus = EventBus::<Tick>::new(EventBusMode::ALLOW_NO_HANDLER);
/// let producer = bus.producer();
///
/// thread::spawn(move || {
///     let tick = producer.pool().acquire::<Tick>().unwrap();
///     producer.fire((), tick).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(bus.event_count(), 1);
/// bus.update().unwrap();
/// assert_eq!(bus.event_count(), 0);
/// ```
pub struct EventProducer<E, S = ()>
where
    E: Event,
    S: Send + 'static,
{
    queue: Arc<EnvelopeQueue<E, S>>,
    pool: ObjectPool,
}

impl<E, S> EventProducer<E, S>
where
    E: Event,
    S: Send + 'static,
{
    pub(crate) fn new(pool: ObjectPool) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            pool,
        }
    }

    /// Wraps the event in a pooled envelope and enqueues it for dispatch by the next
    /// [`EventBus::update()`][crate::EventBus::update] call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pool`][crate::Error::Pool] if an envelope cannot be acquired from the
    /// pool.
    pub fn fire(&self, sender: S, payload: Box<E>) -> Result<()> {
        let id = payload.id();

        let mut envelope = self.pool.acquire::<Envelope<E, S>>()?;
        envelope.fill(sender, payload);

        self.queue.lock().push_back(envelope);

        trace!(event_id = id, "queued event");
        Ok(())
    }

    /// The pool that payloads and envelopes are recycled through.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub(crate) fn pop(&self) -> Option<Box<Envelope<E, S>>> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn take_all(&self) -> VecDeque<Box<Envelope<E, S>>> {
        mem::take(&mut *self.queue.lock())
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.lock().len()
    }
}

impl<E, S> Clone for EventProducer<E, S>
where
    E: Event,
    S: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            pool: self.pool.clone(),
        }
    }
}

impl<E, S> fmt::Debug for EventProducer<E, S>
where
    E: Event,
    S: Send + 'static,
{
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProducer")
            .field("queued", &self.queued())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
