use std::cell::{Cell, RefCell};
use std::fmt;

use foldhash::{HashMap, HashMapExt};
use object_pool::ObjectPool;
use range_multimap::{NodeHandle, RangeMultiMap};
use tracing::{debug, trace, warn};

use crate::envelope::Envelope;
use crate::{Error, Event, EventBusBuilder, EventBusMode, EventId, EventProducer, Handler, Result};

/// Identifies one in-flight walk over a handler bucket.
type DispatchId = u64;

/// The position of one in-flight walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Cursor {
    id: EventId,

    /// The next node the walk will visit, or `None` once the walk is done.
    next: Option<NodeHandle>,
}

/// A pub/sub event bus that dispatches pooled payloads to the handlers subscribed to their
/// [`EventId`].
///
/// # Delivery
///
/// Events can be delivered in two ways:
///
/// * [`fire()`][Self::fire] (or [`EventProducer::fire()`]) enqueues the event. Queued events are
///   dispatched in FIFO order by the next [`update()`][Self::update] call.
/// * [`fire_now()`][Self::fire_now] dispatches the event synchronously on the calling thread.
///
/// Handlers of an event run in the order in which they were subscribed. After dispatch the
/// payload and its envelope are returned to the bus's [`ObjectPool`], so callers should acquire
/// payloads from [`pool()`][Self::pool] before firing them.
///
/// # Reentrancy
///
/// Handlers receive a reference to the bus and may subscribe, unsubscribe and fire events while
/// they run. A handler that unsubscribes itself or any other handler of the event being
/// dispatched does not disturb the dispatch: every handler still subscribed when the walk reaches
/// it is invoked exactly once and removed handlers are never invoked after removal.
///
/// # Thread safety
///
/// The bus is thread-mobile ([`Send`]) but not thread-safe (not [`Sync`]). The thread that owns
/// the bus is its dispatch thread; it performs all subscription changes and all dispatch. Other
/// threads fire events through an [`EventProducer`] obtained from [`producer()`][Self::producer].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use event_bus::{Event, EventBus, EventBusMode, EventId, Handler};
/// use object_pool::Poolable;
///
/// #[derive(Default)]
/// struct Damage {
///     amount: u32,
/// }
///
/// impl Poolable for Damage {
///     fn reset(&mut self) {
///         self.amount = 0;
///     }
/// }
///
/// impl Event for Damage {
///     fn id(&self) -> EventId {
///         7
///     }
/// }
///
/// let bus = EventBus::<Damage, &'static str>::new(EventBusMode::DEFAULT);
///
/// let total = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&total);
/// let handler = Handler::new(move |_bus, _sender, damage: &Damage| {
///     counter.fetch_add(damage.amount, Ordering::Relaxed);
///     Ok(())
/// });
///
/// bus.subscribe(7, handler.clone()).unwrap();
///
/// let mut damage = bus.pool().acquire::<Damage>().unwrap();
/// damage.amount = 12;
/// bus.fire("trap", damage).unwrap();
///
/// // Deferred events wait for the next update.
/// assert_eq!(total.load(Ordering::Relaxed), 0);
/// bus.update().unwrap();
/// assert_eq!(total.load(Ordering::Relaxed), 12);
///
/// bus.unsubscribe(7, &handler).unwrap();
/// assert_eq!(bus.count(7), 0);
/// ```
pub struct EventBus<E, S = ()>
where
    E: Event,
    S: Send + 'static,
{
    mode: EventBusMode,

    producer: EventProducer<E, S>,

    handlers: RefCell<RangeMultiMap<EventId, Handler<E, S>>>,
    default_handler: RefCell<Option<Handler<E, S>>>,

    /// For every walk in progress, the next node the walk will visit.
    ///
    /// Unsubscribing a handler moves every cursor of the same event that points at a node
    /// holding that handler past it, before the node is unlinked.
    cursors: RefCell<HashMap<DispatchId, Cursor>>,
    next_dispatch_id: Cell<DispatchId>,

    /// How many events were fired through this bus, as opposed to through a producer.
    fired: Cell<usize>,
}

impl<E, S> EventBus<E, S>
where
    E: Event,
    S: Send + 'static,
{
    /// Creates a bus with the given mode that recycles payloads and envelopes through the
    /// process-wide [`ObjectPool::global()`].
    #[must_use]
    pub fn new(mode: EventBusMode) -> Self {
        Self::builder().mode(mode).build()
    }

    /// Creates a builder that can customize the bus before it is created.
    pub fn builder() -> EventBusBuilder<E, S> {
        EventBusBuilder::new()
    }

    pub(crate) fn new_inner(mode: EventBusMode, pool: ObjectPool) -> Self {
        Self {
            mode,
            producer: EventProducer::new(pool),
            handlers: RefCell::new(RangeMultiMap::new()),
            default_handler: RefCell::new(None),
            cursors: RefCell::new(HashMap::new()),
            next_dispatch_id: Cell::new(0),
            fired: Cell::new(0),
        }
    }

    /// The mode that governs which handler configurations the bus accepts.
    #[must_use]
    pub fn mode(&self) -> EventBusMode {
        self.mode
    }

    /// The pool that payloads and envelopes are recycled through.
    #[must_use]
    pub fn pool(&self) -> &ObjectPool {
        self.producer.pool()
    }

    /// Returns a handle that can fire deferred events into this bus from any thread.
    #[must_use]
    pub fn producer(&self) -> EventProducer<E, S> {
        self.producer.clone()
    }

    /// The number of event identifiers that have at least one handler.
    #[must_use]
    pub fn event_handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// The number of fired events waiting for the next [`update()`][Self::update].
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.producer.queued()
    }

    /// The number of handlers subscribed to the event.
    #[must_use]
    pub fn count(&self, id: EventId) -> usize {
        self.handlers.borrow().count(&id)
    }

    /// Returns whether the handler is subscribed to the event.
    #[must_use]
    pub fn contains(&self, id: EventId, handler: &Handler<E, S>) -> bool {
        self.handlers.borrow().contains(&id, handler)
    }

    /// Subscribes a handler to an event. Handlers of an event are invoked in subscription order.
    ///
    /// The first handler of an event is always accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MultiHandlerNotAllowed`] if the event already has a handler and the bus
    /// does not allow multiple handlers.
    ///
    /// Returns [`Error::DuplicateHandlerNotAllowed`] if the handler is already subscribed to the
    /// event and the bus does not allow duplicate handlers.
    pub fn subscribe(&self, id: EventId, handler: Handler<E, S>) -> Result<()> {
        let mut handlers = self.handlers.borrow_mut();

        if handlers.contains_key(&id) {
            if !self.mode.contains(EventBusMode::ALLOW_MULTI_HANDLER) {
                return Err(Error::MultiHandlerNotAllowed { id });
            }

            if !self.mode.contains(EventBusMode::ALLOW_DUPLICATE_HANDLER)
                && handlers.contains(&id, &handler)
            {
                return Err(Error::DuplicateHandlerNotAllowed { id });
            }
        }

        handlers.add(id, handler);

        debug!(event_id = id, "subscribed handler");
        Ok(())
    }

    /// Unsubscribes a handler from an event.
    ///
    /// If the handler is subscribed more than once, its earliest subscription is removed.
    ///
    /// This may be called by a handler while an event is being dispatched, including by the
    /// handler that is being unsubscribed. Walks of the event that are in progress do not
    /// invoke the handler again, even through another subscription of it that remains.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandlerNotFound`] if the handler is not subscribed to the event.
    pub fn unsubscribe(&self, id: EventId, handler: &Handler<E, S>) -> Result<()> {
        let mut handlers = self.handlers.borrow_mut();

        let Some(range) = handlers
            .get(&id)
            .filter(|_| handlers.contains(&id, handler))
        else {
            return Err(Error::HandlerNotFound { id });
        };

        for cursor in self
            .cursors
            .borrow_mut()
            .values_mut()
            .filter(|cursor| cursor.id == id)
        {
            while let Some(next) = cursor.next {
                if handlers.value(next) != Some(handler) {
                    break;
                }

                cursor.next = handlers
                    .successor(range, next)
                    .expect("a node that holds a value is linked");
            }
        }

        let removed = handlers.remove(&id, handler);
        debug_assert!(removed, "the handler was found a moment ago");

        debug!(event_id = id, "unsubscribed handler");
        Ok(())
    }

    /// Sets the handler that is invoked for events that have no handlers of their own,
    /// replacing any previous default handler.
    pub fn set_default_handler(&self, handler: Handler<E, S>) {
        *self.default_handler.borrow_mut() = Some(handler);
    }

    /// Removes the default handler, if one is set.
    pub fn clear_default_handler(&self) {
        drop(self.default_handler.take());
    }

    /// Enqueues an event for dispatch by the next [`update()`][Self::update] call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pool`] if an envelope cannot be acquired from the pool.
    pub fn fire(&self, sender: S, payload: Box<E>) -> Result<()> {
        self.producer.fire(sender, payload)?;
        self.fired.set(self.fired.get().wrapping_add(1));

        Ok(())
    }

    /// Dispatches an event immediately on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHandler`] if nothing handles the event and the bus does not allow
    /// that. Returns [`Error::Handler`] or any other error raised by a handler, in which case
    /// the remaining handlers of the event are not invoked.
    pub fn fire_now(&self, sender: S, payload: Box<E>) -> Result<()> {
        let mut envelope = self.pool().acquire::<Envelope<E, S>>()?;
        envelope.fill(sender, payload);

        self.dispatch(envelope)
    }

    /// Dispatches queued events in FIFO order.
    ///
    /// The update dispatches as many events as were queued when it started, plus one more for
    /// every event that a handler fires through [`fire()`][Self::fire] during the update. Events
    /// that other threads keep firing while the update runs are therefore left for the next
    /// update and a busy producer cannot keep one update running indefinitely.
    ///
    /// # Errors
    ///
    /// Stops at the first event whose dispatch fails and returns its error. Events queued behind
    /// it stay queued for the next update.
    pub fn update(&self) -> Result<()> {
        let mut budget = self.producer.queued();

        while budget > 0 {
            let Some(envelope) = self.producer.pop() else {
                break;
            };

            budget -= 1;

            let fired_before = self.fired.get();
            let dispatched = self.dispatch(envelope);
            budget += self.fired.get().wrapping_sub(fired_before);

            dispatched?;
        }

        Ok(())
    }

    /// Invokes the handlers of an event and then returns the payload to the pool.
    ///
    /// If the event has no handlers, the default handler is invoked instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHandler`] if there is neither a handler nor a default handler and the
    /// bus does not allow events without handlers. Returns the first error raised by a handler,
    /// in which case the remaining handlers are not invoked. In every case the payload has been
    /// returned to the pool before this returns.
    pub fn handle_event(&self, sender: &S, payload: Box<E>) -> Result<()> {
        let id = payload.id();
        let has_handlers = self.handlers.borrow().contains_key(&id);

        let handled = if has_handlers {
            trace!(event_id = id, "dispatching event");
            self.walk(id, sender, &payload)
        } else {
            let default_handler = self.default_handler.borrow().clone();

            match default_handler {
                Some(handler) => {
                    trace!(event_id = id, "dispatching event to default handler");
                    handler.invoke(self, sender, &payload)
                }
                None if self.mode.contains(EventBusMode::ALLOW_NO_HANDLER) => Ok(()),
                None => {
                    debug!(event_id = id, "event has no handler");
                    Err(Error::NoHandler { id })
                }
            }
        };

        if let Err(Error::Handler(source)) = &handled {
            debug!(event_id = id, error = %source, "event handler failed");
        }

        let released = self.pool().release(payload).map_err(Error::from);
        handled.and(released)
    }

    /// Drops every queued event without dispatching it. Subscriptions are not affected.
    ///
    /// The payloads and envelopes of the dropped events are returned to the pool.
    pub fn clear(&self) {
        let pending = self.producer.take_all();
        let count = pending.len();

        for envelope in pending {
            self.recycle(envelope);
        }

        debug!(count, "cleared queued events");
    }

    /// Drops every queued event, every subscription and the default handler.
    ///
    /// The bus remains usable afterwards. Walks that are in progress when this is called by a
    /// handler stop after the current handler returns.
    pub fn shutdown(&self) {
        self.clear();

        self.handlers.borrow_mut().clear();
        drop(self.default_handler.take());
        self.cursors.borrow_mut().clear();

        debug!("event bus shut down");
    }

    fn dispatch(&self, mut envelope: Box<Envelope<E, S>>) -> Result<()> {
        let payload = envelope
            .take_payload()
            .expect("fired envelopes always carry a payload");
        let sender = envelope
            .sender()
            .expect("fired envelopes always carry a sender");

        let handled = self.handle_event(sender, payload);

        let released = self.pool().release(envelope).map_err(Error::from);
        handled.and(released)
    }

    /// Invokes the handlers in the event's bucket front to back.
    fn walk(&self, id: EventId, sender: &S, payload: &E) -> Result<()> {
        let dispatch_id = self.next_dispatch_id.get();
        self.next_dispatch_id.set(dispatch_id.wrapping_add(1));

        let first = self.handlers.borrow().get(&id).map(|range| range.first());
        self.cursors
            .borrow_mut()
            .insert(dispatch_id, Cursor { id, next: first });

        // The cursor must not outlive the walk, even if a handler panics.
        let _cursor = scopeguard::guard((), move |()| {
            self.cursors.borrow_mut().remove(&dispatch_id);
        });

        while let Some(node) = self.cursor(dispatch_id) {
            let Some((handler, next)) = self.handler_at(id, node) else {
                break;
            };

            self.cursors
                .borrow_mut()
                .insert(dispatch_id, Cursor { id, next });

            handler.invoke(self, sender, payload)?;
        }

        Ok(())
    }

    fn cursor(&self, dispatch_id: DispatchId) -> Option<NodeHandle> {
        self.cursors
            .borrow()
            .get(&dispatch_id)
            .and_then(|cursor| cursor.next)
    }

    /// Returns the handler held by `node` and the node that follows it in the event's bucket.
    fn handler_at(
        &self,
        id: EventId,
        node: NodeHandle,
    ) -> Option<(Handler<E, S>, Option<NodeHandle>)> {
        let handlers = self.handlers.borrow();

        let range = handlers.get(&id)?;
        let handler = handlers.value(node)?.clone();
        let next = handlers
            .successor(range, node)
            .expect("a node that holds a value is linked");

        Some((handler, next))
    }

    fn recycle(&self, mut envelope: Box<Envelope<E, S>>) {
        if let Some(payload) = envelope.take_payload() {
            if let Err(error) = self.pool().release(payload) {
                warn!(%error, "failed to recycle payload of cleared event");
            }
        }

        if let Err(error) = self.pool().release(envelope) {
            warn!(%error, "failed to recycle envelope of cleared event");
        }
    }
}

impl<E, S> fmt::Debug for EventBus<E, S>
where
    E: Event,
    S: Send + 'static,
{
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("mode", &self.mode)
            .field("event_handler_count", &self.event_handler_count())
            .field("event_count", &self.event_count())
            .field("has_default_handler", &self.default_handler.borrow().is_some())
            .finish_non_exhaustive()
    }
}
