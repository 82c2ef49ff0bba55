use std::fmt;
use std::marker::PhantomData;

use object_pool::ObjectPool;

use crate::{Event, EventBus, EventBusMode};

/// Builder for creating an instance of [`EventBus`].
///
/// All settings are optional. By default the bus uses [`EventBusMode::DEFAULT`] and the
/// process-wide [`ObjectPool::global()`].
///
/// # Example
///
/// ```rust
/// use event_bus::{EventBus, EventBusMode};
/// use object_pool::ObjectPool;
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
/// let bus = EventBus::<Tick>::builder()
///     .mode(EventBusMode::ALLOW_MULTI_HANDLER)
///     .pool(ObjectPool::new())
///     .build();
///
/// assert_eq!(bus.mode(), EventBusMode::ALLOW_MULTI_HANDLER);
/// ```
#[must_use]
pub struct EventBusBuilder<E, S = ()> {
    mode: EventBusMode,
    pool: Option<ObjectPool>,

    _types: PhantomData<fn() -> (E, S)>,
}

impl<E, S> EventBusBuilder<E, S>
where
    E: Event,
    S: Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            mode: EventBusMode::DEFAULT,
            pool: None,
            _types: PhantomData,
        }
    }

    /// Sets the [mode][EventBusMode] that governs which handler configurations the bus accepts.
    pub fn mode(mut self, mode: EventBusMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the pool that payloads and envelopes are recycled through.
    ///
    /// Payloads acquired by the caller for firing should come from the same pool.
    pub fn pool(mut self, pool: ObjectPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Builds the event bus with the specified configuration.
    #[must_use]
    pub fn build(self) -> EventBus<E, S> {
        let pool = self
            .pool
            .unwrap_or_else(|| ObjectPool::global().clone());

        EventBus::new_inner(self.mode, pool)
    }
}

impl<E, S> fmt::Debug for EventBusBuilder<E, S> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusBuilder")
            .field("mode", &self.mode)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use object_pool::Poolable;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::EventId;

    #[derive(Default)]
    struct Tick;

    impl Poolable for Tick {
        fn reset(&mut self) {}
    }

    impl Event for Tick {
        fn id(&self) -> EventId {
            0
        }
    }

    assert_impl_all!(EventBusBuilder<Tick>: Send, Sync);

    #[test]
    fn defaults() {
        let builder = EventBusBuilder::<Tick>::new();

        assert_eq!(builder.mode, EventBusMode::DEFAULT);
        assert!(builder.pool.is_none());
    }

    #[test]
    fn settings_reach_bus() {
        let pool = ObjectPool::new();

        let bus = EventBusBuilder::<Tick>::new()
            .mode(EventBusMode::ALLOW_NO_HANDLER)
            .pool(pool.clone())
            .build();

        assert_eq!(bus.mode(), EventBusMode::ALLOW_NO_HANDLER);

        bus.fire((), Box::new(Tick)).unwrap();
        assert!(pool.stats::<crate::envelope::Envelope<Tick, ()>>().is_some());
    }
}
