use object_pool::Poolable;

/// Identifies the kind of an event. Handlers are subscribed per identifier.
pub type EventId = i32;

/// A payload that can be dispatched through an [`EventBus`][crate::EventBus].
///
/// Payloads are pooled: after dispatch the bus returns them to its
/// [`ObjectPool`][object_pool::ObjectPool], which resets them via [`Poolable::reset()`].
///
/// # Example
///
/// ```rust
/// use event_bus::{Event, EventId};
/// use object_pool::Poolable;
///
/// #[derive(Default)]
/// struct PlayerJoined {
///     name: String,
/// }
///
/// impl PlayerJoined {
///     const ID: EventId = 1;
/// }
///
/// impl Poolable for PlayerJoined {
///     fn reset(&mut self) {
///         self.name.clear();
///     }
/// }
///
/// impl Event for PlayerJoined {
///     fn id(&self) -> EventId {
///         Self::ID
///     }
/// }
/// ```
pub trait Event: Poolable + Default {
    /// The identifier that selects the handlers of this payload.
    ///
    /// The identifier must not change while the payload is being dispatched.
    fn id(&self) -> EventId;
}
