#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`EventBus`], a pub/sub event bus that delivers pooled payloads to the
//! handlers subscribed to their [`EventId`].
//!
//! Handlers of each event are stored as a contiguous bucket in a
//! [`RangeMultiMap`][range_multimap::RangeMultiMap], so subscribing and unsubscribing does not
//! allocate once the map has warmed up. Payloads and the envelopes that carry them through the
//! deferred queue are recycled through an [`ObjectPool`][object_pool::ObjectPool].
//!
//! # Delivery
//!
//! * [`EventBus::fire()`] and [`EventProducer::fire()`] enqueue an event. This is the only way to
//!   deliver events from threads other than the dispatch thread.
//! * [`EventBus::update()`] dispatches the queued events in FIFO order. Call it once per tick on
//!   the dispatch thread. Events that other threads fire while it runs wait for the next tick.
//! * [`EventBus::fire_now()`] dispatches an event synchronously on the calling thread.
//!
//! # Modes
//!
//! An [`EventBusMode`] selected at construction time decides whether an event may have more
//! than one handler, whether the same handler may be subscribed twice and whether dispatching
//! an event that nothing handles is an error.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use event_bus::{Event, EventBus, EventBusMode, EventId, Handler};
//! use object_pool::{ObjectPool, Poolable};
//!
//! #[derive(Default)]
//! struct ItemPicked {
//!     item: String,
//! }
//!
//! impl ItemPicked {
//!     const ID: EventId = 10;
//! }
//!
//! impl Poolable for ItemPicked {
//!     fn reset(&mut self) {
//!         self.item.clear();
//!     }
//! }
//!
//! impl Event for ItemPicked {
//!     fn id(&self) -> EventId {
//!         Self::ID
//!     }
//! }
//!
//! let bus = EventBus::<ItemPicked, u32>::builder()
//!     .mode(EventBusMode::ALLOW_MULTI_HANDLER)
//!     .pool(ObjectPool::new())
//!     .build();
//!
//! let picked = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&picked);
//! bus.subscribe(
//!     ItemPicked::ID,
//!     Handler::new(move |_bus, _player, _event: &ItemPicked| {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }),
//! )
//! .unwrap();
//!
//! bus.subscribe(
//!     ItemPicked::ID,
//!     Handler::new(|_bus, player: &u32, event: &ItemPicked| {
//!         assert_eq!(*player, 1);
//!         assert_eq!(event.item, "sword");
//!         Ok(())
//!     }),
//! )
//! .unwrap();
//!
//! let mut event = bus.pool().acquire::<ItemPicked>().unwrap();
//! event.item.push_str("sword");
//! bus.fire(1, event).unwrap();
//!
//! bus.update().unwrap();
//! assert_eq!(picked.load(Ordering::Relaxed), 1);
//! ```

mod builder;
mod bus;
mod envelope;
mod error;
mod event;
mod handler;
mod mode;
mod producer;

pub use builder::*;
pub use bus::*;
pub use error::*;
pub use event::*;
pub use handler::*;
pub use mode::*;
pub use producer::*;
