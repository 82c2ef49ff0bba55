use std::any::TypeId;
use std::collections::VecDeque;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::{fmt, mem, ptr};

use parking_lot::Mutex;
use tracing::warn;

use crate::{Error, Factory, Poolable, Result};

/// The idle-instance queue and usage counters of one concrete type.
///
/// The queue has its own lock. The counters are updated outside of that lock with relaxed
/// ordering, so concurrent acquire/release traffic can make them drift slightly. They are only
/// ever reported, never used to make decisions.
pub(crate) struct PoolEntry {
    type_id: TypeId,
    type_name: &'static str,

    /// Set by the first typed acquire or by explicit registration. Required to create instances
    /// when the type is only known by its identity.
    factory: OnceLock<Factory>,

    idle: Mutex<VecDeque<Box<dyn Poolable>>>,

    using: AtomicIsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    added: AtomicUsize,
    removed: AtomicUsize,
}

impl PoolEntry {
    #[must_use]
    pub(crate) fn new(type_id: TypeId, type_name: &'static str) -> Self {
        Self {
            type_id,
            type_name,
            factory: OnceLock::new(),
            idle: Mutex::new(VecDeque::new()),
            using: AtomicIsize::new(0),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            added: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fails with [`Error::TypeMismatch`] if this entry was created for a type other than the
    /// one identified by `type_id`.
    pub(crate) fn ensure_type(&self, type_id: TypeId, type_name: &'static str) -> Result<()> {
        if self.type_id != type_id {
            return Err(Error::TypeMismatch {
                expected: type_name,
                actual: self.type_name,
            });
        }

        Ok(())
    }

    pub(crate) fn register_factory(&self, factory: Factory) {
        _ = self.factory.get_or_init(|| factory);
    }

    #[must_use]
    pub(crate) fn factory(&self) -> Option<Factory> {
        self.factory.get().copied()
    }

    /// Takes an idle instance, or creates a new one with `factory` if the queue is empty.
    pub(crate) fn acquire(&self, factory: Factory) -> Box<dyn Poolable> {
        self.using.fetch_add(1, Ordering::Relaxed);
        self.acquired.fetch_add(1, Ordering::Relaxed);

        if let Some(instance) = self.idle.lock().pop_front() {
            return instance;
        }

        self.added.fetch_add(1, Ordering::Relaxed);
        factory()
    }

    /// Resets the instance and puts it into the idle queue.
    ///
    /// With `strict_check`, the queue is first scanned for the same instance. Zero-sized types
    /// are exempt because every box of such a type has the same address.
    pub(crate) fn release(&self, mut instance: Box<dyn Poolable>, strict_check: bool) -> Result<()> {
        instance.reset();

        {
            let mut idle = self.idle.lock();

            if strict_check
                && size_of_val(&*instance) != 0
                && idle
                    .iter()
                    .any(|cached| ptr::addr_eq(&raw const **cached, &raw const *instance))
            {
                warn!(type_name = self.type_name, "instance released twice");

                // This box aliases one that the queue owns. Dropping it would free the
                // allocation a second time.
                mem::forget(instance);

                return Err(Error::DoubleRelease {
                    type_name: self.type_name,
                });
            }

            idle.push_back(instance);
        }

        self.released.fetch_add(1, Ordering::Relaxed);
        self.using.fetch_sub(1, Ordering::Relaxed);

        Ok(())
    }

    /// Creates `count` new instances with `factory` and puts them into the idle queue.
    pub(crate) fn add(&self, count: usize, factory: Factory) {
        let mut idle = self.idle.lock();

        self.added.fetch_add(count, Ordering::Relaxed);
        idle.extend((0..count).map(|_| factory()));
    }

    /// Drops up to `count` idle instances. Returns how many were dropped.
    pub(crate) fn remove(&self, count: usize) -> usize {
        let drained: Vec<_> = {
            let mut idle = self.idle.lock();
            let count = count.min(idle.len());

            idle.drain(..count).collect()
        };

        self.removed.fetch_add(drained.len(), Ordering::Relaxed);
        drained.len()
    }

    /// Drops every idle instance. Returns how many were dropped.
    pub(crate) fn remove_all(&self) -> usize {
        let drained = mem::take(&mut *self.idle.lock());

        self.removed.fetch_add(drained.len(), Ordering::Relaxed);
        drained.len()
    }

    #[must_use]
    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            type_name: self.type_name,
            idle: self.idle.lock().len(),
            using: self.using.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for PoolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEntry")
            .field("type_name", &self.type_name)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// A snapshot of the usage counters of one type in an [`ObjectPool`][crate::ObjectPool].
///
/// The counters are maintained without synchronization between them and are meant for
/// diagnostics only.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolStats {
    type_name: &'static str,
    idle: usize,
    using: isize,
    acquired: usize,
    released: usize,
    added: usize,
    removed: usize,
}

impl PoolStats {
    /// The name of the pooled type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of instances waiting in the idle queue.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Number of instances acquired and not yet released.
    ///
    /// Releasing instances that were not obtained from the pool can make this negative.
    #[must_use]
    pub fn using(&self) -> isize {
        self.using
    }

    /// Total number of acquisitions.
    #[must_use]
    pub fn acquired(&self) -> usize {
        self.acquired
    }

    /// Total number of releases.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released
    }

    /// Total number of instances created by the pool, on demand or by pre-warming.
    #[must_use]
    pub fn added(&self) -> usize {
        self.added
    }

    /// Total number of idle instances dropped by the pool.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::any::type_name;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::construct;

    assert_impl_all!(PoolEntry: Send, Sync);

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    impl Poolable for Counter {
        fn reset(&mut self) {
            self.value = 0;
        }
    }

    fn counter_entry() -> PoolEntry {
        PoolEntry::new(TypeId::of::<Counter>(), type_name::<Counter>())
    }

    #[test]
    fn acquire_creates_when_idle_queue_is_empty() {
        let entry = counter_entry();

        let instance = entry.acquire(construct::<Counter>);
        drop(instance);

        let stats = entry.stats();
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.added(), 1);
        assert_eq!(stats.using(), 1);
        assert_eq!(stats.idle(), 0);
    }

    #[test]
    fn release_then_acquire_reuses_instance() {
        let entry = counter_entry();

        let instance = entry.acquire(construct::<Counter>);
        let address = (&raw const *instance).cast::<()>();
        entry.release(instance, false).unwrap();

        let again = entry.acquire(construct::<Counter>);
        assert_eq!((&raw const *again).cast::<()>(), address);

        let stats = entry.stats();
        assert_eq!(stats.acquired(), 2);
        assert_eq!(stats.released(), 1);
        assert_eq!(stats.added(), 1);
        assert_eq!(stats.using(), 1);
    }

    #[test]
    fn release_resets_instance() {
        let entry = counter_entry();

        entry
            .release(Box::new(Counter { value: 42 }), false)
            .unwrap();

        let any: Box<dyn std::any::Any> = entry.acquire(construct::<Counter>);
        let counter = any.downcast::<Counter>().unwrap();
        assert_eq!(counter.value, 0);
    }

    #[test]
    fn remove_clamps_to_idle_count() {
        let entry = counter_entry();

        entry.add(3, construct::<Counter>);
        assert_eq!(entry.stats().idle(), 3);

        assert_eq!(entry.remove(10), 3);

        let stats = entry.stats();
        assert_eq!(stats.idle(), 0);
        assert_eq!(stats.removed(), 3);
        assert_eq!(stats.added(), 3);
    }

    #[test]
    fn remove_all_drains_queue() {
        let entry = counter_entry();

        entry.add(4, construct::<Counter>);
        assert_eq!(entry.remove(1), 1);
        assert_eq!(entry.remove_all(), 3);
        assert_eq!(entry.stats().removed(), 4);
    }

    #[test]
    fn ensure_type_detects_mismatch() {
        let entry = counter_entry();

        entry
            .ensure_type(TypeId::of::<Counter>(), type_name::<Counter>())
            .unwrap();

        assert!(matches!(
            entry.ensure_type(TypeId::of::<u8>(), "u8"),
            Err(Error::TypeMismatch { expected: "u8", .. })
        ));
    }

    #[test]
    fn strict_check_accepts_distinct_instances() {
        let entry = counter_entry();

        entry.release(Box::new(Counter::default()), true).unwrap();
        entry.release(Box::new(Counter::default()), true).unwrap();

        assert_eq!(entry.stats().idle(), 2);
    }

    #[test]
    fn strict_check_exempts_zero_sized_types() {
        #[derive(Default)]
        struct Marker;

        impl Poolable for Marker {
            fn reset(&mut self) {}
        }

        let entry = PoolEntry::new(TypeId::of::<Marker>(), type_name::<Marker>());

        entry.release(Box::new(Marker), true).unwrap();
        entry.release(Box::new(Marker), true).unwrap();

        assert_eq!(entry.stats().idle(), 2);
    }

    #[test]
    fn factory_is_registered_once() {
        let entry = counter_entry();
        assert!(entry.factory().is_none());

        entry.register_factory(construct::<Counter>);
        entry.register_factory(construct::<Counter>);

        assert!(entry.factory().is_some());
    }
}
