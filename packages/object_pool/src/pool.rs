use std::any::{Any, TypeId, type_name};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use foldhash::{HashMap, HashMapExt};
use parking_lot::Mutex;
use tracing::debug;

use crate::{Error, PoolEntry, PoolStats, Poolable, Result, construct};

// The process-wide pool is an intentional, mutex-guarded shared resource. It is created on first
// use and lives until the process exits; `clear_all()` is its teardown.
static GLOBAL: LazyLock<ObjectPool> = LazyLock::new(ObjectPool::new);

/// A thread-safe registry that maps a type identity to a queue of idle instances of that type.
///
/// This type acts as a cloneable handle to a shared registry. Multiple handles can exist
/// simultaneously and all of them operate on the same set of idle queues.
///
/// # Construction of instances
///
/// The typed methods ([`acquire()`][Self::acquire], [`add()`][Self::add]) construct instances via
/// [`Default`]. The untyped methods ([`acquire_dyn()`][Self::acquire_dyn],
/// [`add_dyn()`][Self::add_dyn]) only know the [`TypeId`] and use the zero-argument constructor
/// registered for that type, either explicitly via [`register()`][Self::register] or implicitly
/// by a previous typed acquisition.
///
/// # Strict checking
///
/// When [`set_strict_check(true)`][Self::set_strict_check] is in effect, every release scans the
/// type's idle queue for the released instance and fails with [`Error::DoubleRelease`] if it is
/// already there. This is an O(n) diagnostic and is disabled by default.
///
/// # Thread safety
///
/// This type is thread-safe. The registry lock is only held while looking up or creating the
/// entry for a type; acquire and release traffic only takes the lock of that type's idle queue.
///
/// # Example
///
/// ```rust
/// use std::any::TypeId;
///
/// use object_pool::{ObjectPool, Poolable};
///
/// #[derive(Default)]
/// struct Message {
///     text: String,
/// }
///
/// impl Poolable for Message {
///     fn reset(&mut self) {
///         self.text.clear();
///     }
/// }
///
/// let pool = ObjectPool::new();
/// pool.register::<Message>();
///
/// // Pre-warm the idle queue.
/// pool.add::<Message>(8);
/// assert_eq!(pool.stats::<Message>().unwrap().idle(), 8);
///
/// // Acquire knowing only the type identity.
/// let message = pool.acquire_dyn(TypeId::of::<Message>()).unwrap();
/// pool.release_dyn(message).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct ObjectPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    entries: Mutex<HashMap<TypeId, Arc<PoolEntry>>>,
    strict_check: AtomicBool,
}

impl ObjectPool {
    /// Creates a new empty pool with strict checking disabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                entries: Mutex::new(HashMap::new()),
                strict_check: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the process-wide pool.
    ///
    /// The pool is created on first use. Use [`clear_all()`][Self::clear_all] to drop every
    /// instance it caches.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Enables or disables double-release detection for subsequent releases.
    ///
    /// Safe code cannot release the same instance twice because every release consumes the
    /// owning [`Box`]. Two boxes that own the same allocation can only be made with `unsafe`
    /// code and are undefined behavior before they ever reach the pool. The check is a last
    /// diagnostic for such code, not a safety net: it cannot undo the damage and it only sees
    /// instances that are still idle.
    pub fn set_strict_check(&self, enabled: bool) {
        self.inner.strict_check.store(enabled, Ordering::Relaxed);
    }

    /// Returns whether double-release detection is enabled.
    #[must_use]
    pub fn strict_check(&self) -> bool {
        self.inner.strict_check.load(Ordering::Relaxed)
    }

    /// Returns the number of types the pool has an entry for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Returns whether the pool has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Registers the zero-argument constructor of `T`, enabling the untyped methods to create
    /// instances of `T`.
    pub fn register<T>(&self)
    where
        T: Poolable + Default,
    {
        self.entry_of::<T>().register_factory(construct::<T>);
    }

    /// Takes an idle instance of `T` or creates a new one.
    ///
    /// An instance taken from the idle queue has been reset when it was released.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the entry serving `T` holds instances of another type.
    pub fn acquire<T>(&self) -> Result<Box<T>>
    where
        T: Poolable + Default,
    {
        let entry = self.entry_of::<T>();
        entry.ensure_type(TypeId::of::<T>(), type_name::<T>())?;
        entry.register_factory(construct::<T>);

        let instance: Box<dyn Any> = entry.acquire(construct::<T>);

        instance.downcast::<T>().map_err(|_| Error::TypeMismatch {
            expected: type_name::<T>(),
            actual: entry.type_name(),
        })
    }

    /// Takes an idle instance of the identified type or creates a new one with the type's
    /// registered constructor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no constructor is registered for the type.
    pub fn acquire_dyn(&self, type_id: TypeId) -> Result<Box<dyn Poolable>> {
        let (entry, factory) = self.constructible_entry(type_id)?;
        Ok(entry.acquire(factory))
    }

    /// Resets the instance and returns it to the idle queue of its type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoubleRelease`] if strict checking is enabled and the instance is
    /// already in the idle queue. Only unsound code can trigger this; see
    /// [`set_strict_check()`][Self::set_strict_check].
    pub fn release<T>(&self, instance: Box<T>) -> Result<()>
    where
        T: Poolable,
    {
        self.release_dyn(instance)
    }

    /// Resets the instance and returns it to the idle queue of its concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DoubleRelease`] if strict checking is enabled and the instance is
    /// already in the idle queue. Only unsound code can trigger this; see
    /// [`set_strict_check()`][Self::set_strict_check].
    pub fn release_dyn(&self, instance: Box<dyn Poolable>) -> Result<()> {
        let any: &dyn Any = &*instance;
        let type_id = any.type_id();

        let entry = self.get_or_create_entry(type_id, instance.type_name());
        entry.release(instance, self.strict_check())
    }

    /// Creates `count` instances of `T` and puts them into the idle queue.
    pub fn add<T>(&self, count: usize)
    where
        T: Poolable + Default,
    {
        let entry = self.entry_of::<T>();
        entry.register_factory(construct::<T>);
        entry.add(count, construct::<T>);

        debug!(type_name = entry.type_name(), count, "pre-warmed pool entry");
    }

    /// Creates `count` instances of the identified type with its registered constructor and puts
    /// them into the idle queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if no constructor is registered for the type.
    pub fn add_dyn(&self, type_id: TypeId, count: usize) -> Result<()> {
        let (entry, factory) = self.constructible_entry(type_id)?;
        entry.add(count, factory);

        debug!(type_name = entry.type_name(), count, "pre-warmed pool entry");
        Ok(())
    }

    /// Drops up to `count` idle instances of `T`. Returns how many were dropped.
    pub fn remove<T>(&self, count: usize) -> usize
    where
        T: Poolable,
    {
        self.entry_of::<T>().remove(count)
    }

    /// Drops up to `count` idle instances of the identified type. Returns how many were dropped.
    pub fn remove_dyn(&self, type_id: TypeId, count: usize) -> usize {
        self.find_entry(type_id)
            .map_or(0, |entry| entry.remove(count))
    }

    /// Drops every idle instance of `T`. Returns how many were dropped.
    pub fn remove_all<T>(&self) -> usize
    where
        T: Poolable,
    {
        self.entry_of::<T>().remove_all()
    }

    /// Drops every idle instance of the identified type. Returns how many were dropped.
    pub fn remove_all_dyn(&self, type_id: TypeId) -> usize {
        self.find_entry(type_id).map_or(0, |entry| entry.remove_all())
    }

    /// Drops every idle instance of every type and forgets all entries, including registered
    /// constructors.
    pub fn clear_all(&self) {
        let entries = {
            let mut entries = self.inner.entries.lock();
            entries.drain().map(|(_, entry)| entry).collect::<Vec<_>>()
        };

        let dropped: usize = entries.iter().map(|entry| entry.remove_all()).sum();

        debug!(entries = entries.len(), dropped, "cleared object pool");
    }

    /// Returns a snapshot of the counters of `T`, if the pool has an entry for it.
    #[must_use]
    pub fn stats<T>(&self) -> Option<PoolStats>
    where
        T: Poolable,
    {
        self.find_entry(TypeId::of::<T>()).map(|entry| entry.stats())
    }

    /// Returns a snapshot of the counters of every type the pool has an entry for, in arbitrary
    /// order.
    #[must_use]
    pub fn all_stats(&self) -> Vec<PoolStats> {
        let entries: Vec<_> = self.inner.entries.lock().values().cloned().collect();
        entries.iter().map(|entry| entry.stats()).collect()
    }

    fn entry_of<T>(&self) -> Arc<PoolEntry>
    where
        T: Poolable,
    {
        self.get_or_create_entry(TypeId::of::<T>(), type_name::<T>())
    }

    fn get_or_create_entry(&self, type_id: TypeId, type_name: &'static str) -> Arc<PoolEntry> {
        let mut entries = self.inner.entries.lock();

        Arc::clone(entries.entry(type_id).or_insert_with(|| {
            debug!(type_name, "created pool entry");
            Arc::new(PoolEntry::new(type_id, type_name))
        }))
    }

    fn find_entry(&self, type_id: TypeId) -> Option<Arc<PoolEntry>> {
        self.inner.entries.lock().get(&type_id).cloned()
    }

    fn constructible_entry(
        &self,
        type_id: TypeId,
    ) -> Result<(Arc<PoolEntry>, crate::Factory)> {
        let entry = self.find_entry(type_id).ok_or_else(|| Error::InvalidArgument {
            problem: format!("no pool entry exists for {type_id:?}"),
        })?;

        let factory = entry.factory().ok_or_else(|| Error::InvalidArgument {
            problem: format!("no constructor is registered for {}", entry.type_name()),
        })?;

        Ok((entry, factory))
    }
}

impl Default for ObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::ptr;
    use std::sync::Barrier;
    use std::thread;

    use static_assertions::assert_impl_all;
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(ObjectPool: Send, Sync, Clone);

    #[derive(Debug, Default, PartialEq)]
    struct Packet {
        id: u32,
        payload: Vec<u8>,
    }

    impl Poolable for Packet {
        fn reset(&mut self) {
            self.id = 0;
            self.payload.clear();
        }
    }

    #[derive(Default)]
    struct Token {
        value: u64,
    }

    impl Poolable for Token {
        fn reset(&mut self) {
            self.value = 0;
        }
    }

    fn address<T: ?Sized>(instance: &T) -> *const () {
        (&raw const *instance).cast()
    }

    #[test]
    fn release_then_acquire_returns_same_reset_instance() {
        let pool = ObjectPool::new();

        let mut packet = pool.acquire::<Packet>().unwrap();
        packet.id = 7;
        packet.payload.extend_from_slice(&[1, 2, 3]);
        let released_at = address(&*packet);

        pool.release(packet).unwrap();

        let packet = pool.acquire::<Packet>().unwrap();
        assert_eq!(address(&*packet), released_at);
        assert_eq!(*packet, Packet::default());
    }

    #[test]
    fn acquire_from_empty_queue_constructs() {
        let pool = ObjectPool::new();

        let first = pool.acquire::<Packet>().unwrap();
        let second = pool.acquire::<Packet>().unwrap();
        assert_ne!(address(&*first), address(&*second));

        let stats = pool.stats::<Packet>().unwrap();
        assert_eq!(stats.added(), 2);
        assert_eq!(stats.acquired(), 2);
        assert_eq!(stats.using(), 2);
    }

    #[test]
    fn counters_track_traffic() {
        let pool = ObjectPool::new();

        pool.add::<Packet>(2);
        let a = pool.acquire::<Packet>().unwrap();
        let b = pool.acquire::<Packet>().unwrap();
        let c = pool.acquire::<Packet>().unwrap();
        pool.release(a).unwrap();
        pool.release(b).unwrap();
        drop(c);
        assert_eq!(pool.remove::<Packet>(5), 2);

        let stats = pool.stats::<Packet>().unwrap();
        assert_eq!(stats.type_name(), type_name::<Packet>());
        assert_eq!(stats.idle(), 0);
        assert_eq!(stats.using(), 1);
        assert_eq!(stats.acquired(), 3);
        assert_eq!(stats.released(), 2);
        assert_eq!(stats.added(), 3);
        assert_eq!(stats.removed(), 2);
    }

    #[test]
    fn types_are_kept_apart() {
        let pool = ObjectPool::new();

        pool.add::<Packet>(3);
        pool.add::<Token>(1);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats::<Packet>().unwrap().idle(), 3);
        assert_eq!(pool.stats::<Token>().unwrap().idle(), 1);

        assert_eq!(pool.remove_all::<Packet>(), 3);
        assert_eq!(pool.stats::<Token>().unwrap().idle(), 1);
    }

    #[test]
    fn acquire_dyn_requires_registered_constructor() {
        let pool = ObjectPool::new();

        assert!(matches!(
            pool.acquire_dyn(TypeId::of::<Token>()),
            Err(Error::InvalidArgument { .. })
        ));

        // An entry created by a release does not know how to construct instances.
        pool.release(Box::new(Token::default())).unwrap();
        pool.remove_all::<Token>();
        assert!(matches!(
            pool.acquire_dyn(TypeId::of::<Token>()),
            Err(Error::InvalidArgument { .. })
        ));

        pool.register::<Token>();
        let token = pool.acquire_dyn(TypeId::of::<Token>()).unwrap();
        assert_eq!(token.type_name(), type_name::<Token>());
    }

    #[test]
    fn typed_acquire_registers_constructor() {
        let pool = ObjectPool::new();

        drop(pool.acquire::<Token>().unwrap());

        pool.add_dyn(TypeId::of::<Token>(), 2).unwrap();
        assert_eq!(pool.stats::<Token>().unwrap().idle(), 2);
    }

    #[test]
    fn release_dyn_routes_by_concrete_type() {
        let pool = ObjectPool::new();

        let token: Box<dyn Poolable> = Box::new(Token { value: 5 });
        pool.release_dyn(token).unwrap();

        assert_eq!(pool.stats::<Token>().unwrap().idle(), 1);
        assert!(pool.stats::<Packet>().is_none());

        let token = pool.acquire::<Token>().unwrap();
        assert_eq!(token.value, 0);
    }

    #[test]
    fn dyn_removal_of_unknown_type_is_noop() {
        let pool = ObjectPool::new();

        assert_eq!(pool.remove_dyn(TypeId::of::<Token>(), 3), 0);
        assert_eq!(pool.remove_all_dyn(TypeId::of::<Token>()), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn dyn_removal_clamps() {
        let pool = ObjectPool::new();

        pool.add::<Token>(2);

        assert_eq!(pool.remove_dyn(TypeId::of::<Token>(), 1), 1);
        assert_eq!(pool.remove_all_dyn(TypeId::of::<Token>()), 1);
    }

    #[test]
    fn clear_all_forgets_entries() {
        let pool = ObjectPool::new();

        pool.add::<Packet>(2);
        pool.register::<Token>();
        assert_eq!(pool.all_stats().len(), 2);

        pool.clear_all();

        assert!(pool.is_empty());
        assert!(pool.all_stats().is_empty());
        assert!(pool.acquire_dyn(TypeId::of::<Token>()).is_err());
    }

    #[test]
    fn strict_check_is_off_by_default_and_toggles() {
        let pool = ObjectPool::new();
        assert!(!pool.strict_check());

        pool.set_strict_check(true);
        assert!(pool.strict_check());

        let a = pool.acquire::<Packet>().unwrap();
        let b = pool.acquire::<Packet>().unwrap();
        pool.release(a).unwrap();
        pool.release(b).unwrap();

        pool.set_strict_check(false);
        assert!(!pool.strict_check());
    }

    #[test]
    fn strict_check_accepts_reused_allocation() {
        let pool = ObjectPool::new();
        pool.set_strict_check(true);

        let first = pool.acquire::<Packet>().unwrap();
        let address = ptr::from_ref::<Packet>(&first).addr();
        pool.release(first).unwrap();

        // The same allocation comes back and is released again by its new owner.
        let second = pool.acquire::<Packet>().unwrap();
        assert_eq!(ptr::from_ref::<Packet>(&second).addr(), address);
        pool.release(second).unwrap();

        let stats = pool.stats::<Packet>().unwrap();
        assert_eq!(stats.released(), 2);
        assert_eq!(stats.idle(), 1);
    }

    #[test]
    fn clones_share_registry() {
        let pool = ObjectPool::new();
        let clone = pool.clone();

        clone.add::<Token>(3);

        assert_eq!(pool.stats::<Token>().unwrap().idle(), 3);
    }

    #[test]
    fn concurrent_traffic_on_many_types() {
        const THREADS: usize = 4;
        const ITERATIONS: usize = 500;

        with_watchdog(|| {
            let pool = ObjectPool::new();
            let barrier = Barrier::new(THREADS);

            thread::scope(|s| {
                for thread_index in 0..THREADS {
                    let pool = &pool;
                    let barrier = &barrier;

                    s.spawn(move || {
                        barrier.wait();

                        for _ in 0..ITERATIONS {
                            if thread_index % 2 == 0 {
                                let packet = pool.acquire::<Packet>().unwrap();
                                pool.release(packet).unwrap();
                            } else {
                                let token = pool.acquire::<Token>().unwrap();
                                pool.release(token).unwrap();
                            }
                        }
                    });
                }
            });

            let packets = pool.stats::<Packet>().unwrap();
            let tokens = pool.stats::<Token>().unwrap();

            // Every thread holds at most one instance at a time.
            assert!(packets.idle() <= THREADS);
            assert!(tokens.idle() <= THREADS);
            assert!(packets.idle() >= 1);
            assert!(tokens.idle() >= 1);
        });
    }
}
