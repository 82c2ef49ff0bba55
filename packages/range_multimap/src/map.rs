use std::hash::Hash;
use std::iter::FusedIterator;

use foldhash::{HashMap, HashMapExt};
use recycling_list::{NodeHandle, RecyclingList};

use crate::{Range, Result};

/// A multi-valued map whose buckets are contiguous runs of nodes in one shared recycling list.
///
/// Each key maps to a [`Range`]. The first value added for a key appends two nodes to the shared
/// list: the value and a terminal sentinel. Later values for the same key are inserted
/// immediately before that key's terminal, so a bucket never interleaves with another bucket and
/// values are enumerated in insertion order.
///
/// Lookup by key is O(1); operations that look for a specific value scan the key's bucket.
///
/// # Example
///
/// ```rust
/// use range_multimap::RangeMultiMap;
///
/// let mut map = RangeMultiMap::new();
///
/// map.add(1, 'a');
/// map.add(1, 'b');
/// map.add(2, 'c');
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.count(&1), 2);
/// assert!(map.contains(&1, &'b'));
///
/// assert!(map.remove_all(&1));
/// assert!(!map.contains_key(&1));
/// ```
#[derive(Debug)]
pub struct RangeMultiMap<K, V> {
    /// Value nodes hold `Some`, terminal nodes hold `None`.
    list: RecyclingList<Option<V>>,

    ranges: HashMap<K, Range>,
}

impl<K, V> RangeMultiMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: RecyclingList::new(),
            ranges: HashMap::new(),
        }
    }

    /// Returns the number of keys that have at least one value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns whether the key has at least one value.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.ranges.contains_key(key)
    }

    /// Returns whether the key's bucket contains a value equal to `value`.
    #[must_use]
    pub fn contains(&self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.find(key, value).is_some()
    }

    /// Returns the range describing the key's bucket, if the key has any values.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Range> {
        self.ranges.get(key).copied()
    }

    /// Returns the number of values stored for the key.
    #[must_use]
    pub fn count(&self, key: &K) -> usize {
        self.values_of(key).count()
    }

    /// Adds a value to the key's bucket and returns the handle of the node that holds it.
    ///
    /// The value is placed after all values previously added for the same key.
    pub fn add(&mut self, key: K, value: V) -> NodeHandle {
        if let Some(range) = self.ranges.get(&key) {
            return self
                .list
                .insert_before(range.terminal(), Some(value))
                .expect("the terminal of a recorded range is always linked");
        }

        let first = self.list.push_back(Some(value));
        let terminal = self.list.push_back(None);

        self.ranges.insert(
            key,
            Range::new(first, terminal).expect("two freshly linked nodes are always distinct"),
        );

        first
    }

    /// Returns the node holding the first value in the key's bucket that equals `value`.
    #[must_use]
    pub fn find(&self, key: &K, value: &V) -> Option<NodeHandle>
    where
        V: PartialEq,
    {
        let range = self.get(key)?;
        let mut current = Some(range.first());

        while let Some(node) = current {
            if node == range.terminal() {
                break;
            }

            if self.value(node) == Some(value) {
                return Some(node);
            }

            current = self
                .list
                .next(node)
                .expect("bucket nodes between first and terminal are always linked");
        }

        None
    }

    /// Removes the first value in the key's bucket that equals `value`.
    ///
    /// If the removed value was the last one in the bucket, the key is removed from the map and
    /// the bucket's terminal node is recycled as well.
    ///
    /// Returns whether a value was removed.
    pub fn remove(&mut self, key: &K, value: &V) -> bool
    where
        V: PartialEq,
    {
        let Some(node) = self.find(key, value) else {
            return false;
        };

        let range = self
            .get(key)
            .expect("find() only returns nodes of recorded ranges");

        if node == range.first() {
            let next = self
                .list
                .next(node)
                .expect("find() only returns linked nodes")
                .expect("every value node is followed by at least its terminal");

            if next == range.terminal() {
                self.ranges.remove(key);
                drop(
                    self.list
                        .remove(next)
                        .expect("the terminal of a recorded range is always linked"),
                );
            } else if let Some(recorded) = self.ranges.get_mut(key) {
                *recorded = Range::new(next, range.terminal())
                    .expect("a value node is never the terminal of its own bucket");
            }
        }

        drop(
            self.list
                .remove(node)
                .expect("find() only returns linked nodes"),
        );

        true
    }

    /// Removes the key and every value in its bucket, recycling all of the bucket's nodes
    /// including the terminal.
    ///
    /// Returns whether the key was present.
    pub fn remove_all(&mut self, key: &K) -> bool {
        let Some(range) = self.ranges.remove(key) else {
            return false;
        };

        let mut current = range.first();

        loop {
            let next = self
                .list
                .next(current)
                .expect("bucket nodes are always linked");

            drop(
                self.list
                    .remove(current)
                    .expect("bucket nodes are always linked"),
            );

            if current == range.terminal() {
                break;
            }

            current = next.expect("every bucket ends with its terminal");
        }

        true
    }

    /// Removes every key and value. All nodes are recycled into the backing list's idle cache.
    pub fn clear(&mut self) {
        self.list.clear();
        self.ranges.clear();
    }

    /// Returns the value held by a node, or `None` if the node is stale or is a terminal.
    #[must_use]
    pub fn value(&self, node: NodeHandle) -> Option<&V> {
        self.list.get(node).and_then(Option::as_ref)
    }

    /// Returns the node that follows `node` within `range`, or `None` if `node` is the last value
    /// node of the range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::List`][crate::Error::List] if `node` is no longer linked.
    pub fn successor(&self, range: Range, node: NodeHandle) -> Result<Option<NodeHandle>> {
        let next = self.list.next(node)?;
        Ok(next.filter(|next| *next != range.terminal()))
    }

    /// Iterates over the values of a range, from its first node up to but excluding its terminal.
    pub fn values(&self, range: Range) -> Values<'_, V> {
        Values {
            list: &self.list,
            next: Some(range.first()),
            terminal: Some(range.terminal()),
        }
    }

    /// Iterates over the values stored for a key. The iterator is empty if the key is absent.
    pub fn values_of(&self, key: &K) -> Values<'_, V> {
        match self.get(key) {
            Some(range) => self.values(range),
            None => Values {
                list: &self.list,
                next: None,
                terminal: None,
            },
        }
    }

    /// Iterates over the keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.ranges.keys()
    }

    /// Iterates over `(key, range)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Range)> {
        self.ranges.iter().map(|(key, range)| (key, *range))
    }

    /// Returns the number of recycled nodes held by the backing list.
    #[must_use]
    pub fn idle_node_count(&self) -> usize {
        self.list.idle_len()
    }
}

impl<K, V> Default for RangeMultiMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the values of one bucket of a [`RangeMultiMap`].
///
/// Created by [`RangeMultiMap::values()`] and [`RangeMultiMap::values_of()`].
#[derive(Debug)]
pub struct Values<'a, V> {
    list: &'a RecyclingList<Option<V>>,
    next: Option<NodeHandle>,
    terminal: Option<NodeHandle>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;

        if Some(node) == self.terminal {
            return None;
        }

        let list = self.list;

        // A stale node ends the walk: the range was invalidated by a removal.
        let value = list.get(node)?.as_ref()?;
        self.next = list.next(node).ok().flatten();

        Some(value)
    }
}

impl<V> FusedIterator for Values<'_, V> {}
