use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::mem;

use crate::{Error, NodeHandle, Result};

/// A doubly-linked list that caches removed nodes and reissues them on later insertions.
///
/// Nodes live in a slot arena owned by the list. Removing a node resets its value to
/// `T::default()` (the old value is handed back to the caller) and parks the slot in an idle-node
/// queue. Subsequent insertions dequeue from that queue before allocating new slots, so a list
/// that has reached its working size performs no allocations.
///
/// # Idle nodes
///
/// [`clear()`][Self::clear] recycles every linked node into the idle-node queue but leaves the
/// queue itself intact. Use [`clear_idle_nodes()`][Self::clear_idle_nodes] to give up the cached
/// nodes.
///
/// # Handles
///
/// Every insertion returns a [`NodeHandle`]. Handles remain valid until their node is removed;
/// after that, every operation given the handle fails with [`Error::StaleHandle`], even if the
/// slot has been reissued to a new value in the meantime.
///
/// # Example
///
/// ```rust
/// use recycling_list::RecyclingList;
///
/// let mut list = RecyclingList::new();
///
/// let first = list.push_back(1);
/// list.push_back(3);
/// list.insert_after(first, 2).unwrap();
///
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
///
/// list.clear();
/// assert!(list.is_empty());
/// assert_eq!(list.idle_len(), 3);
/// ```
///
/// # Thread safety
///
/// The list is thread-mobile ([`Send`]) and shareable ([`Sync`]) if `T` is, with the usual rules
/// of Rust references: mutation requires exclusive access.
#[derive(Debug)]
pub struct RecyclingList<T> {
    entries: Vec<Entry<T>>,

    head: Option<usize>,
    tail: Option<usize>,

    /// Number of linked nodes.
    len: usize,

    /// Slots of removed nodes, reissued in FIFO order.
    idle: VecDeque<usize>,

    /// Head of an intrusive freelist of slots whose idle node was discarded by
    /// `clear_idle_nodes()`. Reusing these counts as a fresh allocation, not as node reuse.
    next_free_index: Option<usize>,

    /// Every linked node receives a unique generation from this counter. Generations are never
    /// reused, not even after the arena is truncated, so stale handles cannot alias new nodes.
    next_generation: u64,
}

#[derive(Debug)]
enum Entry<T> {
    Linked {
        value: T,
        prev: Option<usize>,
        next: Option<usize>,
        generation: u64,
    },

    /// A cached node. The value has been reset to the type's default.
    Idle { value: T },

    Vacant { next_free_index: Option<usize> },
}

impl<T> RecyclingList<T> {
    /// Creates a new empty list with an empty idle-node cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            idle: VecDeque::new(),
            next_free_index: None,
            next_generation: 0,
        }
    }

    /// Returns the number of linked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the list has no linked nodes. Idle nodes are not counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of removed nodes waiting in the idle-node cache.
    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Returns a handle to the first node, if any.
    #[must_use]
    pub fn front(&self) -> Option<NodeHandle> {
        self.head.map(|index| self.handle_at(index))
    }

    /// Returns a handle to the last node, if any.
    #[must_use]
    pub fn back(&self) -> Option<NodeHandle> {
        self.tail.map(|index| self.handle_at(index))
    }

    /// Returns whether the handle refers to a node that is currently linked into this list.
    #[must_use]
    pub fn is_linked(&self, node: NodeHandle) -> bool {
        self.resolve(node).is_ok()
    }

    /// Returns a reference to the value of a linked node, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, node: NodeHandle) -> Option<&T> {
        match self.entries.get(node.index()) {
            Some(Entry::Linked {
                value, generation, ..
            }) if *generation == node.generation() => Some(value),
            _ => None,
        }
    }

    /// Returns an exclusive reference to the value of a linked node, or `None` if the handle is
    /// stale.
    #[must_use]
    pub fn get_mut(&mut self, node: NodeHandle) -> Option<&mut T> {
        match self.entries.get_mut(node.index()) {
            Some(Entry::Linked {
                value, generation, ..
            }) if *generation == node.generation() => Some(value),
            _ => None,
        }
    }

    /// Returns the successor of a node, or `None` if the node is the last one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle does not refer to a linked node.
    pub fn next(&self, node: NodeHandle) -> Result<Option<NodeHandle>> {
        let index = self.resolve(node)?;
        let (_, next) = self.links(index);

        Ok(next.map(|next| self.handle_at(next)))
    }

    /// Returns the predecessor of a node, or `None` if the node is the first one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle does not refer to a linked node.
    pub fn prev(&self, node: NodeHandle) -> Result<Option<NodeHandle>> {
        let index = self.resolve(node)?;
        let (prev, _) = self.links(index);

        Ok(prev.map(|prev| self.handle_at(prev)))
    }

    /// Returns a handle to the first node whose value equals `value`.
    #[must_use]
    pub fn find(&self, value: &T) -> Option<NodeHandle>
    where
        T: PartialEq,
    {
        self.position(value).map(|index| self.handle_at(index))
    }

    /// Returns whether any linked node holds a value equal to `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.position(value).is_some()
    }

    /// Iterates over the values of the linked nodes, front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
            remaining: self.len,
        }
    }

    fn position(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let mut current = self.head;

        while let Some(index) = current {
            match self.entry(index) {
                Entry::Linked {
                    value: candidate,
                    next,
                    ..
                } => {
                    if candidate == value {
                        return Some(index);
                    }

                    current = *next;
                }
                _ => panic!("list links refer to slot {index} that is not linked"),
            }
        }

        None
    }

    fn resolve(&self, node: NodeHandle) -> Result<usize> {
        match self.entries.get(node.index()) {
            Some(Entry::Linked { generation, .. }) if *generation == node.generation() => {
                Ok(node.index())
            }
            _ => Err(Error::StaleHandle { handle: node }),
        }
    }

    fn entry(&self, index: usize) -> &Entry<T> {
        self.entries
            .get(index)
            .expect("list bookkeeping only refers to allocated slots")
    }

    fn entry_mut(&mut self, index: usize) -> &mut Entry<T> {
        self.entries
            .get_mut(index)
            .expect("list bookkeeping only refers to allocated slots")
    }

    fn handle_at(&self, index: usize) -> NodeHandle {
        match self.entry(index) {
            Entry::Linked { generation, .. } => NodeHandle::new(index, *generation),
            _ => panic!("list links refer to slot {index} that is not linked"),
        }
    }

    fn links(&self, index: usize) -> (Option<usize>, Option<usize>) {
        match self.entry(index) {
            Entry::Linked { prev, next, .. } => (*prev, *next),
            _ => panic!("list links refer to slot {index} that is not linked"),
        }
    }

    fn set_prev(&mut self, index: usize, new_prev: Option<usize>) {
        match self.entry_mut(index) {
            Entry::Linked { prev, .. } => *prev = new_prev,
            _ => panic!("list links refer to slot {index} that is not linked"),
        }
    }

    fn set_next(&mut self, index: usize, new_next: Option<usize>) {
        match self.entry_mut(index) {
            Entry::Linked { next, .. } => *next = new_next,
            _ => panic!("list links refer to slot {index} that is not linked"),
        }
    }
}

impl<T: Default> RecyclingList<T> {
    /// Inserts a value at the front of the list.
    pub fn push_front(&mut self, value: T) -> NodeHandle {
        let head = self.head;
        self.link_new(value, None, head)
    }

    /// Inserts a value at the back of the list.
    pub fn push_back(&mut self, value: T) -> NodeHandle {
        let tail = self.tail;
        self.link_new(value, tail, None)
    }

    /// Inserts a value immediately before `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `anchor` does not refer to a linked node. The list is
    /// not modified in that case.
    pub fn insert_before(&mut self, anchor: NodeHandle, value: T) -> Result<NodeHandle> {
        let anchor_index = self.resolve(anchor)?;
        let (prev, _) = self.links(anchor_index);

        Ok(self.link_new(value, prev, Some(anchor_index)))
    }

    /// Inserts a value immediately after `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if `anchor` does not refer to a linked node. The list is
    /// not modified in that case.
    pub fn insert_after(&mut self, anchor: NodeHandle, value: T) -> Result<NodeHandle> {
        let anchor_index = self.resolve(anchor)?;
        let (_, next) = self.links(anchor_index);

        Ok(self.link_new(value, Some(anchor_index), next))
    }

    /// Unlinks a node, caches it for reuse and returns the value it held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleHandle`] if the handle does not refer to a linked node.
    pub fn remove(&mut self, node: NodeHandle) -> Result<T> {
        let index = self.resolve(node)?;
        Ok(self.unlink(index))
    }

    /// Removes the first node (front to back) whose value equals `value`.
    ///
    /// Returns whether a node was removed.
    pub fn remove_value(&mut self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.position(value) {
            Some(index) => {
                drop(self.unlink(index));
                true
            }
            None => false,
        }
    }

    /// Removes the first node and returns its value.
    pub fn pop_front(&mut self) -> Option<T> {
        let index = self.head?;
        Some(self.unlink(index))
    }

    /// Removes the last node and returns its value.
    pub fn pop_back(&mut self) -> Option<T> {
        let index = self.tail?;
        Some(self.unlink(index))
    }

    /// Removes every node, recycling each of them into the idle-node cache.
    ///
    /// The idle-node cache is not drained; see [`clear_idle_nodes()`][Self::clear_idle_nodes].
    pub fn clear(&mut self) {
        let mut current = self.head;

        while let Some(index) = current {
            let (_, next) = self.links(index);

            *self.entry_mut(index) = Entry::Idle {
                value: T::default(),
            };
            self.idle.push_back(index);

            current = next;
        }

        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Discards every cached idle node.
    ///
    /// The slots of discarded nodes may still be used by future insertions but are no longer
    /// counted as cached nodes. If the list is empty, the backing storage is released entirely.
    pub fn clear_idle_nodes(&mut self) {
        while let Some(index) = self.idle.pop_front() {
            let next_free_index = self.next_free_index;
            *self.entry_mut(index) = Entry::Vacant { next_free_index };
            self.next_free_index = Some(index);
        }

        if self.len == 0 {
            self.entries = Vec::new();
            self.next_free_index = None;
        }
    }

    fn link_new(&mut self, value: T, prev: Option<usize>, next: Option<usize>) -> NodeHandle {
        let generation = self.next_generation;
        self.next_generation = generation
            .checked_add(1)
            .expect("node generation counter cannot realistically overflow u64");

        let index = self.acquire_slot(Entry::Linked {
            value,
            prev,
            next,
            generation,
        });

        match prev {
            Some(prev) => self.set_next(prev, Some(index)),
            None => self.head = Some(index),
        }

        match next {
            Some(next) => self.set_prev(next, Some(index)),
            None => self.tail = Some(index),
        }

        self.len = self
            .len
            .checked_add(1)
            .expect("cannot have more linked nodes than fit in memory");

        NodeHandle::new(index, generation)
    }

    fn acquire_slot(&mut self, entry: Entry<T>) -> usize {
        if let Some(index) = self.idle.pop_front() {
            *self.entry_mut(index) = entry;
            return index;
        }

        if let Some(index) = self.next_free_index {
            self.next_free_index = match self.entry(index) {
                Entry::Vacant { next_free_index } => *next_free_index,
                _ => panic!("freelist refers to slot {index} that is not vacant"),
            };

            *self.entry_mut(index) = entry;
            return index;
        }

        let index = self.entries.len();
        self.entries.push(entry);
        index
    }

    fn unlink(&mut self, index: usize) -> T {
        let Entry::Linked {
            value, prev, next, ..
        } = mem::replace(
            self.entry_mut(index),
            Entry::Idle {
                value: T::default(),
            },
        )
        else {
            panic!("list links refer to slot {index} that is not linked");
        };

        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.head = next,
        }

        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.tail = prev,
        }

        self.len = self
            .len
            .checked_sub(1)
            .expect("unlinked a node from a list that had no linked nodes");

        self.idle.push_back(index);

        value
    }
}

impl<T> Default for RecyclingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Extend<T> for RecyclingList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T: Default> FromIterator<T> for RecyclingList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a, T> IntoIterator for &'a RecyclingList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the values of a [`RecyclingList`], front to back.
///
/// Created by [`RecyclingList::iter()`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    list: &'a RecyclingList<T>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let list = self.list;

        match list.entry(index) {
            Entry::Linked { value, next, .. } => {
                self.next = *next;
                self.remaining = self.remaining.saturating_sub(1);
                Some(value)
            }
            _ => panic!("list links refer to slot {index} that is not linked"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(RecyclingList<u32>: Send, Sync);
    assert_not_impl_any!(RecyclingList<Rc<u32>>: Send, Sync);

    fn values<T: Clone>(list: &RecyclingList<T>) -> Vec<T> {
        list.iter().cloned().collect()
    }

    #[test]
    fn smoke_test() {
        let mut list = RecyclingList::new();

        let b = list.push_back(2);
        let a = list.push_front(1);
        let d = list.push_back(4);
        let c = list.insert_before(d, 3).unwrap();
        let e = list.insert_after(d, 5).unwrap();

        assert_eq!(values(&list), [1, 2, 3, 4, 5]);
        assert_eq!(list.len(), 5);
        assert_eq!(list.front(), Some(a));
        assert_eq!(list.back(), Some(e));

        assert_eq!(list.next(b).unwrap(), Some(c));
        assert_eq!(list.prev(b).unwrap(), Some(a));
        assert_eq!(list.prev(a).unwrap(), None);
        assert_eq!(list.next(e).unwrap(), None);

        assert_eq!(list.remove(c).unwrap(), 3);
        assert_eq!(values(&list), [1, 2, 4, 5]);
        assert_eq!(list.next(b).unwrap(), Some(d));
    }

    #[test]
    fn removed_node_is_reissued() {
        let mut list = RecyclingList::new();

        let a = list.push_back(10);
        list.push_back(20);

        list.remove(a).unwrap();
        assert_eq!(list.idle_len(), 1);
        assert_eq!(list.entries.len(), 2);

        let reused = list.push_back(30);

        assert_eq!(list.idle_len(), 0);
        assert_eq!(reused.index(), a.index());
        assert_eq!(list.entries.len(), 2);
        assert_eq!(values(&list), [20, 30]);
    }

    #[test]
    fn idle_nodes_are_reissued_in_fifo_order() {
        let mut list = RecyclingList::new();

        let a = list.push_back(1);
        let b = list.push_back(2);

        list.remove(b).unwrap();
        list.remove(a).unwrap();

        assert_eq!(list.push_back(3).index(), b.index());
        assert_eq!(list.push_back(4).index(), a.index());
    }

    #[test]
    fn removal_resets_cached_value() {
        let mut list = RecyclingList::new();

        let a = list.push_back("hello".to_string());

        assert_eq!(list.remove(a).unwrap(), "hello");

        match list.entries.first().unwrap() {
            Entry::Idle { value } => assert!(value.is_empty()),
            other => panic!("expected idle entry, got {other:?}"),
        }
    }

    #[test]
    fn removal_does_not_retain_value() {
        let tracked = Rc::new(5);
        let mut list = RecyclingList::new();

        let node = list.push_back(Some(Rc::clone(&tracked)));
        assert_eq!(Rc::strong_count(&tracked), 2);

        drop(list.remove(node).unwrap());
        assert_eq!(Rc::strong_count(&tracked), 1);

        list.push_back(Some(Rc::clone(&tracked)));
        list.clear();
        assert_eq!(Rc::strong_count(&tracked), 1);
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut list = RecyclingList::new();

        let a = list.push_back(1);
        list.remove(a).unwrap();

        assert_eq!(list.remove(a), Err(Error::StaleHandle { handle: a }));
        assert!(list.get(a).is_none());
        assert!(!list.is_linked(a));
        assert!(list.insert_before(a, 5).is_err());
        assert!(list.insert_after(a, 5).is_err());
        assert!(list.next(a).is_err());
        assert!(list.prev(a).is_err());
        assert!(list.is_empty());
    }

    #[test]
    fn stale_handle_is_rejected_after_reuse() {
        let mut list = RecyclingList::new();

        let old = list.push_back(1);
        list.remove(old).unwrap();

        let new = list.push_back(2);
        assert_eq!(old.index(), new.index());

        assert!(list.get(old).is_none());
        assert_eq!(list.get(new), Some(&2));
        assert!(list.remove(old).is_err());
        assert_eq!(values(&list), [2]);
    }

    #[test]
    fn handle_from_other_list_is_rejected() {
        let mut first = RecyclingList::new();
        let mut second = RecyclingList::new();

        first.push_back(1);
        first.push_back(2);
        let foreign = first.push_back(3);

        second.push_back(9);

        assert!(second.remove(foreign).is_err());
    }

    #[test]
    fn remove_value_removes_first_match() {
        let mut list: RecyclingList<u32> = [1, 2, 1, 3].into_iter().collect();

        assert!(list.remove_value(&1));
        assert_eq!(values(&list), [2, 1, 3]);

        assert!(list.remove_value(&1));
        assert_eq!(values(&list), [2, 3]);

        assert!(!list.remove_value(&1));
        assert_eq!(list.idle_len(), 2);
    }

    #[test]
    fn find_and_contains() {
        let mut list = RecyclingList::new();

        list.push_back('a');
        let b = list.push_back('b');

        assert_eq!(list.find(&'b'), Some(b));
        assert!(list.contains(&'a'));
        assert!(!list.contains(&'z'));
        assert_eq!(list.find(&'z'), None);
    }

    #[test]
    fn pop_front_and_back() {
        let mut list: RecyclingList<u32> = (1..=3).collect();

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);

        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.idle_len(), 3);
    }

    #[test]
    fn clear_recycles_every_node() {
        let mut list: RecyclingList<u32> = (0..4).collect();
        let old_front = list.front().unwrap();

        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.idle_len(), 4);
        assert!(list.get(old_front).is_none());
        assert_eq!(list.iter().count(), 0);

        list.extend([7, 8]);
        assert_eq!(list.idle_len(), 2);
        assert_eq!(list.entries.len(), 4);
        assert_eq!(values(&list), [7, 8]);
    }

    #[test]
    fn clear_idle_nodes_on_empty_list_releases_storage() {
        let mut list: RecyclingList<u32> = (0..4).collect();

        list.clear();
        list.clear_idle_nodes();

        assert_eq!(list.idle_len(), 0);
        assert!(list.entries.is_empty());

        // Generations keep increasing so old handles stay stale.
        let node = list.push_back(1);
        assert!(node.generation() >= 4);
    }

    #[test]
    fn clear_idle_nodes_on_populated_list_keeps_slots_for_reuse() {
        let mut list = RecyclingList::new();

        let a = list.push_back(1);
        let b = list.push_back(2);
        list.push_back(3);

        list.remove(a).unwrap();
        list.remove(b).unwrap();
        list.clear_idle_nodes();

        assert_eq!(list.idle_len(), 0);
        assert_eq!(list.entries.len(), 3);

        // Vacant slots are filled before the arena grows.
        list.push_back(4);
        list.push_back(5);
        assert_eq!(list.entries.len(), 3);

        list.push_back(6);
        assert_eq!(list.entries.len(), 4);

        assert_eq!(values(&list), [3, 4, 5, 6]);
    }

    #[test]
    fn get_mut_modifies_value() {
        let mut list = RecyclingList::new();

        let node = list.push_back(1);
        *list.get_mut(node).unwrap() = 10;

        assert_eq!(list.get(node), Some(&10));
    }

    #[test]
    fn iter_reports_exact_size() {
        let list: RecyclingList<u32> = (0..5).collect();

        let mut iter = list.iter();
        assert_eq!(iter.len(), 5);

        iter.next();
        assert_eq!(iter.len(), 4);

        assert_eq!((&list).into_iter().sum::<u32>(), 10);
    }
}
