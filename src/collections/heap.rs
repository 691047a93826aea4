use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::CollectionError;
use super::hash_map::ChainedHashMap;


/// Shrink floor for the heap's backing array
const DEFAULT_CAPACITY: usize = 10;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(0);


/// Handle to an entry of an [`AdaptablePriorityQueue`]
///
/// Returned by `insert` and used to re-prioritize the entry later. A locator
/// is only valid for the queue that issued it and only until its entry is
/// removed; after that every operation using it fails with
/// [`CollectionError::InvalidLocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locator {
    queue: u64,
    ticket: u64,
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    ticket: u64,
}


/// Adaptable priority queue backed by an array-based binary min-heap
///
/// The heap is a complete binary tree stored level by level: the children of
/// index `i` live at `2i + 1` and `2i + 2`, its parent at `(i - 1) / 2`.
/// Each entry carries a ticket that is never reissued, and `positions` maps
/// live tickets to heap indices. Every swap keeps that map in sync, which is
/// what lets a [`Locator`] find its entry in O(1) expected time and
/// re-prioritize it in O(log n). Both the array and the map give memory back
/// as the queue drains.
#[derive(Debug)]
pub struct AdaptablePriorityQueue<K, V> {
    id: u64,
    next_ticket: u64,
    heap: Vec<Entry<K, V>>,
    positions: ChainedHashMap<u64, usize>,
}

impl<K: PartialOrd, V> AdaptablePriorityQueue<K, V> {

    pub const DEFAULT_CAPACITY: usize = DEFAULT_CAPACITY;

    pub fn new() -> Self {
        Self {
            id: NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed),
            next_ticket: 0,
            heap: Vec::with_capacity(DEFAULT_CAPACITY),
            positions: ChainedHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Add an entry and bubble it up to its place; returns its locator
    pub fn insert(&mut self, key: K, value: V) -> Locator {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let index = self.heap.len();
        // Vec doubles its allocation when full
        self.heap.push(Entry { key, value, ticket });
        self.positions.insert(ticket, index);
        self.upheap(index);

        Locator { queue: self.id, ticket }
    }

    /// Remove and return the entry with the smallest key
    pub fn remove_min(&mut self) -> Result<(K, V), CollectionError> {
        if self.heap.is_empty() {
            return Err(CollectionError::EmptyQueue);
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop().ok_or(CollectionError::EmptyQueue)?;
        self.positions.remove(&entry.ticket)?;

        if !self.heap.is_empty() {
            self.downheap(0);
        }

        let capacity = self.heap.capacity();
        if self.heap.len() < capacity / 4 && capacity > DEFAULT_CAPACITY {
            self.heap.shrink_to((capacity / 2).max(DEFAULT_CAPACITY));
        }

        Ok((entry.key, entry.value))
    }

    /// Replace the key and value of a live entry and restore heap order
    ///
    /// A smaller key than the parent's bubbles up, anything else bubbles
    /// down. Only one direction can be needed after a single key change.
    pub fn update(&mut self, locator: &Locator, key: K, value: V) -> Result<(), CollectionError> {
        let index = self.index_of(locator)?;
        let entry = self.heap.get_mut(index).ok_or(CollectionError::InvalidLocator)?;
        entry.key = key;
        entry.value = value;

        if index > 0 && self.heap[index].key < self.heap[parent(index)].key {
            self.upheap(index);
        } else {
            self.downheap(index);
        }
        Ok(())
    }

    /// Entry with the smallest key
    pub fn peek_min(&self) -> Result<(&K, &V), CollectionError> {
        self.entry_at(0)
    }

    /// Bottom-right-most entry of the tree
    ///
    /// This is the last slot in array order, not the maximum key: a min-heap
    /// only orders keys along root-to-leaf paths.
    pub fn peek_last(&self) -> Result<(&K, &V), CollectionError> {
        match self.heap.len() {
            0 => Err(CollectionError::EmptyQueue),
            len => self.entry_at(len - 1),
        }
    }

    /// Current key and value of the entry behind `locator`
    pub fn get(&self, locator: &Locator) -> Result<(&K, &V), CollectionError> {
        let index = self.index_of(locator)?;
        self.entry_at(index)
    }

    pub fn contains(&self, locator: &Locator) -> bool {
        self.index_of(locator).is_ok()
    }

    /// Breadth-first walk of the tree, which is plain array order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.heap.iter().map(|entry| (&entry.key, &entry.value))
    }

    fn index_of(&self, locator: &Locator) -> Result<usize, CollectionError> {
        if locator.queue != self.id {
            return Err(CollectionError::InvalidLocator);
        }
        self.positions
            .get(&locator.ticket)
            .copied()
            .map_err(|_| CollectionError::InvalidLocator)
    }

    fn entry_at(&self, index: usize) -> Result<(&K, &V), CollectionError> {
        self.heap
            .get(index)
            .map(|entry| (&entry.key, &entry.value))
            .ok_or(CollectionError::EmptyQueue)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        for index in [a, b] {
            let ticket = self.heap[index].ticket;
            self.positions.insert(ticket, index);
        }
    }

    fn upheap(&mut self, mut index: usize) {
        while index > 0 {
            let parent = parent(index);
            if self.heap[index].key < self.heap[parent].key {
                self.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn downheap(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            if left >= len {
                return;
            }

            // pick the smaller child, ties go right
            let child = if right < len && self.heap[right].key <= self.heap[left].key {
                right
            } else {
                left
            };

            if self.heap[child].key < self.heap[index].key {
                self.swap(index, child);
                index = child;
            } else {
                return;
            }
        }
    }
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

impl<K: PartialOrd, V> Default for AdaptablePriorityQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    impl<K: PartialOrd, V> AdaptablePriorityQueue<K, V> {
        /// Heap order and index bookkeeping both hold
        fn is_valid(&self) -> bool {
            (1..self.heap.len()).all(|i| self.heap[i].key >= self.heap[parent(i)].key)
                && self.positions.len() == self.heap.len()
                && self.heap.iter().enumerate().all(|(i, entry)| self.positions.get(&entry.ticket) == Ok(&i))
        }
    }

    #[test]
    fn test_remove_min_in_key_order() {
        let mut queue = AdaptablePriorityQueue::new();
        for (key, value) in [(5, 'e'), (1, 'a'), (4, 'd'), (2, 'b'), (3, 'c')] {
            queue.insert(key, value);
        }
        assert_eq!(queue.peek_min(), Ok((&1, &'a')));

        let drained: Vec<_> = std::iter::from_fn(|| queue.remove_min().ok()).collect();
        assert_eq!(drained, vec![(1, 'a'), (2, 'b'), (3, 'c'), (4, 'd'), (5, 'e')]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue_errors() {
        let mut queue: AdaptablePriorityQueue<u32, ()> = AdaptablePriorityQueue::new();
        assert_eq!(queue.remove_min(), Err(CollectionError::EmptyQueue));
        assert_eq!(queue.peek_min(), Err(CollectionError::EmptyQueue));
        assert_eq!(queue.peek_last(), Err(CollectionError::EmptyQueue));
    }

    #[test]
    fn test_single_entry() {
        let mut queue = AdaptablePriorityQueue::new();
        let locator = queue.insert(7.5, "only");
        assert_eq!(queue.peek_min(), queue.peek_last());
        assert_eq!(queue.remove_min(), Ok((7.5, "only")));
        assert!(!queue.contains(&locator));
    }

    #[test]
    fn test_update_decrease_moves_up() {
        let mut queue = AdaptablePriorityQueue::new();
        queue.insert(1, "a");
        queue.insert(2, "b");
        let c = queue.insert(3, "c");
        queue.insert(4, "d");

        queue.update(&c, 0, "c").unwrap();
        assert!(queue.is_valid());
        assert_eq!(queue.peek_min(), Ok((&0, &"c")));
        assert_eq!(queue.get(&c), Ok((&0, &"c")));
    }

    #[test]
    fn test_update_increase_moves_down() {
        let mut queue = AdaptablePriorityQueue::new();
        let a = queue.insert(1, "a");
        for (key, value) in [(2, "b"), (3, "c"), (4, "d"), (5, "e")] {
            queue.insert(key, value);
        }

        queue.update(&a, 10, "a").unwrap();
        assert!(queue.is_valid());
        assert_eq!(queue.peek_min(), Ok((&2, &"b")));

        let drained: Vec<_> = std::iter::from_fn(|| queue.remove_min().ok()).map(|(k, _)| k).collect();
        assert_eq!(drained, vec![2, 3, 4, 5, 10]);
    }

    #[test]
    fn test_update_can_change_value() {
        let mut queue = AdaptablePriorityQueue::new();
        let locator = queue.insert(3, "old");
        queue.update(&locator, 3, "new").unwrap();
        assert_eq!(queue.remove_min(), Ok((3, "new")));
    }

    #[test]
    fn test_stale_locator_rejected() {
        let mut queue = AdaptablePriorityQueue::new();
        let first = queue.insert(1, 'a');
        queue.insert(2, 'b');
        queue.remove_min().unwrap();

        // tickets are never reissued, the old locator must not see the new entry
        let reused = queue.insert(3, 'c');
        assert_eq!(queue.update(&first, 0, 'z'), Err(CollectionError::InvalidLocator));
        assert_eq!(queue.get(&first), Err(CollectionError::InvalidLocator));
        assert_eq!(queue.get(&reused), Ok((&3, &'c')));
    }

    #[test]
    fn test_foreign_locator_rejected() {
        let mut ours = AdaptablePriorityQueue::new();
        let mut theirs = AdaptablePriorityQueue::new();
        ours.insert(1, ());
        let foreign = theirs.insert(1, ());
        assert_eq!(ours.update(&foreign, 0, ()), Err(CollectionError::InvalidLocator));
        assert!(!ours.contains(&foreign));
    }

    #[test]
    fn test_infinite_keys_sort_last() {
        let mut queue = AdaptablePriorityQueue::new();
        let far = queue.insert(f64::INFINITY, "far");
        queue.insert(0.0, "start");
        queue.insert(f64::INFINITY, "other");
        assert_eq!(queue.remove_min(), Ok((0.0, "start")));

        queue.update(&far, 2.0, "far").unwrap();
        assert_eq!(queue.remove_min(), Ok((2.0, "far")));
        assert_eq!(queue.remove_min(), Ok((f64::INFINITY, "other")));
    }

    #[test]
    fn test_iter_is_breadth_first() {
        let mut queue = AdaptablePriorityQueue::new();
        for key in [3, 1, 2] {
            queue.insert(key, key * 10);
        }
        let keys: Vec<_> = queue.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], 1);
    }

    #[test]
    fn test_backing_array_shrinks() {
        let mut queue = AdaptablePriorityQueue::new();
        for key in 0..1000 {
            queue.insert(key, ());
        }
        let grown = queue.heap.capacity();
        while queue.len() > 5 {
            queue.remove_min().unwrap();
        }
        assert!(queue.heap.capacity() < grown);
        assert!(queue.heap.capacity() >= queue.len());
    }

    #[test]
    fn test_drained_queue_releases_entry_storage() {
        let mut queue = AdaptablePriorityQueue::new();
        let locators: Vec<_> = (0..10_000).map(|key| queue.insert(key, key)).collect();
        while queue.len() > 5 {
            queue.remove_min().unwrap();
        }

        assert!(queue.heap.capacity() <= 4 * DEFAULT_CAPACITY);
        assert!(queue.positions.capacity() < 42);
        assert!(queue.is_valid());

        // survivors keep working, drained entries stay invalid
        assert_eq!(queue.get(&locators[9_999]), Ok((&9_999, &9_999)));
        queue.update(&locators[9_997], 0, 0).unwrap();
        assert_eq!(queue.peek_min(), Ok((&0, &0)));
        assert_eq!(queue.get(&locators[0]), Err(CollectionError::InvalidLocator));
    }

    proptest! {
        #[test]
        fn test_random_permutation_sorted(mut keys in prop::collection::vec(any::<i32>(), 0..300)) {
            let mut queue = AdaptablePriorityQueue::new();
            for &key in &keys {
                queue.insert(key, ());
                prop_assert!(queue.is_valid());
            }

            let mut drained = Vec::with_capacity(keys.len());
            while let Ok((key, ())) = queue.remove_min() {
                prop_assert!(queue.is_valid());
                drained.push(key);
            }
            keys.sort();
            prop_assert_eq!(drained, keys);
        }

        #[test]
        fn test_updates_keep_heap_order(
            keys in prop::collection::vec(0u32..1000, 1..100),
            updates in prop::collection::vec((any::<prop::sample::Index>(), 0u32..1000), 0..100),
        ) {
            let mut queue = AdaptablePriorityQueue::new();
            let locators: Vec<_> = keys.iter().map(|&k| queue.insert(k, k)).collect();

            for (which, key) in updates {
                let locator = locators[which.index(locators.len())];
                queue.update(&locator, key, key).unwrap();
                prop_assert!(queue.is_valid());
                prop_assert_eq!(queue.get(&locator), Ok((&key, &key)));
            }

            let mut previous = 0;
            while let Ok((key, value)) = queue.remove_min() {
                prop_assert_eq!(key, value);
                prop_assert!(key >= previous);
                previous = key;
            }
        }
    }
}
