use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry. Ties in distance are ordered by arrival, so among equal
/// distances the latest arrival sits on top of the max-heap and is evicted first.
#[derive(Debug)]
struct Entry<T> {
    dist: OrderedFloat<f64>,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: larger distance = higher priority
        self.dist
            .cmp(&other.dist)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Keeps the `k` smallest-distance items seen so far.
///
/// Once full, a new item is admitted only if its distance is strictly smaller
/// than the current maximum, which it then evicts. Draining yields ascending
/// distance with ties in encounter order.
#[derive(Debug)]
pub struct BoundedPriorityQueue<T> {
    capacity: usize,
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> BoundedPriorityQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
            next_seq: 0,
        }
    }

    /// Offer an item. Returns whether it was retained.
    pub fn push(&mut self, distance: f64, item: T) -> bool {
        if self.capacity == 0 {
            return false;
        }
        let entry = Entry {
            dist: OrderedFloat(distance),
            seq: self.next_seq,
            item,
        };
        self.next_seq += 1;

        if self.heap.len() < self.capacity {
            self.heap.push(entry);
            return true;
        }

        match self.heap.peek() {
            Some(top) if entry.dist < top.dist => {
                self.heap.pop();
                self.heap.push(entry);
                true
            }
            _ => false,
        }
    }

    /// Largest retained distance
    #[inline]
    pub fn max_distance(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.dist.0)
    }

    /// Smallest retained distance
    pub fn min_distance(&self) -> Option<f64> {
        self.heap.iter().map(|e| e.dist).min().map(|d| d.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.heap.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drain into `(distance, item)` pairs, ascending by distance.
    pub fn into_sorted_vec(self) -> Vec<(f64, T)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.dist.0, e.item))
            .collect()
    }
}
