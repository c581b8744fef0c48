//! Min-heap entry keyed by latency.

use std::cmp::Ordering;
use std::time::Duration;

/// Wraps an element with the latency it was filed under.
///
/// `BinaryHeap` is a max-heap, so the ordering is reversed: the entry with
/// the smallest latency compares greatest and is popped first. Ties compare
/// equal and are broken by heap order.
#[derive(Debug, Clone)]
pub struct MinHeapItem<T> {
    pub latency: Duration,
    pub element: T,
}

impl<T> MinHeapItem<T> {
    pub fn new(latency: Duration, element: T) -> Self {
        Self { latency, element }
    }
}

impl<T> Ord for MinHeapItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.latency.cmp(&self.latency)
    }
}

impl<T> PartialOrd for MinHeapItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Eq for MinHeapItem<T> {}

impl<T> PartialEq for MinHeapItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.latency == other.latency
    }
}
