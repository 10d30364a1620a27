//! Min-priority queue backing the shortest-path search.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Binary-heap queue that pops the element with the lowest priority first.
///
/// Elements sharing a priority leave the queue in insertion order so that
/// searches expand cells deterministically.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    sequence: u64,
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            sequence: 0,
        }
    }

    /// Inserts an element with the provided priority.
    pub fn enqueue(&mut self, element: T, priority: u32) {
        let entry = Entry {
            priority,
            sequence: self.sequence,
            element,
        };
        self.sequence = self.sequence.wrapping_add(1);
        self.heap.push(Reverse(entry));
    }

    /// Removes the element with the lowest priority.
    pub fn dequeue(&mut self) -> Option<T> {
        self.heap.pop().map(|Reverse(entry)| entry.element)
    }

    /// Number of queued elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Reports whether the queue holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Entry<T> {
    priority: u32,
    sequence: u64,
    element: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}
