//! Fixed-capacity rolling history
//!
//! [`RollingBuffer`] keeps the most recent `capacity` items in insertion
//! order. Storage grows on demand until it reaches capacity, after which a
//! write cursor walks the slots modulo capacity and each push overwrites
//! (and returns) the oldest item. Memory is bounded for the buffer's
//! lifetime.

use core::num::NonZeroUsize;

/// Ring buffer of the most recent items, oldest first.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    /// Backing slots, at most `capacity` long.
    slots: Vec<T>,
    /// Index of the oldest item once the buffer is full.
    head: usize,
    capacity: NonZeroUsize,
}

impl<T> RollingBuffer<T> {
    /// Create an empty buffer. Nothing is allocated until the first push.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Vec::new(),
            head: 0,
            capacity,
        }
    }

    /// Append an item, returning the evicted oldest item when full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.slots.len() < self.capacity.get() {
            self.slots.push(item);
            return None;
        }

        let evicted = core::mem::replace(&mut self.slots[self.head], item);
        self.head = (self.head + 1) % self.capacity.get();
        Some(evicted)
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Most recently pushed item.
    pub fn latest(&self) -> Option<&T> {
        if self.head == 0 {
            self.slots.last()
        } else {
            self.slots.get(self.head - 1)
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<T: Clone> RollingBuffer<T> {
    /// Copy the contents out, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(capacity: usize) -> RollingBuffer<u32> {
        RollingBuffer::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_empty_buffer() {
        let b = buffer(4);
        assert!(b.is_empty());
        assert_eq!(b.latest(), None);
        assert_eq!(b.to_vec(), Vec::<u32>::new());
    }

    #[test]
    fn test_push_below_capacity_keeps_order() {
        let mut b = buffer(4);
        for i in 1..=3 {
            assert_eq!(b.push(i), None);
        }
        assert_eq!(b.to_vec(), vec![1, 2, 3]);
        assert_eq!(b.latest(), Some(&3));
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn test_push_past_capacity_evicts_oldest() {
        let mut b = buffer(3);
        let evicted: Vec<_> = (1..=5).filter_map(|i| b.push(i)).collect();

        assert_eq!(evicted, vec![1, 2]);
        assert_eq!(b.to_vec(), vec![3, 4, 5]);
        assert_eq!(b.len(), 3);
        assert_eq!(b.latest(), Some(&5));
        assert_eq!(b.iter().next(), Some(&3));
    }

    #[test]
    fn test_cursor_wraps_cleanly() {
        let mut b = buffer(3);
        for i in 1..=6 {
            b.push(i);
        }
        // Cursor is back at slot 0 after two full laps
        assert_eq!(b.to_vec(), vec![4, 5, 6]);
        assert_eq!(b.latest(), Some(&6));
        assert_eq!(b.iter().rev().copied().collect::<Vec<_>>(), vec![6, 5, 4]);
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let mut b = buffer(usize::MAX);
        assert!(b.is_empty());
        for i in 0..4 {
            assert_eq!(b.push(i), None);
        }
        assert_eq!(b.to_vec(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_capacity_one() {
        let mut b = buffer(1);
        assert_eq!(b.push(10), None);
        assert_eq!(b.push(11), Some(10));
        assert_eq!(b.to_vec(), vec![11]);
        assert_eq!(b.latest(), Some(&11));
    }
}
