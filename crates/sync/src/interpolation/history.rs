//! Growable ring buffer addressed by offset from either end.
//!
//! ```text
//!   slots: [_, _, a, b, c, _]    head = 2, len = 3
//!   get(0)       => a   (oldest)
//!   peek_back(0) => c   (newest)
//! ```
//!
//! Pushing into a full ring doubles its capacity; the old end is removed in
//! bulk with `remove_front`.

use std::iter::FusedIterator;

pub const DEFAULT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HistoryBuffer<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_back(&mut self, value: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let index = self.slot(self.len);
        self.slots[index] = Some(value);
        self.len += 1;
    }

    /// Entry `index` places from the oldest end.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    /// Entry `offset` places from the newest end.
    pub fn peek_back(&self, offset: usize) -> Option<&T> {
        if offset >= self.len {
            return None;
        }
        self.get(self.len - 1 - offset)
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.peek_back(0)
    }

    /// Drops up to `count` of the oldest entries, returning how many went.
    pub fn remove_front(&mut self, count: usize) -> usize {
        let count = count.min(self.len);
        for i in 0..count {
            let index = self.slot(i);
            self.slots[index] = None;
        }

        self.head = self.slot(count);
        self.len -= count;
        if self.len == 0 {
            self.head = 0;
        }
        count
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buffer: self,
            front: 0,
            back: self.len,
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> usize {
        (self.head + index) % self.slots.len()
    }

    fn grow(&mut self) {
        let capacity = self.slots.len() * 2;
        let mut slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        for (i, target) in slots.iter_mut().enumerate().take(self.len) {
            let index = self.slot(i);
            *target = self.slots[index].take();
        }
        self.slots = slots;
        self.head = 0;
    }
}

impl<'a, T> IntoIterator for &'a HistoryBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Oldest-to-newest iterator over a [`HistoryBuffer`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    buffer: &'a HistoryBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.buffer.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.buffer.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
