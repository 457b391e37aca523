use nalgebra as na;
use std::collections::VecDeque;
use std::fmt;

/// Anchor history of one track, oldest first.
///
/// With a capacity the oldest anchor is dropped once the buffer is full;
/// without one it grows for as long as the track lives.
pub struct History {
    deque: VecDeque<na::Point2<f32>>,
    capacity: Option<usize>,
}

impl Clone for History {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
            capacity: self.capacity,
        }
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl History {
    #[inline]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            deque: VecDeque::with_capacity(capacity.unwrap_or(16)),
            capacity,
        }
    }

    /// Appends an anchor, returning the one evicted to make room, if any.
    #[inline]
    pub fn push(&mut self, anchor: na::Point2<f32>) -> Option<na::Point2<f32>> {
        let evicted = if self.is_full() {
            self.deque.pop_front()
        } else {
            None
        };

        self.deque.push_back(anchor);

        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self.capacity, Some(cap) if self.deque.len() >= cap)
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    #[inline]
    pub fn last(&self) -> Option<na::Point2<f32>> {
        self.deque.back().copied()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ na::Point2<f32>> {
        self.deque.iter()
    }
}
