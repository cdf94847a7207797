//! Reordering buffer for records decided out of order.
//!
//! Items are inserted with the sequence number of the input record they came from and
//! are released strictly in sequence order. The pairing coordinator uses this to hold
//! back later records while the first mate of a pair waits for its partner.
//!
//! # Example
//!
//! ```
//! use samfilter_lib::reorder_buffer::ReorderBuffer;
//!
//! let mut buffer: ReorderBuffer<String> = ReorderBuffer::new();
//!
//! // Insert items out of order
//! buffer.insert(2, "third".to_string());
//! buffer.insert(0, "first".to_string());
//! assert_eq!(buffer.try_pop_next(), Some("first".to_string()));
//! assert_eq!(buffer.try_pop_next(), None); // 1 is still missing
//!
//! buffer.insert(1, "second".to_string());
//! assert_eq!(buffer.try_pop_next(), Some("second".to_string()));
//! assert_eq!(buffer.try_pop_next(), Some("third".to_string()));
//! assert!(buffer.is_empty());
//! ```

use std::collections::VecDeque;

/// A buffer that releases items in sequential order.
///
/// Uses a sparse `VecDeque` indexed by `seq - base_seq`, so insert and pop are O(1).
/// Memory grows with the distance between the oldest unreleased sequence number and the
/// newest inserted one.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    buffer: VecDeque<Option<T>>,
    /// Sequence number of `buffer[0]`; also the next number to be released.
    base_seq: u64,
    /// Number of occupied slots.
    count: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: VecDeque::new(), base_seq: 0, count: 0 }
    }

    /// Inserts an item at its sequence number.
    ///
    /// Sequence numbers must be unique and not already released.
    #[allow(clippy::cast_possible_truncation)]
    pub fn insert(&mut self, seq: u64, item: T) {
        debug_assert!(
            seq >= self.base_seq,
            "Sequence number {seq} is before base {}",
            self.base_seq
        );

        let index = (seq - self.base_seq) as usize;
        if self.buffer.len() <= index {
            self.buffer.resize_with(index + 1, || None);
        }

        debug_assert!(self.buffer[index].is_none(), "Duplicate sequence number: {seq}");
        self.buffer[index] = Some(item);
        self.count += 1;
    }

    /// Pops the next item in sequence, or `None` if it has not been inserted yet.
    #[must_use]
    pub fn try_pop_next(&mut self) -> Option<T> {
        let item = self.buffer.front_mut()?.take()?;
        self.buffer.pop_front();
        self.base_seq += 1;
        self.count -= 1;
        Some(item)
    }

    /// Iterates over items as long as the next one in sequence is present.
    pub fn drain_ready(&mut self) -> DrainReady<'_, T> {
        DrainReady { buffer: self }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of items held, not counting gaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// The sequence number that will be released next.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.base_seq
    }

    /// True if [`try_pop_next`](Self::try_pop_next) would return an item.
    #[must_use]
    pub fn can_pop(&self) -> bool {
        self.buffer.front().is_some_and(Option::is_some)
    }
}

/// Iterator returned by [`ReorderBuffer::drain_ready`].
pub struct DrainReady<'a, T> {
    buffer: &'a mut ReorderBuffer<T>,
}

impl<T> Iterator for DrainReady<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.buffer.try_pop_next()
    }
}
