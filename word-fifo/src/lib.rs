// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A u32 word queue with a beginning and ending that wrap around a fixed
//! size array.
//!
//! This is a FIFO queue that rejects pushes when full and pops when empty.
//! The head word is visible through `peek` before it is popped.

#![cfg_attr(not(test), no_std)]

use mailbox_interface::{LinkBuffer, MailboxError, Word};

/// Default queue depth of the full mailbox endpoint.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, PartialEq)]
pub struct WordFifo<const N: usize = DEFAULT_CAPACITY> {
    begin: usize,
    end: usize,
    size: usize,
    data: [Word; N],
}

impl<const N: usize> WordFifo<N> {
    const NONZERO: () = assert!(N > 0, "WordFifo capacity must be non-zero");

    pub const fn new() -> Self {
        let () = Self::NONZERO;
        Self {
            begin: 0,
            end: 0,
            size: 0,
            data: [0; N],
        }
    }

    /// Resets the queue.
    ///
    /// This does not modify the data.
    pub fn clear(&mut self) {
        self.begin = 0;
        self.end = 0;
        self.size = 0;
    }

    pub fn is_empty(&self) -> bool { self.size == 0 }

    pub fn is_full(&self) -> bool { self.size == N }

    pub fn len(&self) -> usize { self.size }

    /// Returns the number of free slots.
    pub fn available_data(&self) -> usize { N - self.size }

    /// Adds a word at the tail.
    ///
    /// A full queue is left untouched and the word is dropped.
    pub fn push(&mut self, word: Word) -> Result<(), MailboxError> {
        if self.is_full() {
            return Err(MailboxError::QueueFull);
        }
        self.data[self.end] = word;
        self.end = Self::advance(self.end);
        self.size += 1;
        Ok(())
    }

    /// Removes the word at the head.
    pub fn pop(&mut self) -> Result<Word, MailboxError> {
        if self.is_empty() {
            return Err(MailboxError::QueueEmpty);
        }
        let result = self.data[self.begin];
        self.begin = Self::advance(self.begin);
        self.size -= 1;
        Ok(result)
    }

    pub fn front(&self) -> Option<Word> {
        if self.is_empty() {
            None
        } else {
            Some(self.data[self.begin])
        }
    }

    /// Iterates head to tail without consuming.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = Word> + '_ {
        (0..self.size).map(move |i| self.data[(self.begin + i) % N])
    }

    /// Increments the begin or end marker and wraps around if necessary.
    fn advance(position: usize) -> usize { (position + 1) % N }
}

impl<const N: usize> Default for WordFifo<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> LinkBuffer for WordFifo<N> {
    fn try_push(&mut self, word: Word) -> Result<(), MailboxError> { self.push(word) }
    fn try_pop(&mut self) -> Result<Word, MailboxError> { self.pop() }
    fn peek(&self) -> Option<Word> { self.front() }
    fn occupancy(&self) -> usize { self.len() }
    fn capacity(&self) -> usize { N }
    fn available(&self) -> usize { self.available_data() }
    fn clear(&mut self) { WordFifo::<N>::clear(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CAPACITY: usize = 16;

    /// Pop will return pushed value.
    #[test]
    fn push_pop() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        assert!(fifo.push(0xDEADBEEF).is_ok());
        assert_eq!(Ok(0xDEADBEEF), fifo.pop());
    }

    /// Popping an empty queue fails without disturbing later pushes.
    #[test]
    fn pop_empty() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        assert_eq!(Err(MailboxError::QueueEmpty), fifo.pop());
        assert!(fifo.push(1).is_ok());
        assert_eq!(Ok(1), fifo.pop());
        assert_eq!(Err(MailboxError::QueueEmpty), fifo.pop());
    }

    /// Words come out in the order they went in.
    #[test]
    fn pop_fifo() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        for word in 0..TEST_CAPACITY as u32 {
            assert!(fifo.push(word * 3).is_ok());
        }
        for word in 0..TEST_CAPACITY as u32 {
            assert_eq!(Ok(word * 3), fifo.pop());
        }
    }

    /// Pushing to a full queue drops the word and keeps what is there.
    #[test]
    fn push_full() {
        let mut fifo = WordFifo::<4>::new();
        for word in [0x1, 0x2, 0x3, 0x4] {
            assert!(fifo.push(word).is_ok());
        }
        assert!(fifo.is_full());
        assert_eq!(Err(MailboxError::QueueFull), fifo.push(0x5));
        assert!(fifo.iter().eq([0x1, 0x2, 0x3, 0x4]));
        assert_eq!(Ok(0x1), fifo.pop());
        assert_eq!(3, fifo.len());
        assert!(!fifo.is_full());
    }

    /// The head is visible before it is popped.
    #[test]
    fn fall_through() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        assert_eq!(None, fifo.front());
        assert!(fifo.push(7).is_ok());
        assert!(fifo.push(8).is_ok());
        assert_eq!(Some(7), fifo.front());
        assert_eq!(2, fifo.len());
        assert_eq!(Ok(7), fifo.pop());
        assert_eq!(Some(8), fifo.front());
    }

    /// Check that push and pop over capacity will wrap and not break.
    #[test]
    fn begin_wrap() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        for i in 0..(TEST_CAPACITY * 3) as u32 {
            assert!(fifo.push(i).is_ok());
            assert_eq!(Ok(i), fifo.pop());
        }
        assert!(fifo.is_empty());
    }

    /// A wrapped, partially full queue still iterates head to tail.
    #[test]
    fn iter_wrapped() {
        let mut fifo = WordFifo::<4>::new();
        for word in 0..3 {
            assert!(fifo.push(word).is_ok());
        }
        assert_eq!(Ok(0), fifo.pop());
        assert_eq!(Ok(1), fifo.pop());
        for word in 3..6 {
            assert!(fifo.push(word).is_ok());
        }
        assert!(fifo.iter().eq([2, 3, 4, 5]));
    }

    #[test]
    fn clear_empties() {
        let mut fifo = WordFifo::<TEST_CAPACITY>::new();
        for word in 0..5 {
            assert!(fifo.push(word).is_ok());
        }
        fifo.clear();
        assert!(fifo.is_empty());
        assert_eq!(TEST_CAPACITY, fifo.available_data());
        assert_eq!(Err(MailboxError::QueueEmpty), fifo.pop());
    }

    #[test]
    fn link_buffer() {
        let mut fifo = WordFifo::<2>::new();
        assert!(fifo.is_writable());
        assert!(!fifo.is_readable());
        assert!(fifo.try_push(1).is_ok());
        assert!(fifo.try_push(2).is_ok());
        assert!(!fifo.is_writable());
        assert_eq!(2, fifo.occupancy());
        assert_eq!(2, LinkBuffer::capacity(&fifo));
        assert_eq!(0, fifo.available());
        assert_eq!(Some(1), fifo.peek());
        assert_eq!(Ok(1), fifo.try_pop());
        assert_eq!(1, fifo.available());
    }
}
