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

use mailbox_interface::{LinkBuffer, MailboxError, Word};

/// Single word holding register used by the thin endpoint in place of a
/// queue: a second push before the first is taken fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Latch {
    word: Option<Word>,
}
impl Latch {
    pub const fn new() -> Self { Self { word: None } }
}
impl LinkBuffer for Latch {
    fn try_push(&mut self, word: Word) -> Result<(), MailboxError> {
        if self.word.is_some() {
            return Err(MailboxError::QueueFull);
        }
        self.word = Some(word);
        Ok(())
    }
    fn try_pop(&mut self) -> Result<Word, MailboxError> {
        self.word.take().ok_or(MailboxError::QueueEmpty)
    }
    fn peek(&self) -> Option<Word> { self.word }
    fn occupancy(&self) -> usize { self.word.is_some() as usize }
    fn capacity(&self) -> usize { 1 }
    fn clear(&mut self) { self.word = None; }
}
