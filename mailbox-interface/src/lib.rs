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

//! Types shared by both ends of the inter-processor mailbox.

#![cfg_attr(not(test), no_std)]

use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// The unit of transfer; never interpreted by the channel.
pub type Word = u32;

/// Return codes from mailbox operations.
#[repr(usize)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum MailboxError {
    Success = 0,
    SerializeFailed,
    DeserializeFailed,
    #[default]
    UnknownError,
    // Data path errors; these also latch the sticky tx_err/rx_err bits.
    QueueFull,
    QueueEmpty,
    // Writes are rejected while an abort is being negotiated.
    AbortInProgress,
    // Register access errors.
    BadRegister,
    ReadOnly,
    WriteOnly,
}
impl From<MailboxError> for Result<(), MailboxError> {
    fn from(err: MailboxError) -> Result<(), MailboxError> {
        if err == MailboxError::Success {
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Values one endpoint drives onto the wires for a single step. The peer
/// samples them as its inputs on its next step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LinkSignals {
    /// Outbound word; only meaningful when `valid` is set.
    pub data: Word,
    /// A word is offered (and handed over) this step.
    pub valid: bool,
    /// There is room for one more inbound word.
    pub ready: bool,
    /// End-of-packet pulse.
    pub done: bool,
    /// This side's abort line (`w_abort`).
    pub abort: bool,
}

/// Local buffering behind an endpoint: a bounded queue on the full
/// endpoint, a single-slot latch on the thin one.
pub trait LinkBuffer {
    /// Appends `word`, or fails with `QueueFull` and drops it.
    fn try_push(&mut self, word: Word) -> Result<(), MailboxError>;
    /// Removes the head, or fails with `QueueEmpty`.
    fn try_pop(&mut self) -> Result<Word, MailboxError>;
    /// Head word without removing it (first-word-fall-through).
    fn peek(&self) -> Option<Word>;
    fn occupancy(&self) -> usize;
    fn capacity(&self) -> usize;
    /// Drops everything buffered.
    fn clear(&mut self);

    /// Free slots.
    fn available(&self) -> usize { self.capacity() - self.occupancy() }
    fn is_writable(&self) -> bool { self.occupancy() < self.capacity() }
    fn is_readable(&self) -> bool { self.occupancy() > 0 }
}

/// Byte offsets of the software-visible registers.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum Register {
    Wdata = 0x00,
    Rdata = 0x04,
    Done = 0x08,
    Control = 0x0C,
    Status = 0x10,
    EvStatus = 0x14,
    EvPending = 0x18,
    EvEnable = 0x1C,
    // Full endpoint only.
    Loopback = 0x20,
}

bitflags::bitflags! {
    /// Interrupt sources, laid out as in the EV_* registers.
    pub struct IrqSource: u32 {
        const AVAILABLE  = 0b0001;
        const ABORT_INIT = 0b0010;
        const ABORT_DONE = 0b0100;
        const ERROR      = 0b1000;
    }
}

/// Word-level operations common to both endpoint flavors.
pub trait MailboxInterface {
    fn write(&mut self, word: Word) -> Result<(), MailboxError>;
    fn read(&mut self) -> Result<Word, MailboxError>;
    fn consume(&mut self) -> Result<Word, MailboxError>;
    fn mark_done(&mut self);
    fn abort(&mut self);
    fn ready_for_remote(&self) -> bool;
    /// Returns the raw STATUS register and clears tx_err/rx_err.
    fn read_status(&mut self) -> u32;
    fn read_register(&mut self, offset: u32) -> Result<u32, MailboxError>;
    fn write_register(&mut self, offset: u32, value: u32) -> Result<(), MailboxError>;
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum MailboxRequest {
    Write(Word),
    Read, // -> ReadResponse
    Done,
    Abort,
    Status,           // -> StatusResponse
    ReadRegister(u32), // -> RegisterResponse
    WriteRegister(u32, u32),
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub word: Word,
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: u32,
}

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub value: u32,
}

pub const MAILBOX_REQUEST_DATA_SIZE: usize = 24;
