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

// Layouts of the mailbox registers.

use modular_bitfield::prelude::*;
use static_assertions::{assert_eq_size, const_assert};

pub const CONTROL_ABORT_BIT: u32 = 0;
pub const DONE_DONE_BIT: u32 = 0;
pub const LOOPBACK_ENABLE_BIT: u32 = 0;

// Word counts are ceil(log2(capacity)) + 1 bits wide.
pub const STATUS_WORDS_BITS: u32 = 11;
pub const STATUS_WORDS_MASK: u32 = (1 << STATUS_WORDS_BITS) - 1;
pub const STATUS_RX_WORDS_OFFSET: u32 = 0;
pub const STATUS_TX_WORDS_OFFSET: u32 = 11;
pub const STATUS_ABORT_IN_PROGRESS_BIT: u32 = 22;
pub const STATUS_ABORT_ACK_BIT: u32 = 23;
pub const STATUS_TX_ERR_BIT: u32 = 24;
pub const STATUS_RX_ERR_BIT: u32 = 25;

pub const CLIENT_STATUS_RX_AVAIL_BIT: u32 = 0;
pub const CLIENT_STATUS_TX_FREE_BIT: u32 = 1;
pub const CLIENT_STATUS_ABORT_IN_PROGRESS_BIT: u32 = 2;
pub const CLIENT_STATUS_ABORT_ACK_BIT: u32 = 3;
pub const CLIENT_STATUS_TX_ERR_BIT: u32 = 4;
pub const CLIENT_STATUS_RX_ERR_BIT: u32 = 5;

/// Largest queue whose occupancy fits the STATUS word counts.
pub const MAX_CAPACITY: usize = 1 << (STATUS_WORDS_BITS - 1);
const_assert!(MAX_CAPACITY as u32 <= STATUS_WORDS_MASK);

/// Write-1-to-pulse; raises the local abort request for one step.
#[bitfield]
pub struct Control {
    pub abort: bool,
    #[skip]
    __: B31,
}

/// Write-1-to-pulse end-of-packet.
#[bitfield]
pub struct Done {
    pub done: bool,
    #[skip]
    __: B31,
}

/// Full endpoint STATUS. Reading it clears tx_err and rx_err.
#[bitfield]
pub struct MailboxStatus {
    pub rx_words: B11,
    pub tx_words: B11,
    pub abort_in_progress: bool,
    pub abort_ack: bool,
    pub tx_err: bool,
    pub rx_err: bool,
    #[skip]
    __: B6,
}

/// Thin endpoint STATUS; latch flags replace the word counts.
#[bitfield]
pub struct ClientStatus {
    pub rx_avail: bool,
    pub tx_free: bool,
    pub abort_in_progress: bool,
    pub abort_ack: bool,
    pub tx_err: bool,
    pub rx_err: bool,
    #[skip]
    __: B26,
}

/// Routes the full endpoint to its co-located client.
#[bitfield]
pub struct Loopback {
    pub enable: bool,
    #[skip]
    __: B31,
}

assert_eq_size!(Control, u32);
assert_eq_size!(Done, u32);
assert_eq_size!(MailboxStatus, u32);
assert_eq_size!(ClientStatus, u32);
assert_eq_size!(Loopback, u32);

// Bitfields are laid out LSB first in little-endian byte order.
pub fn to_u32(bytes: [u8; 4]) -> u32 { u32::from_le_bytes(bytes) }
pub fn from_u32(value: u32) -> [u8; 4] { value.to_le_bytes() }
