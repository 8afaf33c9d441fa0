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

//! Thin endpoint. Each direction is a single latch and flow control is left
//! to the full endpoint on the other side.

use crate::endpoint::{register, Endpoint};
use crate::latch::Latch;
use crate::registers::{self, ClientStatus};
use core::ops::{Deref, DerefMut};
use log::trace;
use mailbox_interface::*;

pub struct MailboxClient {
    endpoint: Endpoint<Latch>,
}

impl MailboxClient {
    pub const fn new() -> Self {
        Self {
            endpoint: Endpoint::new(Latch::new(), Latch::new()),
        }
    }

    /// STATUS value; clears tx_err and rx_err.
    pub fn status_register(&mut self) -> u32 {
        let rx_avail = self.endpoint.readable();
        let tx_free = self.endpoint.writable();
        let status = self.endpoint.read_and_clear_errors();
        registers::to_u32(
            ClientStatus::new()
                .with_rx_avail(rx_avail)
                .with_tx_free(tx_free)
                .with_abort_in_progress(status.abort_in_progress)
                .with_abort_ack(status.abort_ack)
                .with_tx_err(status.tx_err)
                .with_rx_err(status.rx_err)
                .into_bytes(),
        )
    }
}

impl Default for MailboxClient {
    fn default() -> Self { Self::new() }
}

impl Deref for MailboxClient {
    type Target = Endpoint<Latch>;
    fn deref(&self) -> &Self::Target { &self.endpoint }
}
impl DerefMut for MailboxClient {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.endpoint }
}

impl MailboxInterface for MailboxClient {
    fn write(&mut self, word: Word) -> Result<(), MailboxError> { self.endpoint.write(word) }
    fn read(&mut self) -> Result<Word, MailboxError> { self.endpoint.read() }
    fn consume(&mut self) -> Result<Word, MailboxError> { self.endpoint.consume() }
    fn mark_done(&mut self) { self.endpoint.mark_done(); }
    fn abort(&mut self) { self.endpoint.abort(); }
    fn ready_for_remote(&self) -> bool { self.endpoint.ready_for_remote() }
    fn read_status(&mut self) -> u32 { self.status_register() }

    fn read_register(&mut self, offset: u32) -> Result<u32, MailboxError> {
        let value = match register(offset)? {
            Register::Status => Ok(self.status_register()),
            reg => self.endpoint.read_common(reg),
        }?;
        trace!("client read {:#X} -> {:#X}", offset, value);
        Ok(value)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<(), MailboxError> {
        trace!("client write {:#X} <- {:#X}", offset, value);
        self.endpoint.write_common(register(offset)?, value)
    }
}
