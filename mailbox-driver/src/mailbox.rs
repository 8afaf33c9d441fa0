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

//! Full endpoint: bounded FIFOs in both directions plus a co-located thin
//! endpoint reachable through LOOPBACK for self-test.

use crate::client::MailboxClient;
use crate::endpoint::{register, Endpoint};
use crate::registers::{self, MailboxStatus, MAX_CAPACITY};
use core::ops::{Deref, DerefMut};
use log::trace;
use mailbox_interface::*;
use word_fifo::{WordFifo, DEFAULT_CAPACITY};

pub struct Mailbox<const N: usize = DEFAULT_CAPACITY> {
    endpoint: Endpoint<WordFifo<N>>,
    loopback: bool,
    client: MailboxClient,
    // What the co-located client published on its last step.
    client_outputs: LinkSignals,
}

impl<const N: usize> Mailbox<N> {
    const CAPACITY_FITS: () = assert!(N <= MAX_CAPACITY, "capacity overflows STATUS word counts");

    pub const fn new() -> Self {
        let () = Self::CAPACITY_FITS;
        Self {
            endpoint: Endpoint::new(WordFifo::new(), WordFifo::new()),
            loopback: false,
            client: MailboxClient::new(),
            client_outputs: LinkSignals {
                data: 0,
                valid: false,
                ready: false,
                done: false,
                abort: false,
            },
        }
    }

    /// Full reset, including the LOOPBACK setting.
    pub fn reset(&mut self) {
        self.endpoint.reset();
        self.loopback = false;
        self.client.reset();
        self.client_outputs = LinkSignals::default();
    }

    pub fn loopback(&self) -> bool { self.loopback }

    /// Switches between the external wires and the co-located client.
    /// Changing the setting resets both endpoints so no half-transferred
    /// word or abort crosses over.
    pub fn set_loopback(&mut self, enable: bool) {
        if enable == self.loopback {
            return;
        }
        trace!("loopback {}", if enable { "on" } else { "off" });
        self.reset();
        self.loopback = enable;
    }

    /// The co-located thin endpoint; only connected while loopback is on.
    pub fn loopback_client(&mut self) -> &mut MailboxClient { &mut self.client }

    /// Advances one clock. While loopback is on the peer is the co-located
    /// client and the external wires see an idle endpoint.
    pub(crate) fn step(&mut self, remote: &LinkSignals) -> LinkSignals {
        if !self.loopback {
            return self.endpoint.step(remote);
        }
        let outputs = self.endpoint.step(&self.client_outputs);
        self.client_outputs = self.client.step(&outputs);
        LinkSignals::default()
    }

    /// STATUS value; clears tx_err and rx_err.
    pub fn status_register(&mut self) -> u32 {
        let status = self.endpoint.read_and_clear_errors();
        registers::to_u32(
            MailboxStatus::new()
                .with_rx_words(status.rx_words as u16)
                .with_tx_words(status.tx_words as u16)
                .with_abort_in_progress(status.abort_in_progress)
                .with_abort_ack(status.abort_ack)
                .with_tx_err(status.tx_err)
                .with_rx_err(status.rx_err)
                .into_bytes(),
        )
    }
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> Deref for Mailbox<N> {
    type Target = Endpoint<WordFifo<N>>;
    fn deref(&self) -> &Self::Target { &self.endpoint }
}
impl<const N: usize> DerefMut for Mailbox<N> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.endpoint }
}

impl<const N: usize> MailboxInterface for Mailbox<N> {
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
            Register::Loopback => Ok(registers::to_u32(
                registers::Loopback::new()
                    .with_enable(self.loopback)
                    .into_bytes(),
            )),
            reg => self.endpoint.read_common(reg),
        }?;
        trace!("read {:#X} -> {:#X}", offset, value);
        Ok(value)
    }

    fn write_register(&mut self, offset: u32, value: u32) -> Result<(), MailboxError> {
        trace!("write {:#X} <- {:#X}", offset, value);
        match register(offset)? {
            Register::Loopback => {
                self.set_loopback(
                    registers::Loopback::from_bytes(registers::from_u32(value)).enable(),
                );
                Ok(())
            }
            reg => self.endpoint.write_common(reg, value),
        }
    }
}
