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

//! A full endpoint wired to a thin endpoint.
//!
//! The link is the clock: each `step` advances the mailbox first, against
//! what the client published on the previous step, then the client against
//! what the mailbox just published. Both sides live behind their own
//! `spin::Mutex` so software (or an interrupt handler) on either processor
//! can poke its endpoint between steps.

use crate::client::MailboxClient;
use crate::mailbox::Mailbox;
use mailbox_interface::LinkSignals;
use spin::{Mutex, MutexGuard};
use word_fifo::DEFAULT_CAPACITY;

/// Last values driven by each side.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Wires {
    pub mailbox: LinkSignals,
    pub client: LinkSignals,
}

const IDLE: LinkSignals = LinkSignals {
    data: 0,
    valid: false,
    ready: false,
    done: false,
    abort: false,
};

pub struct Link<const N: usize = DEFAULT_CAPACITY> {
    mailbox: Mutex<Mailbox<N>>,
    client: Mutex<MailboxClient>,
    wires: Mutex<Wires>,
}

impl<const N: usize> Link<N> {
    pub const fn new() -> Self {
        Self {
            mailbox: Mutex::new(Mailbox::new()),
            client: Mutex::new(MailboxClient::new()),
            wires: Mutex::new(Wires {
                mailbox: IDLE,
                client: IDLE,
            }),
        }
    }

    /// Do not hold the guard across `step`.
    pub fn mailbox(&self) -> MutexGuard<'_, Mailbox<N>> { self.mailbox.lock() }

    /// Do not hold the guard across `step`.
    pub fn client(&self) -> MutexGuard<'_, MailboxClient> { self.client.lock() }

    pub fn wires(&self) -> Wires { *self.wires.lock() }

    pub fn step(&self) -> Wires {
        let mut wires = self.wires.lock();
        let mailbox = self.mailbox.lock().step(&wires.client);
        let client = self.client.lock().step(&mailbox);
        *wires = Wires { mailbox, client };
        *wires
    }

    pub fn run(&self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn reset(&self) {
        let mut wires = self.wires.lock();
        self.mailbox.lock().reset();
        self.client.lock().reset();
        *wires = Wires::default();
    }
}

impl<const N: usize> Default for Link<N> {
    fn default() -> Self { Self::new() }
}
