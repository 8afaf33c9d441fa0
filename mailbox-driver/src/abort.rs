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

//! Abort handshake.
//!
//! Either side may ask to abort at any time. The requester parks in `Req`
//! with its abort line raised until the peer answers; a peer that sees the
//! line without having asked itself parks in `Ack` until its software
//! answers with its own abort, which it signals for exactly one step. When
//! both sides ask on the same step the later one resolves the race in place
//! and keeps `abort_ack` set so the exchange terminates.

use log::trace;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbortState {
    Idle,
    // We asked; waiting for the peer's answer.
    Req,
    // The peer asked; waiting for our software to answer.
    Ack,
}

/// What a single step of the handshake requires of the data path.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AbortStep {
    /// Both buffers must be emptied and incoming data ignored.
    pub flush: bool,
    /// Local and remote requests met on this step.
    pub simultaneous: bool,
}

#[derive(Debug)]
pub struct AbortFsm {
    state: AbortState,
    abort_ack: bool,
    w_abort: bool,
    // Set after we answer an abort: the peer's line is still up from the
    // request we just answered and must drop before it can mean anything.
    echo_pending: bool,
}

impl AbortFsm {
    pub const fn new() -> Self {
        Self {
            state: AbortState::Idle,
            abort_ack: false,
            w_abort: false,
            echo_pending: false,
        }
    }

    pub fn reset(&mut self) { *self = Self::new(); }

    pub fn state(&self) -> AbortState { self.state }

    pub fn in_progress(&self) -> bool { self.state != AbortState::Idle }

    pub fn abort_ack(&self) -> bool { self.abort_ack }

    /// Level driven onto this side's abort line by the last step.
    pub fn w_abort(&self) -> bool { self.w_abort }

    /// Advances one step given this step's software request pulse and the
    /// peer's abort line.
    pub fn step(&mut self, local_request: bool, remote_abort: bool) -> AbortStep {
        let was_active = self.in_progress();
        let mut simultaneous = false;

        if self.echo_pending && !remote_abort {
            self.echo_pending = false;
        }
        match self.state {
            AbortState::Idle => {
                let remote = remote_abort && !self.echo_pending;
                if remote_abort && !remote {
                    trace!("ignoring stale abort echo");
                }
                match (local_request, remote) {
                    (true, false) => {
                        trace!("abort: Idle -> Req");
                        self.state = AbortState::Req;
                        self.abort_ack = false;
                        self.w_abort = true;
                    }
                    (true, true) => {
                        trace!("abort: simultaneous request, resolved in Idle");
                        self.abort_ack = true;
                        self.w_abort = true;
                        self.echo_pending = true;
                        simultaneous = true;
                    }
                    (false, true) => {
                        trace!("abort: Idle -> Ack");
                        self.state = AbortState::Ack;
                        self.w_abort = false;
                    }
                    (false, false) => self.w_abort = false,
                }
            }
            AbortState::Req => {
                if remote_abort {
                    trace!("abort: Req -> Idle");
                    self.state = AbortState::Idle;
                    self.w_abort = false;
                } else {
                    self.w_abort = true;
                }
            }
            AbortState::Ack => {
                if local_request {
                    trace!("abort: Ack -> Idle");
                    self.state = AbortState::Idle;
                    self.abort_ack = true;
                    self.w_abort = true;
                    self.echo_pending = true;
                } else {
                    self.w_abort = false;
                }
            }
        }

        AbortStep {
            flush: was_active || self.in_progress() || simultaneous,
            simultaneous,
        }
    }
}

impl Default for AbortFsm {
    fn default() -> Self { Self::new() }
}
