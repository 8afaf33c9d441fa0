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

//! Protocol core shared by the full and thin endpoints.
//!
//! An endpoint is a synchronous state machine. Software calls `write`,
//! `read`, `consume`, `mark_done` and `abort` at any time; the transport
//! calls `step` once per clock with the peer's published signals and
//! forwards the returned signals to the peer.

use crate::abort::{AbortFsm, AbortState};
use crate::edge::{EdgeDetector, EventManager};
use cfg_if::cfg_if;
use core::mem;
use log::{error, trace, warn};
use mailbox_interface::*;

/// Snapshot of the status fields. Word counts are exact occupancies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EndpointStatus {
    pub rx_words: usize,
    pub tx_words: usize,
    pub abort_in_progress: bool,
    pub abort_ack: bool,
    pub tx_err: bool,
    pub rx_err: bool,
}

pub struct Endpoint<B: LinkBuffer> {
    tx: B,
    rx: B,
    abort: AbortFsm,
    // Consumed by the next step.
    abort_request: bool,
    // Words still to hand over before the pending done pulse goes out.
    done_after: Option<usize>,
    // Sticky until the status is read.
    tx_err: bool,
    rx_err: bool,
    // Returned by RDATA on underflow.
    last_read: Word,
    available: EdgeDetector,
    abort_init: EdgeDetector,
    abort_done: EdgeDetector,
    error: EdgeDetector,
    events: EventManager,
    outputs: LinkSignals,
}

impl<B: LinkBuffer> Endpoint<B> {
    pub const fn new(tx: B, rx: B) -> Self {
        Self {
            tx,
            rx,
            abort: AbortFsm::new(),
            abort_request: false,
            done_after: None,
            tx_err: false,
            rx_err: false,
            last_read: 0,
            available: EdgeDetector::new(),
            abort_init: EdgeDetector::new(),
            abort_done: EdgeDetector::new(),
            error: EdgeDetector::new(),
            events: EventManager::new(),
            outputs: LinkSignals {
                data: 0,
                valid: false,
                ready: false,
                done: false,
                abort: false,
            },
        }
    }

    /// Full system reset: empty buffers, idle handshake, no errors or
    /// pending events. Interrupt enables are cleared too.
    pub fn reset(&mut self) {
        self.tx.clear();
        self.rx.clear();
        self.abort.reset();
        self.abort_request = false;
        self.done_after = None;
        self.tx_err = false;
        self.rx_err = false;
        self.last_read = 0;
        self.available.reset();
        self.abort_init.reset();
        self.abort_done.reset();
        self.error.reset();
        self.events.reset();
        self.outputs = LinkSignals::default();
    }

    /// Queues `word` for the peer.
    ///
    /// Fails with `QueueFull` (latching tx_err, dropping the word) when there
    /// is no room, and with `AbortInProgress` while an abort is negotiated.
    pub fn write(&mut self, word: Word) -> Result<(), MailboxError> {
        if self.abort.in_progress() {
            warn!("write {:#X} rejected: abort in progress", word);
            return Err(MailboxError::AbortInProgress);
        }
        self.tx.try_push(word).map_err(|err| {
            trace!("write {:#X} dropped: {:?}", word, err);
            self.tx_err = true;
            self.sample_error();
            err
        })
    }

    /// Returns the head inbound word without removing it.
    pub fn read(&mut self) -> Result<Word, MailboxError> {
        match self.rx.peek() {
            Some(word) => Ok(word),
            None => {
                self.underflow();
                Err(MailboxError::QueueEmpty)
            }
        }
    }

    /// Removes and returns the head inbound word.
    pub fn consume(&mut self) -> Result<Word, MailboxError> {
        match self.rx.try_pop() {
            Ok(word) => {
                self.last_read = word;
                Ok(word)
            }
            Err(err) => {
                self.underflow();
                Err(err)
            }
        }
    }

    /// Writes a whole packet and marks it done. Nothing is queued when the
    /// packet does not fit.
    pub fn send_packet(&mut self, words: &[Word]) -> Result<(), MailboxError> {
        if self.abort.in_progress() {
            return Err(MailboxError::AbortInProgress);
        }
        if words.len() > self.tx.available() {
            trace!("packet of {} words does not fit", words.len());
            self.tx_err = true;
            self.sample_error();
            return Err(MailboxError::QueueFull);
        }
        for &word in words {
            self.write(word)?;
        }
        self.mark_done();
        Ok(())
    }

    /// Moves as many inbound words as fit into `buf`; returns the count.
    pub fn recv_packet(&mut self, buf: &mut [Word]) -> usize {
        let mut num_read = 0;
        while num_read < buf.len() && self.rx.is_readable() {
            match self.consume() {
                Ok(word) => buf[num_read] = word,
                Err(_) => break,
            }
            num_read += 1;
        }
        num_read
    }

    /// Drops every inbound word; returns how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_pop().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Requests a done pulse. It goes out on the step that hands over the
    /// last word queued so far, or on the next step if nothing is queued.
    pub fn mark_done(&mut self) { self.done_after = Some(self.tx.occupancy()); }

    /// Requests an abort on the next step.
    pub fn abort(&mut self) { self.abort_request = true; }

    /// Whether the peer may hand over another word.
    pub fn ready_for_remote(&self) -> bool { !self.abort.in_progress() && self.rx.is_writable() }

    pub fn writable(&self) -> bool { self.tx.is_writable() }
    pub fn readable(&self) -> bool { self.rx.is_readable() }
    pub fn tx_words(&self) -> usize { self.tx.occupancy() }
    pub fn rx_words(&self) -> usize { self.rx.occupancy() }
    pub fn capacity(&self) -> usize { self.tx.capacity() }

    pub fn abort_state(&self) -> AbortState { self.abort.state() }
    pub fn abort_in_progress(&self) -> bool { self.abort.in_progress() }
    pub fn abort_ack(&self) -> bool { self.abort.abort_ack() }

    /// Status without side effects.
    pub fn status(&self) -> EndpointStatus {
        EndpointStatus {
            rx_words: self.rx.occupancy(),
            tx_words: self.tx.occupancy(),
            abort_in_progress: self.abort.in_progress(),
            abort_ack: self.abort.abort_ack(),
            tx_err: self.tx_err,
            rx_err: self.rx_err,
        }
    }

    /// Status with the read side effect: tx_err and rx_err are cleared.
    pub fn read_and_clear_errors(&mut self) -> EndpointStatus {
        let status = self.status();
        self.tx_err = false;
        self.rx_err = false;
        self.sample_error();
        status
    }

    pub fn irq_pending(&self) -> IrqSource { self.events.pending() }
    pub fn irq_status(&self) -> IrqSource { self.events.status() }
    pub fn irq_enable(&self) -> IrqSource { self.events.enable() }
    pub fn set_irq_enable(&mut self, enable: IrqSource) { self.events.set_enable(enable); }
    /// Write-1-to-clear of EV_PENDING.
    pub fn ack_irq(&mut self, sources: IrqSource) { self.events.clear(sources); }
    /// Interrupt line to the local CPU.
    pub fn irq_line(&self) -> bool { self.events.irq() }

    /// Signals published by the last step.
    pub fn outputs(&self) -> LinkSignals { self.outputs }

    /// Advances one clock. `remote` is what the peer last published; the
    /// result is what this side drives until its next step.
    ///
    /// Only `Link` (and the loopback path) may clock an endpoint: a
    /// same-step abort race has a single later acknowledger only because the
    /// full endpoint is always stepped before the thin one.
    pub(crate) fn step(&mut self, remote: &LinkSignals) -> LinkSignals {
        let local_request = mem::take(&mut self.abort_request);
        let abort = self.abort.step(local_request, remote.abort);

        let mut out = LinkSignals {
            abort: self.abort.w_abort(),
            ..Default::default()
        };
        if abort.flush {
            if self.tx.is_readable() || self.rx.is_readable() {
                trace!(
                    "abort: flushing {} tx and {} rx words",
                    self.tx.occupancy(),
                    self.rx.occupancy()
                );
            }
            if remote.valid {
                trace!("abort: dropping inbound {:#X}", remote.data);
            }
            self.tx.clear();
            self.rx.clear();
            self.done_after = None;
        } else {
            if remote.valid {
                if let Err(err) = self.rx.try_push(remote.data) {
                    // The peer offered a word we never said we had room for.
                    error!("inbound {:#X} dropped: {:?}", remote.data, err);
                }
            }
            if remote.ready {
                if let Ok(word) = self.tx.try_pop() {
                    out.data = word;
                    out.valid = true;
                }
            }
            out.ready = self.rx.is_writable();
            if let Some(words) = self.done_after {
                let words = words.saturating_sub(out.valid as usize);
                out.done = words == 0;
                self.done_after = if out.done { None } else { Some(words) };
            }
        }

        let state = self.abort.state();
        let mut fired = IrqSource::empty();
        if self.available.update(remote.done && !abort.flush) {
            fired |= IrqSource::AVAILABLE;
        }
        if self.abort_init.update(state == AbortState::Ack) {
            fired |= IrqSource::ABORT_INIT;
        }
        self.abort_done.update(state == AbortState::Req);
        if self.abort_done.falling() {
            fired |= IrqSource::ABORT_DONE;
        }
        self.events.trigger(fired);
        self.update_irq_status();

        self.outputs = out;
        check_invariants(self);
        out
    }

    // Register accesses common to both flavors. STATUS and LOOPBACK are
    // handled by the wrappers.
    pub(crate) fn read_common(&mut self, reg: Register) -> Result<u32, MailboxError> {
        match reg {
            Register::Rdata => Ok(self.consume().unwrap_or(self.last_read)),
            Register::EvStatus => Ok(self.events.status().bits()),
            Register::EvPending => Ok(self.events.pending().bits()),
            Register::EvEnable => Ok(self.events.enable().bits()),
            Register::Wdata | Register::Done | Register::Control => Err(MailboxError::WriteOnly),
            Register::Status | Register::Loopback => Err(MailboxError::BadRegister),
        }
    }

    pub(crate) fn write_common(&mut self, reg: Register, value: u32) -> Result<(), MailboxError> {
        match reg {
            Register::Wdata => {
                // Overflow is reported through tx_err, not the bus.
                let _ = self.write(value);
                Ok(())
            }
            Register::Done => {
                if crate::registers::Done::from_bytes(crate::registers::from_u32(value)).done() {
                    self.mark_done();
                }
                Ok(())
            }
            Register::Control => {
                let control = crate::registers::Control::from_bytes(crate::registers::from_u32(value));
                if control.abort() {
                    self.abort();
                }
                Ok(())
            }
            Register::EvPending => {
                self.ack_irq(IrqSource::from_bits_truncate(value));
                Ok(())
            }
            Register::EvEnable => {
                self.set_irq_enable(IrqSource::from_bits_truncate(value));
                Ok(())
            }
            Register::Rdata | Register::EvStatus | Register::Status => Err(MailboxError::ReadOnly),
            Register::Loopback => Err(MailboxError::BadRegister),
        }
    }

    fn underflow(&mut self) {
        trace!("read underflow");
        self.rx_err = true;
        self.sample_error();
    }

    // tx_err/rx_err change outside of step(), so the error edge is sampled
    // wherever they change.
    fn sample_error(&mut self) {
        if self.error.update(self.tx_err || self.rx_err) {
            self.events.trigger(IrqSource::ERROR);
        }
        self.update_irq_status();
    }

    fn update_irq_status(&mut self) {
        let mut status = IrqSource::empty();
        status.set(IrqSource::AVAILABLE, self.available.level());
        status.set(IrqSource::ABORT_INIT, self.abort_init.level());
        status.set(IrqSource::ABORT_DONE, self.abort_done.level());
        status.set(IrqSource::ERROR, self.error.level());
        self.events.set_status(status);
    }
}

/// Decodes a register offset.
pub fn register(offset: u32) -> Result<Register, MailboxError> {
    Register::try_from(offset).map_err(|_| {
        trace!("no register at {:#X}", offset);
        MailboxError::BadRegister
    })
}

cfg_if! {
    if #[cfg(feature = "CONFIG_DEBUG_BUILD")] {
        fn check_invariants<B: LinkBuffer>(endpoint: &Endpoint<B>) {
            let abort = &endpoint.abort;
            match abort.state() {
                AbortState::Req => assert!(abort.w_abort(), "Req with abort line low"),
                AbortState::Ack => assert!(!abort.w_abort(), "Ack with abort line high"),
                AbortState::Idle => {}
            }
            if abort.in_progress() {
                assert!(!endpoint.tx.is_readable() && !endpoint.rx.is_readable());
                assert!(!endpoint.outputs.valid && !endpoint.outputs.ready);
            }
            assert!(endpoint.tx.occupancy() <= endpoint.tx.capacity());
            assert!(endpoint.rx.occupancy() <= endpoint.rx.capacity());
        }
    } else {
        fn check_invariants<B: LinkBuffer>(_endpoint: &Endpoint<B>) {}
    }
}
