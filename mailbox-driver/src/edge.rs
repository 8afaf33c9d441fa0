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

// Level-to-pulse conversion and the event (interrupt) registers.

use log::trace;
use mailbox_interface::IrqSource;

/// Turns a sampled level into edges. A level that stays true produces a
/// single rising edge.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EdgeDetector {
    previous: bool,
    current: bool,
}
impl EdgeDetector {
    pub const fn new() -> Self {
        Self {
            previous: false,
            current: false,
        }
    }

    /// Samples `level`; returns true on a rising edge.
    pub fn update(&mut self, level: bool) -> bool {
        self.previous = self.current;
        self.current = level;
        self.rising()
    }

    pub fn rising(&self) -> bool { self.current && !self.previous }
    pub fn falling(&self) -> bool { !self.current && self.previous }
    pub fn level(&self) -> bool { self.current }

    pub fn reset(&mut self) { *self = Self::new(); }
}

/// EV_STATUS / EV_PENDING / EV_ENABLE.
///
/// Pending bits latch on trigger whether or not the source is enabled and
/// are cleared by writing 1s. The interrupt line is raised while any
/// enabled source is pending.
#[derive(Debug)]
pub struct EventManager {
    status: IrqSource,
    pending: IrqSource,
    enable: IrqSource,
}
impl EventManager {
    pub const fn new() -> Self {
        Self {
            status: IrqSource::empty(),
            pending: IrqSource::empty(),
            enable: IrqSource::empty(),
        }
    }

    pub fn reset(&mut self) { *self = Self::new(); }

    pub fn trigger(&mut self, sources: IrqSource) {
        if !sources.is_empty() {
            trace!("event {:?}", sources);
        }
        self.pending |= sources;
    }

    /// Levels currently feeding each source.
    pub fn status(&self) -> IrqSource { self.status }
    pub fn set_status(&mut self, status: IrqSource) { self.status = status; }

    pub fn pending(&self) -> IrqSource { self.pending }
    pub fn clear(&mut self, sources: IrqSource) { self.pending.remove(sources); }

    pub fn enable(&self) -> IrqSource { self.enable }
    pub fn set_enable(&mut self, enable: IrqSource) { self.enable = enable; }

    pub fn irq(&self) -> bool { self.pending.intersects(self.enable) }
}
impl Default for EventManager {
    fn default() -> Self { Self::new() }
}
