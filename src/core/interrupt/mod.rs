// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Machine interrupt controller
//!
//! The CD-ROM controller does not own the CPU interrupt line. It only raises
//! its source bit here, and the CPU (outside this crate) polls
//! [`InterruptController::is_pending`].
//!
//! ## Registers
//!
//! - **I_STAT** (0x1F801070): writing 0 to a bit acknowledges it, writing 1
//!   leaves it unchanged
//! - **I_MASK** (0x1F801074): 1 = source may reach the CPU
//!
//! ## References
//!
//! - [PSX-SPX: Interrupt Control](http://problemkaputt.de/psx-spx.htm#interruptcontrol)

use crate::core::error::SaveStateError;
use crate::core::save_state::{InterruptState, StateSave};

/// Interrupt source bit flags
pub mod interrupts {
    /// Vertical blank interrupt (bit 0)
    pub const VBLANK: u16 = 1 << 0;

    /// CD-ROM controller interrupt (bit 2)
    pub const CDROM: u16 = 1 << 2;

    /// DMA transfer complete interrupt (bit 3)
    pub const DMA: u16 = 1 << 3;
}

/// PlayStation interrupt controller (I_STAT / I_MASK)
///
/// # Example
///
/// ```
/// use psx_cdrom::core::interrupt::{interrupts, InterruptController};
///
/// let mut ic = InterruptController::new();
/// ic.request(interrupts::CDROM);
/// ic.write_mask(interrupts::CDROM as u32);
/// assert!(ic.is_pending());
///
/// ic.write_status(!(interrupts::CDROM as u32));
/// assert!(!ic.is_pending());
/// ```
#[derive(Debug, Default)]
pub struct InterruptController {
    /// I_STAT - pending interrupt sources
    status: u16,

    /// I_MASK - enabled interrupt sources
    mask: u16,
}

impl InterruptController {
    /// Create a new interrupt controller with everything cleared and masked
    pub fn new() -> Self {
        Self { status: 0, mask: 0 }
    }

    /// Raise the given source bit(s)
    pub fn request(&mut self, interrupt: u16) {
        self.status |= interrupt;
        log::trace!(
            "IRQ requested: 0x{:04X}, status=0x{:04X}",
            interrupt,
            self.status
        );
    }

    /// Clear the given source bit(s)
    pub fn acknowledge(&mut self, value: u16) {
        self.status &= !value;
        log::trace!("IRQ acknowledged, status=0x{:04X}", self.status);
    }

    /// Whether any unmasked source is raised
    pub fn is_pending(&self) -> bool {
        (self.status & self.mask) != 0
    }

    /// Read I_STAT
    pub fn read_status(&self) -> u32 {
        self.status as u32
    }

    /// Write I_STAT: bits written as 0 are acknowledged
    pub fn write_status(&mut self, value: u32) {
        self.acknowledge(!(value as u16));
    }

    /// Read I_MASK
    pub fn read_mask(&self) -> u32 {
        self.mask as u32
    }

    /// Write I_MASK
    pub fn write_mask(&mut self, value: u32) {
        self.mask = value as u16;
        log::debug!("IRQ mask set: 0x{:04X}", self.mask);
    }
}

impl StateSave for InterruptController {
    type State = InterruptState;

    fn to_state(&self) -> InterruptState {
        InterruptState {
            i_stat: self.status,
            i_mask: self.mask,
        }
    }

    fn restore_from_state(&mut self, state: &InterruptState) -> Result<(), SaveStateError> {
        self.status = state.i_stat;
        self.mask = state.i_mask;
        Ok(())
    }
}
