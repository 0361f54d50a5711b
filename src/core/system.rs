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

//! System integration module
//!
//! Ties the CD-ROM controller to the machine services it relies on: the
//! cycle counter and event queue ([`TimingEventManager`]) and the interrupt
//! controller. A CPU emulator would call [`System::run`] with the cycles it
//! executed and forward 0x1F801800-0x1F801803 accesses to
//! [`System::read_register`] / [`System::write_register`].

use chrono::Utc;

use super::cdrom::{CdromEvent, CdromHost, DiscBackend, IrqType, CDROM};
use super::error::{Result, SaveStateError};
use super::interrupt::{interrupts, InterruptController};
use super::save_state::{SaveState, StateSave, TimingState, SAVE_STATE_VERSION};
use super::timing::{GlobalTicks, TickCount, TimingEventManager};

/// Machine-side services handed to the controller
///
/// Owns the clock/event queue and the interrupt controller.
#[derive(Debug, Default)]
pub struct CdromBus {
    /// Global clock and pending events
    pub timing: TimingEventManager<CdromEvent>,

    /// I_STAT / I_MASK
    pub interrupts: InterruptController,
}

impl CdromHost for CdromBus {
    fn current_cycle(&self) -> GlobalTicks {
        self.timing.current_time()
    }

    fn schedule_event(&mut self, ticks: TickCount, event: CdromEvent) {
        self.timing.schedule(ticks, event);
    }

    fn assert_interrupt(&mut self) {
        self.interrupts.request(interrupts::CDROM);
    }
}

/// CD-ROM controller plus its host
///
/// # Example
///
/// ```
/// use psx_cdrom::core::system::System;
///
/// let mut system = System::new();
///
/// // Test 0x20: controller BIOS date
/// system.write_register(0x1F801800, 0x01);
/// system.write_register(0x1F801801, 0x20);
/// system.write_register(0x1F801800, 0x00);
/// system.write_register(0x1F801801, 0x19);
///
/// assert!(system.run_until_irq(10_000));
/// assert_eq!(system.cdrom().response_bytes(), vec![0x94, 0x09, 0x19, 0x94]);
/// ```
pub struct System {
    /// CD-ROM controller
    cdrom: CDROM,

    /// Clock, event queue and interrupt controller
    bus: CdromBus,
}

impl System {
    /// Create a new system with no disc
    ///
    /// The CD-ROM source is unmasked in I_MASK.
    pub fn new() -> Self {
        let mut bus = CdromBus::default();
        bus.interrupts.write_mask(interrupts::CDROM as u32);

        Self {
            cdrom: CDROM::new(),
            bus,
        }
    }

    /// Reset the controller and the clock
    ///
    /// The inserted disc stays in the drive.
    pub fn reset(&mut self) {
        self.cdrom.reset();
        self.bus.timing.reset();
        self.bus.interrupts = InterruptController::new();
        self.bus.interrupts.write_mask(interrupts::CDROM as u32);
        log::info!("System reset");
    }

    /// Advance the machine by `cycles`
    ///
    /// Every event falling inside the window fires at its exact due time.
    pub fn run(&mut self, cycles: TickCount) {
        self.bus.timing.pending_ticks += cycles.max(0);
        while let Some(event) = self.bus.timing.next_due() {
            self.cdrom.handle_event(event, &mut self.bus);
        }
        self.bus.timing.finish_run();
    }

    /// Advance exactly to the next scheduled event and run it
    ///
    /// # Returns
    ///
    /// Cycles advanced (0 if nothing is scheduled)
    pub fn run_to_next_event(&mut self) -> TickCount {
        if self.bus.timing.is_empty() {
            return 0;
        }
        let cycles = self.bus.timing.downcount;
        self.run(cycles);
        cycles
    }

    /// Run until the controller latches an interrupt
    ///
    /// # Returns
    ///
    /// `true` if an interrupt is pending, `false` if `max_cycles` elapsed
    /// first
    pub fn run_until_irq(&mut self, max_cycles: u64) -> bool {
        let deadline = self.total_cycles() + max_cycles;

        while !self.cdrom.irq_pending() {
            let now = self.total_cycles();
            if now >= deadline {
                return false;
            }

            let remaining = (deadline - now).min(i32::MAX as u64) as TickCount;
            let step = if self.bus.timing.is_empty() {
                remaining
            } else {
                self.bus.timing.downcount.min(remaining)
            };
            self.run(step);
        }

        true
    }

    /// Read a CD-ROM register
    pub fn read_register(&mut self, addr: u32) -> u8 {
        self.cdrom.read_register(addr)
    }

    /// Write a CD-ROM register
    pub fn write_register(&mut self, addr: u32, value: u8) {
        self.cdrom.write_register(addr, value, &mut self.bus);
    }

    /// Read and acknowledge the controller interrupt (port 3)
    pub fn acknowledge_irq(&mut self) -> Option<IrqType> {
        let code = self.cdrom.read_interrupt_flag();
        self.bus.interrupts.acknowledge(interrupts::CDROM);
        IrqType::from_code(code)
    }

    /// Load a .cue/.bin disc image
    pub fn load_disc(&mut self, cue_path: &str) -> Result<()> {
        self.cdrom.load_disc(cue_path)?;
        Ok(())
    }

    /// Insert a disc backend
    pub fn insert_disc(&mut self, disc: Box<dyn DiscBackend>) {
        self.cdrom.insert_disc(disc, &mut self.bus);
    }

    /// Remove the disc (opens the lid)
    pub fn eject_disc(&mut self) -> Option<Box<dyn DiscBackend>> {
        self.cdrom.eject_disc()
    }

    /// Open the lid
    pub fn open_shell(&mut self) {
        self.cdrom.open_shell();
    }

    /// Close the lid
    pub fn close_shell(&mut self) {
        self.cdrom.close_shell(&mut self.bus);
    }

    /// Total cycles since reset
    pub fn total_cycles(&self) -> GlobalTicks {
        self.bus.timing.current_time()
    }

    /// Get reference to CD-ROM controller
    pub fn cdrom(&self) -> &CDROM {
        &self.cdrom
    }

    /// Get mutable reference to CD-ROM controller
    pub fn cdrom_mut(&mut self) -> &mut CDROM {
        &mut self.cdrom
    }

    /// Get reference to interrupt controller
    pub fn interrupts(&self) -> &InterruptController {
        &self.bus.interrupts
    }

    /// Get mutable reference to interrupt controller
    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.bus.interrupts
    }

    /// Get reference to the timing queue
    pub fn timing(&self) -> &TimingEventManager<CdromEvent> {
        &self.bus.timing
    }

    /// Capture the current state
    ///
    /// Stale events still sitting in the queue are left out.
    pub fn save_state(&self) -> SaveState {
        let events = self
            .bus
            .timing
            .events()
            .iter()
            .filter(|e| self.cdrom.is_event_current(&e.payload))
            .cloned()
            .collect();

        SaveState {
            version: SAVE_STATE_VERSION,
            metadata: super::save_state::SaveStateMetadata {
                timestamp: Utc::now(),
                game_id: self.cdrom.game_id().to_string(),
                cycle_count: self.total_cycles(),
            },
            cdrom: self.cdrom.to_state(),
            timing: TimingState {
                global_tick_counter: self.total_cycles(),
                events,
            },
            interrupts: self.bus.interrupts.to_state(),
        }
    }

    /// Restore a previously captured state
    ///
    /// The inserted disc is kept. On error nothing is modified.
    pub fn load_state(&mut self, state: &SaveState) -> std::result::Result<(), SaveStateError> {
        if state.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::IncompatibleVersion {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        self.cdrom.restore_from_state(&state.cdrom)?;
        self.bus.interrupts.restore_from_state(&state.interrupts)?;
        self.bus.timing.restore(
            state.timing.global_tick_counter,
            state.timing.events.clone(),
        );

        log::info!(
            "Loaded state saved at cycle {} ({})",
            state.metadata.cycle_count,
            state.metadata.timestamp
        );
        Ok(())
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
