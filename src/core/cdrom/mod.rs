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

//! CD-ROM controller emulation for PlayStation 1
//!
//! This module emulates the CD-ROM controller as seen by the CPU through
//! four byte-wide ports. The controller is driven entirely by scheduled
//! events: a command write schedules its execution a fixed number of cycles
//! later, reads and audio playback reschedule themselves once per sector,
//! and every answer is delivered through a single interrupt latch.
//!
//! # Ports
//!
//! | Port | Read                         | Write                                   |
//! |------|------------------------------|-----------------------------------------|
//! | 0    | Derived status byte          | Control byte (bit 0 selects param mode) |
//! | 1    | Pop response FIFO            | Parameter (ctrl bit 0) or command       |
//! | 2    | One byte of sector data      | Parameter (ctrl bit 0)                  |
//! | 3    | Interrupt type, clears latch | Request register (ctrl bit 0) or mask   |
//!
//! # Interrupt Types
//!
//! - 1: Data ready (sector delivered or play report)
//! - 2: Complete (second response)
//! - 3: Acknowledge (first response)
//! - 4: Data end (auto-pause at end of track)
//! - 5: Disk error
//!
//! Only one interrupt can be outstanding. Any event that wants to raise an
//! interrupt while the latch is still set postpones itself by 0x100 cycles.
//!
//! # MSF Addressing
//!
//! Positions are Minute:Second:Frame with 75 frames per second. Parameters
//! and responses carry them in BCD, the controller keeps them in decimal.
//!
//! # Example
//!
//! ```
//! use psx_cdrom::core::cdrom::IrqType;
//! use psx_cdrom::core::system::System;
//!
//! let mut system = System::new();
//!
//! // GetStat
//! system.write_register(0x1F801800, 0x00);
//! system.write_register(0x1F801801, 0x01);
//!
//! // Answer arrives 1000 cycles later
//! system.run(1000);
//! assert_eq!(system.read_register(0x1F801803), IrqType::Acknowledge as u8);
//! ```

use bincode::{Decode, Encode};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::error::CdRomError;
use crate::core::timing::{GlobalTicks, TickCount};

pub mod cd_audio;
mod commands;
mod disc;
mod fifo;
mod irq;
mod pipeline;
pub mod seek;
mod sector_cache;
mod state;
#[cfg(test)]
mod tests;

pub use cd_audio::CDAudio;
pub use commands::{command_delay, Command, COMMAND_TABLE};
pub use disc::{DiscBackend, DiscImage, Track, TrackType};
pub use fifo::{Fifo, FIFO_SIZE};
pub use irq::IrqType;
pub use sector_cache::{SectorCache, NUM_SECTOR_BUFFERS};
pub use seek::{calculate_seek_ticks, SeekDescriptor, SeekType};

/// CPU clock (cycles per second)
pub const PSXCLK: u32 = 33_868_800;

/// Raw sector size in bytes
pub const SECTOR_SIZE: usize = 2352;

/// Cycles per sector at single speed (75 sectors per second)
pub const CYCLES_PER_SECTOR_1X: TickCount = (PSXCLK / 75) as TickCount;

/// Cycles per sector at double speed
pub const CYCLES_PER_SECTOR_2X: TickCount = (PSXCLK / 150) as TickCount;

/// Delay applied to an event that finds the interrupt latch still set
pub const IRQ_RETRY_DELAY: TickCount = 0x100;

/// Response sent when a command needs a disc and there is none
pub(super) const NO_DISC_RESPONSE: [u8; 2] = [0x11, 0x80];

bitflags! {
    /// Persistent drive status (`stat_p`), first byte of most responses
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StatusFlags: u8 {
        const ERROR = 0x01;
        const SPINNING = 0x02;
        const READING = 0x04;
        const SEEKING = 0x08;
        const PLAYING = 0x10;
        const CHECK_ERROR = 0x20;
    }
}

bitflags! {
    /// Drive mode set by SetMode
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModeFlags: u8 {
        /// Allow CD-DA sectors to be read as data
        const CDDA = 0x01;
        /// Pause playback at the end of the track
        const AUTO_PAUSE = 0x02;
        /// Periodic position reports while playing
        const REPORT_IRQ = 0x04;
        /// Route matching XA audio sectors to the audio path
        const XA_FILTER = 0x08;
        const IGNORE_BIT = 0x10;
        const SIZE_2340 = 0x20;
        const SIZE_2328 = 0x40;
        /// Double speed
        const SPEED = 0x80;
    }
}

/// Mechanical drive state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum DriveState {
    #[default]
    Idle,
    OpeningShell,
    Resetting,
    SeekingPhysical,
    SeekingLogical,
    Reading,
    Playing,
    Pausing,
    Stopping,
    SpinningUp,
    Error,
}

/// Command processing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum CommandState {
    /// Ready to accept a command
    #[default]
    Idle,
    /// Command written, waiting for its execution event
    Executing,
    /// First answer given, waiting for the second-phase event
    SecondResponse,
    /// Waiting for a seek to complete
    WaitingIrq,
}

/// Fast-forward / rewind state during audio playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum PlayScan {
    #[default]
    Normal,
    Forward,
    Backward,
}

/// Events the controller schedules on the host's timing queue
///
/// Each event carries the generation counter of the session it belongs to.
/// Bumping a counter makes every event already in flight for that session
/// stale, which is how pending work is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum CdromEvent {
    Command { generation: u32 },
    SecondResponse { generation: u32 },
    SeekComplete { generation: u32 },
    SectorRead { generation: u32 },
    CddaPlay { generation: u32 },
    IrqRecheck { generation: u32 },
    LidSpinUp { generation: u32 },
}

/// Per-session generation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub struct Generations {
    pub command: u32,
    pub read: u32,
    pub play: u32,
    pub irq: u32,
    pub lid: u32,
}

impl Generations {
    /// Every counter moved forward, invalidating all in-flight events
    fn advanced(self) -> Self {
        Self {
            command: self.command.wrapping_add(1),
            read: self.read.wrapping_add(1),
            play: self.play.wrapping_add(1),
            irq: self.irq.wrapping_add(1),
            lid: self.lid.wrapping_add(1),
        }
    }
}

/// Services the controller needs from the machine it is plugged into
///
/// The host owns the clock, the event queue and the CPU interrupt line.
pub trait CdromHost {
    /// Current machine time in cycles
    fn current_cycle(&self) -> GlobalTicks;

    /// Deliver `event` back to [`CDROM::handle_event`] `ticks` cycles from now
    fn schedule_event(&mut self, ticks: TickCount, event: CdromEvent);

    /// Raise the CD-ROM source on the machine interrupt controller
    fn assert_interrupt(&mut self);
}

/// CD-ROM position in MSF (Minute:Second:Frame) format
///
/// All values are stored as decimal (not BCD).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CDPosition {
    /// Minute (0-99)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Frame/Sector (0-74)
    pub sector: u8,
}

impl CDPosition {
    /// Create a new position
    pub fn new(minute: u8, second: u8, sector: u8) -> Self {
        Self {
            minute,
            second,
            sector,
        }
    }

    /// Position from three BCD bytes, if they form a valid address
    pub fn from_bcd(minute: u8, second: u8, sector: u8) -> Option<Self> {
        if !(is_valid_bcd(minute) && is_valid_bcd(second) && is_valid_bcd(sector)) {
            return None;
        }
        let pos = Self::new(bcd_to_dec(minute), bcd_to_dec(second), bcd_to_dec(sector));
        (pos.second < 60 && pos.sector < 75).then_some(pos)
    }

    /// Position as three BCD bytes
    pub fn to_bcd(&self) -> [u8; 3] {
        [
            dec_to_bcd(self.minute),
            dec_to_bcd(self.second),
            dec_to_bcd(self.sector),
        ]
    }

    /// Convert MSF to logical block address (LBA)
    ///
    /// LBA = (minute * 60 + second) * 75 + sector - 150
    /// (The -150 offset accounts for the 2-second pregap)
    pub fn to_lba(&self) -> i32 {
        ((self.minute as i32 * 60 + self.second as i32) * 75 + self.sector as i32) - 150
    }

    /// Convert logical block address to MSF
    ///
    /// Addresses before 00:00:00 clamp to 00:00:00.
    pub fn from_lba(lba: i32) -> Self {
        let total_sectors = (lba + 150).max(0);
        let minute = (total_sectors / 75 / 60).min(99) as u8;
        let second = ((total_sectors / 75) % 60) as u8;
        let sector = (total_sectors % 75) as u8;
        Self::new(minute, second, sector)
    }

    /// Step to the next sector, carrying into seconds and minutes
    pub fn advance(&mut self) {
        self.sector += 1;
        if self.sector >= 75 {
            self.sector = 0;
            self.second += 1;
            if self.second >= 60 {
                self.second = 0;
                self.minute = (self.minute + 1) % 100;
            }
        }
    }

    /// Position `delta` sectors away
    pub fn offset(&self, delta: i32) -> Self {
        Self::from_lba(self.to_lba() + delta)
    }
}

impl Default for CDPosition {
    /// Start of the data area (00:02:00)
    fn default() -> Self {
        Self::new(0, 2, 0)
    }
}

/// Convert BCD to decimal
#[inline(always)]
pub fn bcd_to_dec(value: u8) -> u8 {
    (value >> 4) * 10 + (value & 0x0F)
}

/// Convert decimal to BCD
#[inline(always)]
pub fn dec_to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

#[inline]
fn is_valid_bcd(value: u8) -> bool {
    (value >> 4) < 10 && (value & 0x0F) < 10
}

/// CD-ROM drive controller
///
/// Owns the FIFOs, the drive/command state machines, the interrupt latch and
/// the sector transfer buffer. Everything time-dependent goes through the
/// [`CdromHost`] passed into each entry point.
pub struct CDROM {
    /// Parameter FIFO (up to 16 bytes)
    pub(super) param_fifo: Fifo,

    /// Response FIFO (up to 16 bytes)
    pub(super) response_fifo: Fifo,

    /// Last control byte written to port 0
    pub(super) ctrl: u8,

    /// Persistent drive status
    pub(super) stat_p: StatusFlags,

    /// Mode set by SetMode
    pub(super) mode: ModeFlags,

    /// Interrupt enable mask (5 bits, one per interrupt type)
    pub(super) interrupt_enable: u8,

    pub(super) drive_state: DriveState,
    pub(super) command_state: CommandState,
    pub(super) motor_on: bool,
    pub(super) shell_open: bool,

    /// Current head position
    pub(super) position: CDPosition,

    /// Target set by SetLoc
    pub(super) seek_target: CDPosition,

    /// Seek computed at SetLoc time
    pub(super) seek: SeekDescriptor,

    /// Opcode being executed
    pub(super) current_command: u8,

    /// Command written while another one was in flight
    pub(super) queued_command: Option<u8>,

    /// Cycle the current command was accepted
    pub(super) command_start_cycle: GlobalTicks,

    /// Interrupt latch: the type waiting to be acknowledged
    pub(super) irq_type: Option<IrqType>,

    /// Sector currently exposed on port 2
    pub(super) transfer_buffer: Vec<u8>,
    pub(super) transfer_index: usize,
    pub(super) transfer_size: usize,
    pub(super) data_ready: bool,

    /// Header and subheader of the last data sector (GetlocL)
    pub(super) last_header: [u8; 8],

    pub(super) sector_cache: SectorCache,

    /// CD-DA / XA output queue
    pub(super) cd_audio: CDAudio,

    /// XA filter (SetFilter)
    pub(super) xa_file: u8,
    pub(super) xa_channel: u8,

    /// An XA stream has been routed to the audio queue in this session
    pub(super) xa_playing: bool,

    /// CD-DA playback session
    pub(super) cdda_playing: bool,
    pub(super) cdda_track: u8,
    pub(super) cdda_report_count: u8,
    pub(super) play_end: Option<CDPosition>,
    pub(super) scan: PlayScan,
    pub(super) muted: bool,

    /// Last error code reported
    pub(super) error_code: u8,

    /// Backend read failures since the last read command
    pub(super) read_error_count: u8,

    pub(super) generations: Generations,

    /// Inserted medium
    pub(super) disc: Option<Box<dyn DiscBackend>>,
}

impl CDROM {
    /// CD-ROM register addresses
    pub const REG_STATUS: u32 = 0x1F801800;
    pub const REG_COMMAND: u32 = 0x1F801801;
    pub const REG_DATA: u32 = 0x1F801802;
    pub const REG_INTERRUPT: u32 = 0x1F801803;

    /// Create a new CD-ROM controller
    ///
    /// The drive comes up spinning, idle, with no disc, at 00:02:00 and with
    /// all five interrupt types enabled.
    ///
    /// # Example
    ///
    /// ```
    /// use psx_cdrom::core::cdrom::CDROM;
    ///
    /// let cdrom = CDROM::new();
    /// assert!(!cdrom.has_disc());
    /// ```
    pub fn new() -> Self {
        Self {
            param_fifo: Fifo::new(),
            response_fifo: Fifo::new(),
            ctrl: 0,
            stat_p: StatusFlags::SPINNING,
            mode: ModeFlags::empty(),
            interrupt_enable: 0x1F,
            drive_state: DriveState::Idle,
            command_state: CommandState::Idle,
            motor_on: true,
            shell_open: false,
            position: CDPosition::default(),
            seek_target: CDPosition::default(),
            seek: SeekDescriptor::default(),
            current_command: 0,
            queued_command: None,
            command_start_cycle: 0,
            irq_type: None,
            transfer_buffer: vec![0; SECTOR_SIZE],
            transfer_index: 0,
            transfer_size: 0,
            data_ready: false,
            last_header: [0; 8],
            sector_cache: SectorCache::new(),
            cd_audio: CDAudio::new(),
            xa_file: 0,
            xa_channel: 0,
            xa_playing: false,
            cdda_playing: false,
            cdda_track: 0,
            cdda_report_count: 0,
            play_end: None,
            scan: PlayScan::Normal,
            muted: false,
            error_code: 0,
            read_error_count: 0,
            generations: Generations::default(),
            disc: None,
        }
    }

    /// Power-on reset
    ///
    /// Keeps the inserted disc. Every in-flight event becomes stale.
    pub fn reset(&mut self) {
        let disc = self.disc.take();
        let generations = self.generations.advanced();
        *self = Self::new();
        self.disc = disc;
        self.generations = generations;
        log::debug!("CD-ROM: reset");
    }

    /// Reset triggered by Init / Reset commands
    ///
    /// Clears the mode, any pending seek, the transfer buffer and the XA
    /// filter. The head position and the motor are left to the caller.
    pub(super) fn soft_reset(&mut self) {
        self.mode = ModeFlags::empty();
        self.seek.pending = false;
        self.transfer_index = 0;
        self.transfer_size = 0;
        self.data_ready = false;
        self.xa_file = 0;
        self.xa_channel = 0;
        self.muted = false;
        self.scan = PlayScan::Normal;
        self.cdda_report_count = 0;
        self.error_code = 0;
        self.read_error_count = 0;
        self.cd_audio.clear();
    }

    // ------------------------------------------------------------------
    // Register interface
    // ------------------------------------------------------------------

    /// Read one of the four ports
    ///
    /// Accepts either the port number (0-3) or the full bus address
    /// (0x1F801800-0x1F801803).
    pub fn read_register(&mut self, addr: u32) -> u8 {
        let value = match addr & 3 {
            0 => self.status_register(),
            1 => self.response_fifo.pop(),
            2 => self.read_data_byte(),
            _ => self.read_interrupt_flag(),
        };
        log::trace!("CD-ROM: read port {} -> 0x{:02X}", addr & 3, value);
        value
    }

    /// Write one of the four ports
    pub fn write_register(&mut self, addr: u32, value: u8, host: &mut dyn CdromHost) {
        log::trace!("CD-ROM: write port {} <- 0x{:02X}", addr & 3, value);
        let param_mode = self.ctrl & 0x01 != 0;

        match addr & 3 {
            0 => self.ctrl = value,
            1 if param_mode => self.push_param(value),
            1 => self.write_command(value, host),
            2 if param_mode => self.push_param(value),
            2 => {}
            _ if param_mode => self.write_request(value),
            _ => self.set_interrupt_enable(value),
        }
    }

    /// Derived status byte (port 0)
    ///
    /// ```text
    /// Bit 5: Response FIFO not empty
    /// Bit 4: Parameter FIFO not full
    /// Bit 3: Data ready
    /// Bit 2: Seeking
    /// Bit 1: Reading
    /// Bit 0: Error
    /// ```
    pub fn status_register(&self) -> u8 {
        let mut status = 0u8;

        if !self.response_fifo.is_empty() {
            status |= 0x20;
        }
        if !self.param_fifo.is_full() {
            status |= 0x10;
        }
        if self.data_ready {
            status |= 0x08;
        }
        if self.stat_p.contains(StatusFlags::SEEKING) {
            status |= 0x04;
        }
        if self.stat_p.contains(StatusFlags::READING) {
            status |= 0x02;
        }
        if self.stat_p.contains(StatusFlags::ERROR) {
            status |= 0x01;
        }

        status
    }

    /// Push a parameter byte to the parameter FIFO
    pub fn push_param(&mut self, value: u8) {
        if !self.param_fifo.push(value) {
            log::warn!("CD-ROM: parameter FIFO full, dropped 0x{:02X}", value);
        }
    }

    /// Pop a response byte (0 when empty)
    pub fn pop_response(&mut self) -> u8 {
        self.response_fifo.pop()
    }

    /// Read one byte of sector data (port 2)
    ///
    /// Returns 0 unless data is ready. The byte that exhausts the buffer
    /// clears `data_ready`.
    pub fn read_data_byte(&mut self) -> u8 {
        if !self.data_ready || self.transfer_index >= self.transfer_size {
            return 0;
        }

        let value = self.transfer_buffer[self.transfer_index];
        self.transfer_index += 1;
        if self.transfer_index >= self.transfer_size {
            self.data_ready = false;
            log::trace!("CD-ROM: transfer buffer drained");
        }
        value
    }

    /// Request register (port 3 in parameter mode)
    ///
    /// Bit 7 arms or disarms the data port, bit 6 clears the parameter FIFO.
    fn write_request(&mut self, value: u8) {
        if value & 0x80 != 0 {
            self.data_ready = self.transfer_index < self.transfer_size;
        } else {
            self.data_ready = false;
        }

        if value & 0x40 != 0 {
            self.param_fifo.clear();
        }
    }

    /// Set interrupt enable mask (5 bits)
    pub fn set_interrupt_enable(&mut self, value: u8) {
        self.interrupt_enable = value & 0x1F;
        log::trace!("CD-ROM: interrupt enable = 0x{:02X}", self.interrupt_enable);
    }

    /// Get interrupt enable mask
    pub fn interrupt_enable(&self) -> u8 {
        self.interrupt_enable
    }

    // ------------------------------------------------------------------
    // Command admission
    // ------------------------------------------------------------------

    /// Accept a command byte
    ///
    /// If a command is already in flight the new one is parked in a one-deep
    /// queue (a later write replaces it) and started when the controller
    /// returns to idle.
    pub(super) fn write_command(&mut self, cmd: u8, host: &mut dyn CdromHost) {
        if self.command_state != CommandState::Idle {
            if let Some(dropped) = self.queued_command.replace(cmd) {
                log::warn!(
                    "CD-ROM: queued command 0x{:02X} replaced by 0x{:02X}",
                    dropped,
                    cmd
                );
            } else {
                log::debug!(
                    "CD-ROM: command 0x{:02X} queued behind 0x{:02X}",
                    cmd,
                    self.current_command
                );
            }
            return;
        }

        self.start_command(cmd, host);
    }

    fn start_command(&mut self, cmd: u8, host: &mut dyn CdromHost) {
        self.current_command = cmd;
        self.command_state = CommandState::Executing;
        self.command_start_cycle = host.current_cycle();
        self.generations.command = self.generations.command.wrapping_add(1);

        let delay = command_delay(cmd);
        log::debug!(
            "CD-ROM: command 0x{:02X} ({:?}) accepted, executes in {} cycles",
            cmd,
            Command::from_opcode(cmd),
            delay
        );
        host.schedule_event(
            delay,
            CdromEvent::Command {
                generation: self.generations.command,
            },
        );
    }

    /// Return to idle and start the queued command, if any
    pub(super) fn finish_command(&mut self, host: &mut dyn CdromHost) {
        log::debug!(
            "CD-ROM: command 0x{:02X} finished after {} cycles",
            self.current_command,
            host.current_cycle().saturating_sub(self.command_start_cycle)
        );
        self.command_state = CommandState::Idle;
        if let Some(cmd) = self.queued_command.take() {
            self.start_command(cmd, host);
        }
    }

    // ------------------------------------------------------------------
    // Event dispatch
    // ------------------------------------------------------------------

    /// Handle an event previously scheduled through the host
    ///
    /// Stale events (generation mismatch, or the session they belong to has
    /// ended) are dropped.
    pub fn handle_event(&mut self, event: CdromEvent, host: &mut dyn CdromHost) {
        match event {
            CdromEvent::Command { generation } => {
                if generation == self.generations.command
                    && self.command_state == CommandState::Executing
                {
                    self.execute_command_event(generation, host);
                    return;
                }
            }
            CdromEvent::SecondResponse { generation } => {
                if generation == self.generations.command
                    && self.command_state == CommandState::SecondResponse
                {
                    self.second_response_event(generation, host);
                    return;
                }
            }
            CdromEvent::SeekComplete { generation } => {
                if generation == self.generations.command
                    && self.command_state == CommandState::WaitingIrq
                {
                    self.seek_complete_event(generation, host);
                    return;
                }
            }
            CdromEvent::SectorRead { generation } => {
                if generation == self.generations.read && self.drive_state == DriveState::Reading {
                    self.sector_read_event(generation, host);
                    return;
                }
            }
            CdromEvent::CddaPlay { generation } => {
                if generation == self.generations.play && self.cdda_playing {
                    self.cdda_play_event(generation, host);
                    return;
                }
            }
            CdromEvent::IrqRecheck { generation } => {
                if generation == self.generations.irq {
                    self.irq_recheck_event(host);
                    return;
                }
            }
            CdromEvent::LidSpinUp { generation } => {
                if generation == self.generations.lid
                    && self.drive_state == DriveState::SpinningUp
                {
                    self.lid_spin_up_event();
                    return;
                }
            }
        }

        log::trace!("CD-ROM: dropped stale event {:?}", event);
    }

    /// Whether the event belongs to the current session of its kind
    ///
    /// Used to prune the host queue before a save state is taken.
    pub fn is_event_current(&self, event: &CdromEvent) -> bool {
        match *event {
            CdromEvent::Command { generation }
            | CdromEvent::SecondResponse { generation }
            | CdromEvent::SeekComplete { generation } => generation == self.generations.command,
            CdromEvent::SectorRead { generation } => generation == self.generations.read,
            CdromEvent::CddaPlay { generation } => generation == self.generations.play,
            CdromEvent::IrqRecheck { generation } => generation == self.generations.irq,
            CdromEvent::LidSpinUp { generation } => generation == self.generations.lid,
        }
    }

    /// Stop the read and play sessions without touching `stat_p`
    pub(super) fn halt_sessions(&mut self) {
        self.generations.read = self.generations.read.wrapping_add(1);
        self.generations.play = self.generations.play.wrapping_add(1);
        self.cdda_playing = false;
        self.xa_playing = false;
        self.scan = PlayScan::Normal;
    }

    /// Cycles per sector for the current speed
    pub(super) fn sector_period(&self) -> TickCount {
        if self.mode.contains(ModeFlags::SPEED) {
            CYCLES_PER_SECTOR_2X
        } else {
            CYCLES_PER_SECTOR_1X
        }
    }

    /// Move the head to the SetLoc target if a seek is still pending
    pub(super) fn snap_pending_seek(&mut self) {
        if self.seek.pending {
            log::trace!(
                "CD-ROM: snapping to {:02}:{:02}:{:02}",
                self.seek_target.minute,
                self.seek_target.second,
                self.seek_target.sector
            );
            self.position = self.seek_target;
            self.seek.pending = false;
        }
    }

    // ------------------------------------------------------------------
    // Disc and lid
    // ------------------------------------------------------------------

    /// Load a disc image from a .cue file
    ///
    /// # Arguments
    ///
    /// * `cue_path` - Path to the .cue file
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the disc was loaded
    /// - `Err(CdRomError)` if loading failed
    pub fn load_disc(&mut self, cue_path: &str) -> Result<(), CdRomError> {
        let disc = DiscImage::load(cue_path)?;
        self.disc = Some(Box::new(disc));
        self.sector_cache.invalidate();
        log::info!("CD-ROM: disc loaded from {}", cue_path);
        Ok(())
    }

    /// Insert a disc
    ///
    /// If the lid was open it is closed and the drive spins up.
    pub fn insert_disc(&mut self, disc: Box<dyn DiscBackend>, host: &mut dyn CdromHost) {
        self.disc = Some(disc);
        self.sector_cache.invalidate();
        log::info!("CD-ROM: disc inserted");

        if self.shell_open {
            self.close_shell(host);
        }
    }

    /// Remove the disc, opening the lid
    pub fn eject_disc(&mut self) -> Option<Box<dyn DiscBackend>> {
        self.open_shell();
        self.sector_cache.invalidate();
        log::info!("CD-ROM: disc ejected");
        self.disc.take()
    }

    /// Open the lid
    ///
    /// Stops the motor and every session.
    pub fn open_shell(&mut self) {
        self.halt_sessions();
        self.generations.lid = self.generations.lid.wrapping_add(1);
        self.shell_open = true;
        self.stat_p = StatusFlags::empty();
        self.motor_on = false;
        self.drive_state = DriveState::OpeningShell;
        self.data_ready = false;
        log::debug!("CD-ROM: shell opened");
    }

    /// Close the lid
    ///
    /// The drive reaches `Idle` with the motor spinning after the spin-up
    /// delay.
    pub fn close_shell(&mut self, host: &mut dyn CdromHost) {
        self.shell_open = false;
        self.drive_state = DriveState::SpinningUp;
        self.generations.lid = self.generations.lid.wrapping_add(1);
        host.schedule_event(
            commands::DELAY_MOTOR_ON,
            CdromEvent::LidSpinUp {
                generation: self.generations.lid,
            },
        );
        log::debug!("CD-ROM: shell closed, spinning up");
    }

    fn lid_spin_up_event(&mut self) {
        self.stat_p = StatusFlags::SPINNING;
        self.motor_on = true;
        self.drive_state = DriveState::Idle;
        self.position = CDPosition::default();
        self.sector_cache.invalidate();
        log::debug!("CD-ROM: spin-up complete");
    }

    /// Whether a disc is inserted
    pub fn has_disc(&self) -> bool {
        self.disc.is_some()
    }

    /// Whether the drive can read: lid closed and the backend reports media
    pub(super) fn disc_present(&self) -> bool {
        !self.shell_open && self.disc.as_ref().is_some_and(|d| d.is_present())
    }

    /// Identifier of the inserted disc
    pub fn game_id(&self) -> &'static str {
        if self.disc.is_some() {
            "UNKNOWN"
        } else {
            "NO_DISC"
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Get current head position
    pub fn position(&self) -> CDPosition {
        self.position
    }

    /// Set current head position
    pub fn set_position(&mut self, position: CDPosition) {
        self.position = position;
    }

    /// Persistent drive status
    pub fn stat(&self) -> StatusFlags {
        self.stat_p
    }

    /// Current mode
    pub fn mode(&self) -> ModeFlags {
        self.mode
    }

    pub fn drive_state(&self) -> DriveState {
        self.drive_state
    }

    pub fn command_state(&self) -> CommandState {
        self.command_state
    }

    /// Whether port 2 currently serves sector data
    pub fn data_ready(&self) -> bool {
        self.data_ready
    }

    /// Whether an interrupt is waiting to be acknowledged
    pub fn irq_pending(&self) -> bool {
        self.irq_type.is_some()
    }

    /// Whether XA sectors are being routed to the audio queue
    pub fn xa_playing(&self) -> bool {
        self.xa_playing
    }

    /// Code sent with the last error response (0 after a reset)
    pub fn last_error(&self) -> u8 {
        self.error_code
    }

    /// Backend read failures since the last ReadN/ReadS
    pub fn read_error_count(&self) -> u8 {
        self.read_error_count
    }

    /// Response FIFO contents, oldest first (non-destructive)
    pub fn response_bytes(&self) -> Vec<u8> {
        self.response_fifo.iter().collect()
    }

    /// Audio output queue
    pub fn cd_audio(&self) -> &CDAudio {
        &self.cd_audio
    }

    /// Audio output queue
    pub fn cd_audio_mut(&mut self) -> &mut CDAudio {
        &mut self.cd_audio
    }
}

impl Default for CDROM {
    fn default() -> Self {
        Self::new()
    }
}
