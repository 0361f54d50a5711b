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

//! CD-ROM command implementations
//!
//! A command byte indexes a 32-entry table. Each handler consumes the
//! parameters drained from the FIFO, writes its answer and raises exactly one
//! interrupt. Handlers return the phase the controller moves to:
//!
//! - `Idle` for single-answer commands (and for Play/ReadN/ReadS, whose
//!   sessions run on their own after the acknowledge)
//! - `SecondResponse` for Stop, Pause, Init and ReadTOC
//! - `WaitingIrq` for SeekL/SeekP until the seek completes

use super::seek::{calculate_seek_ticks, SeekDescriptor, MIN_SEEK_TICKS};
use super::{
    bcd_to_dec, dec_to_bcd, CDPosition, CdromEvent, CdromHost, CommandState, DriveState,
    IrqType, ModeFlags, PlayScan, StatusFlags, CDROM, IRQ_RETRY_DELAY, NO_DISC_RESPONSE,
};
use crate::core::timing::TickCount;

/// Default delay before a command executes (~30us)
pub const DELAY_DEFAULT: TickCount = 1000;

/// Delay for commands that start a read or play session
pub const DELAY_READ_START: TickCount = 2000;

/// Delay for seeks and Pause
pub const DELAY_SEEK_START: TickCount = 10_000;

pub const DELAY_STOP: TickCount = 15_000;
pub const DELAY_PAUSE: TickCount = 10_000;
pub const DELAY_INIT: TickCount = 4_000_000;
pub const DELAY_RESET: TickCount = 2_000_000;
pub const DELAY_STANDBY: TickCount = 2_000_000;
pub const DELAY_READ_TOC: TickCount = 45_000;
pub const DELAY_GET_ID: TickCount = 33_868;

/// Lid close to spindle at speed
pub const DELAY_MOTOR_ON: TickCount = 3_000_000;

/// Error code: parameter out of range
pub const ERR_INVALID_PARAM: u8 = 0x10;

/// Error code: missing parameters
pub const ERR_WRONG_PARAM_COUNT: u8 = 0x20;

/// Error code: unknown opcode
pub const ERR_INVALID_COMMAND: u8 = 0x40;

/// CD-ROM commands by opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Sync,
    GetStat,
    SetLoc,
    Play,
    Forward,
    Backward,
    ReadN,
    Standby,
    Stop,
    Pause,
    Init,
    Mute,
    Demute,
    SetFilter,
    SetMode,
    GetMode,
    GetlocL,
    GetlocP,
    ReadT,
    GetTN,
    GetTD,
    SeekL,
    SeekP,
    SetClock,
    GetClock,
    Test,
    GetID,
    ReadS,
    Reset,
    GetQ,
    ReadTOC,
    Invalid,
}

/// Opcode to command, indexed by the command byte
pub const COMMAND_TABLE: [Command; 32] = [
    Command::Sync,      // 0x00
    Command::GetStat,   // 0x01
    Command::SetLoc,    // 0x02
    Command::Play,      // 0x03
    Command::Forward,   // 0x04
    Command::Backward,  // 0x05
    Command::ReadN,     // 0x06
    Command::Standby,   // 0x07
    Command::Stop,      // 0x08
    Command::Pause,     // 0x09
    Command::Init,      // 0x0A
    Command::Mute,      // 0x0B
    Command::Demute,    // 0x0C
    Command::SetFilter, // 0x0D
    Command::SetMode,   // 0x0E
    Command::GetMode,   // 0x0F
    Command::GetlocL,   // 0x10
    Command::GetlocP,   // 0x11
    Command::ReadT,     // 0x12
    Command::GetTN,     // 0x13
    Command::GetTD,     // 0x14
    Command::SeekL,     // 0x15
    Command::SeekP,     // 0x16
    Command::SetClock,  // 0x17
    Command::GetClock,  // 0x18
    Command::Test,      // 0x19
    Command::GetID,     // 0x1A
    Command::ReadS,     // 0x1B
    Command::Reset,     // 0x1C
    Command::GetQ,      // 0x1D
    Command::ReadTOC,   // 0x1E
    Command::Invalid,   // 0x1F
];

impl Command {
    /// Decode a command byte; anything past the table is `Invalid`
    pub fn from_opcode(opcode: u8) -> Self {
        COMMAND_TABLE
            .get(opcode as usize)
            .copied()
            .unwrap_or(Command::Invalid)
    }

    /// Cycles between the command write and its execution
    pub fn initial_delay(self) -> TickCount {
        match self {
            Command::Play
            | Command::Forward
            | Command::Backward
            | Command::ReadN
            | Command::ReadS
            | Command::ReadT => DELAY_READ_START,
            Command::SeekL | Command::SeekP | Command::Pause => DELAY_SEEK_START,
            Command::Stop => DELAY_STOP,
            Command::Init => DELAY_INIT,
            Command::Reset => DELAY_RESET,
            Command::Standby => DELAY_STANDBY,
            Command::ReadTOC => DELAY_READ_TOC,
            Command::GetID => DELAY_GET_ID,
            _ => DELAY_DEFAULT,
        }
    }
}

/// Cycles between writing `opcode` and its execution
///
/// # Example
///
/// ```
/// use psx_cdrom::core::cdrom::command_delay;
///
/// assert_eq!(command_delay(0x01), 1000); // GetStat
/// assert_eq!(command_delay(0x0A), 4_000_000); // Init
/// ```
pub fn command_delay(opcode: u8) -> TickCount {
    Command::from_opcode(opcode).initial_delay()
}

impl CDROM {
    /// Command event: run the handler for `current_command`
    pub(super) fn execute_command_event(&mut self, generation: u32, host: &mut dyn CdromHost) {
        if self.irq_type.is_some() {
            host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::Command { generation });
            return;
        }

        let params = self.param_fifo.take_all();
        let command = Command::from_opcode(self.current_command);
        log::debug!(
            "CD-ROM: executing {:?} (0x{:02X}) params={:02X?}",
            command,
            self.current_command,
            params
        );

        match self.dispatch(command, &params, host) {
            CommandState::Idle => self.finish_command(host),
            state => self.command_state = state,
        }
    }

    fn dispatch(
        &mut self,
        command: Command,
        params: &[u8],
        host: &mut dyn CdromHost,
    ) -> CommandState {
        match command {
            Command::Sync
            | Command::ReadT
            | Command::SetClock
            | Command::GetClock
            | Command::GetQ => {
                self.ack(host);
                CommandState::Idle
            }
            Command::GetStat => self.cmd_getstat(host),
            Command::SetLoc => self.cmd_setloc(params, host),
            Command::Play => self.cmd_play(params, host),
            Command::Forward => self.cmd_scan(PlayScan::Forward, host),
            Command::Backward => self.cmd_scan(PlayScan::Backward, host),
            Command::ReadN | Command::ReadS => self.cmd_read(host),
            Command::Standby => self.cmd_standby(host),
            Command::Stop => self.cmd_stop(host),
            Command::Pause => self.cmd_pause(host),
            Command::Init => self.cmd_init(host),
            Command::Mute => self.cmd_mute(true, host),
            Command::Demute => self.cmd_mute(false, host),
            Command::SetFilter => self.cmd_setfilter(params, host),
            Command::SetMode => self.cmd_setmode(params, host),
            Command::GetMode => {
                self.respond(
                    &[self.stat_p.bits(), self.mode.bits()],
                    IrqType::Acknowledge,
                    host,
                );
                CommandState::Idle
            }
            Command::GetlocL => {
                let header = self.last_header;
                self.respond(&header, IrqType::Acknowledge, host);
                CommandState::Idle
            }
            Command::GetlocP => self.cmd_getlocp(host),
            Command::GetTN => self.cmd_gettn(host),
            Command::GetTD => self.cmd_gettd(params, host),
            Command::SeekL => self.cmd_seek(DriveState::SeekingPhysical, host),
            Command::SeekP => self.cmd_seek(DriveState::SeekingLogical, host),
            Command::Test => self.cmd_test(params, host),
            Command::GetID => self.cmd_getid(host),
            Command::Reset => self.cmd_reset(host),
            Command::ReadTOC => {
                self.ack(host);
                self.schedule_second_response(DELAY_READ_TOC, host)
            }
            Command::Invalid => {
                log::warn!("Unknown CD-ROM command: 0x{:02X}", self.current_command);
                let stat = (self.stat_p | StatusFlags::ERROR | StatusFlags::CHECK_ERROR).bits();
                self.error_code = ERR_INVALID_COMMAND;
                self.respond(&[stat, ERR_INVALID_COMMAND], IrqType::DiskError, host);
                CommandState::Idle
            }
        }
    }

    fn schedule_second_response(
        &mut self,
        delay: TickCount,
        host: &mut dyn CdromHost,
    ) -> CommandState {
        host.schedule_event(
            delay,
            CdromEvent::SecondResponse {
                generation: self.generations.command,
            },
        );
        CommandState::SecondResponse
    }

    /// Second-phase event for Stop, Pause, Init and ReadTOC
    pub(super) fn second_response_event(&mut self, generation: u32, host: &mut dyn CdromHost) {
        if self.irq_type.is_some() {
            host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::SecondResponse { generation });
            return;
        }

        match Command::from_opcode(self.current_command) {
            Command::Stop => {
                self.stat_p.remove(
                    StatusFlags::READING
                        | StatusFlags::PLAYING
                        | StatusFlags::SEEKING
                        | StatusFlags::SPINNING,
                );
                self.motor_on = false;
                self.drive_state = DriveState::Idle;
            }
            Command::Pause => {
                self.stat_p.remove(StatusFlags::READING | StatusFlags::PLAYING);
                self.drive_state = DriveState::Idle;
            }
            Command::Init => {
                self.stat_p.remove(StatusFlags::SEEKING);
                self.drive_state = DriveState::Idle;
            }
            _ => {}
        }

        log::debug!(
            "CD-ROM: {:?} complete",
            Command::from_opcode(self.current_command)
        );
        self.respond(&[self.stat_p.bits()], IrqType::Complete, host);
        self.finish_command(host);
    }

    /// Seek completion event for SeekL/SeekP
    pub(super) fn seek_complete_event(&mut self, generation: u32, host: &mut dyn CdromHost) {
        if self.irq_type.is_some() {
            host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::SeekComplete { generation });
            return;
        }

        self.snap_pending_seek();
        self.stat_p.remove(StatusFlags::SEEKING);
        self.drive_state = DriveState::Idle;
        log::debug!(
            "CD-ROM: seek complete at {:02}:{:02}:{:02}",
            self.position.minute,
            self.position.second,
            self.position.sector
        );

        self.respond(&[self.stat_p.bits()], IrqType::Complete, host);
        self.finish_command(host);
    }

    /// Command 0x01: GetStat
    ///
    /// Returns the current drive status byte. Error bits are reported once
    /// and then cleared.
    fn cmd_getstat(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.ack(host);
        self.stat_p.remove(StatusFlags::ERROR | StatusFlags::CHECK_ERROR);
        CommandState::Idle
    }

    /// Command 0x02: SetLoc
    ///
    /// Sets the seek target from 3 parameter bytes (MM:SS:FF in BCD) and
    /// computes the seek that the next Seek/Read/Play will perform.
    fn cmd_setloc(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        let [minute, second, sector] = match params {
            [m, s, f, ..] => [*m, *s, *f],
            _ => {
                log::warn!("CD-ROM: SetLoc with insufficient parameters");
                self.error_response(ERR_WRONG_PARAM_COUNT, host);
                return CommandState::Idle;
            }
        };

        let Some(target) = CDPosition::from_bcd(minute, second, sector) else {
            log::warn!(
                "CD-ROM: SetLoc with invalid position {:02X}:{:02X}:{:02X}",
                minute,
                second,
                sector
            );
            self.error_response(ERR_INVALID_PARAM, host);
            return CommandState::Idle;
        };

        self.seek_target = target;
        self.seek = SeekDescriptor::between(self.position.to_lba(), target.to_lba());

        log::debug!(
            "CD-ROM: SetLoc to {:02}:{:02}:{:02} ({:?}, {} sectors)",
            target.minute,
            target.second,
            target.sector,
            self.seek.seek_type,
            self.seek.distance
        );

        self.ack(host);
        CommandState::Idle
    }

    /// Command 0x03: Play
    ///
    /// Starts CD-DA playback at the given track (BCD parameter), or at the
    /// pending SetLoc target, or at the current position.
    fn cmd_play(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        if !self.disc_present() {
            self.respond(&NO_DISC_RESPONSE, IrqType::DiskError, host);
            return CommandState::Idle;
        }

        let track = params.first().map_or(0, |&t| bcd_to_dec(t));
        if track > 0 {
            let start = self.disc.as_ref().and_then(|d| d.track_start(track));
            match start {
                Some(start) => {
                    self.position = start;
                    self.seek.pending = false;
                }
                None => {
                    log::warn!("CD-ROM: Play of missing track {}", track);
                    self.error_response(ERR_INVALID_PARAM, host);
                    return CommandState::Idle;
                }
            }
        } else {
            self.snap_pending_seek();
        }

        self.halt_sessions();
        self.start_play_session();
        self.stat_p.remove(StatusFlags::READING | StatusFlags::SEEKING);
        self.stat_p.insert(StatusFlags::SPINNING | StatusFlags::PLAYING);
        self.motor_on = true;
        self.drive_state = DriveState::Playing;

        log::debug!(
            "CD-ROM: Play track {} from {:02}:{:02}:{:02}",
            self.cdda_track,
            self.position.minute,
            self.position.second,
            self.position.sector
        );

        self.ack(host);
        host.schedule_event(
            super::CYCLES_PER_SECTOR_1X,
            CdromEvent::CddaPlay {
                generation: self.generations.play,
            },
        );
        CommandState::Idle
    }

    /// Commands 0x04/0x05: Forward / Backward
    fn cmd_scan(&mut self, scan: PlayScan, host: &mut dyn CdromHost) -> CommandState {
        if self.cdda_playing {
            self.scan = scan;
            log::debug!("CD-ROM: scan {:?}", scan);
        }
        self.ack(host);
        CommandState::Idle
    }

    /// Commands 0x06/0x1B: ReadN / ReadS
    ///
    /// Starts the sector read session. The first sector arrives one sector
    /// period after the acknowledge.
    fn cmd_read(&mut self, host: &mut dyn CdromHost) -> CommandState {
        if !self.disc_present() {
            self.respond(&NO_DISC_RESPONSE, IrqType::DiskError, host);
            return CommandState::Idle;
        }

        self.snap_pending_seek();
        self.halt_sessions();

        self.stat_p.remove(StatusFlags::SEEKING | StatusFlags::PLAYING | StatusFlags::ERROR);
        self.stat_p.insert(StatusFlags::READING | StatusFlags::SPINNING);
        self.motor_on = true;
        self.drive_state = DriveState::Reading;
        self.data_ready = false;
        self.read_error_count = 0;

        log::debug!(
            "CD-ROM: read from {:02}:{:02}:{:02} at {}x",
            self.position.minute,
            self.position.second,
            self.position.sector,
            1 + u8::from(self.mode.contains(ModeFlags::SPEED))
        );

        self.ack(host);
        host.schedule_event(
            self.sector_period(),
            CdromEvent::SectorRead {
                generation: self.generations.read,
            },
        );
        CommandState::Idle
    }

    /// Command 0x07: Standby
    fn cmd_standby(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.stat_p.insert(StatusFlags::SPINNING);
        self.motor_on = true;
        self.ack(host);
        CommandState::Idle
    }

    /// Command 0x08: Stop
    ///
    /// The acknowledge still shows the old status; the motor is stopped in
    /// the second phase.
    fn cmd_stop(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.halt_sessions();
        self.drive_state = DriveState::Stopping;
        self.ack(host);
        self.schedule_second_response(DELAY_STOP, host)
    }

    /// Command 0x09: Pause
    fn cmd_pause(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.halt_sessions();
        self.drive_state = DriveState::Pausing;
        self.ack(host);
        self.schedule_second_response(DELAY_PAUSE, host)
    }

    /// Command 0x0A: Init
    fn cmd_init(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.halt_sessions();
        self.soft_reset();
        self.stat_p = StatusFlags::SPINNING;
        self.motor_on = true;
        self.drive_state = DriveState::Resetting;
        self.ack(host);
        self.schedule_second_response(DELAY_INIT, host)
    }

    /// Commands 0x0B/0x0C: Mute / Demute
    fn cmd_mute(&mut self, muted: bool, host: &mut dyn CdromHost) -> CommandState {
        self.muted = muted;
        log::debug!("CD-ROM: {}", if muted { "muted" } else { "demuted" });
        self.ack(host);
        CommandState::Idle
    }

    /// Command 0x0D: SetFilter
    fn cmd_setfilter(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        let [file, channel] = match params {
            [f, c, ..] => [*f, *c],
            _ => {
                self.error_response(ERR_WRONG_PARAM_COUNT, host);
                return CommandState::Idle;
            }
        };

        self.xa_file = file;
        self.xa_channel = channel;
        log::debug!("CD-ROM: XA filter file={} channel={}", file, channel);
        self.ack(host);
        CommandState::Idle
    }

    /// Command 0x0E: SetMode
    fn cmd_setmode(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        let Some(&mode) = params.first() else {
            log::warn!("CD-ROM: SetMode without parameter");
            self.error_response(ERR_WRONG_PARAM_COUNT, host);
            return CommandState::Idle;
        };

        self.mode = ModeFlags::from_bits_retain(mode);
        log::debug!("CD-ROM: SetMode 0x{:02X} ({:?})", mode, self.mode);
        self.ack(host);
        CommandState::Idle
    }

    /// Command 0x11: GetlocP
    ///
    /// Track, index, position relative to the track start and absolute
    /// position, all in BCD.
    fn cmd_getlocp(&mut self, host: &mut dyn CdromHost) -> CommandState {
        let position = self.position;
        let (track, start) = self
            .locate_track(position)
            .unwrap_or((1, CDPosition::default()));

        let relative_frames = (position.to_lba() - start.to_lba()).max(0);
        let relative = CDPosition::from_lba(relative_frames - 150).to_bcd();
        let absolute = position.to_bcd();

        let response = [
            dec_to_bcd(track),
            0x01,
            relative[0],
            relative[1],
            relative[2],
            absolute[0],
            absolute[1],
            absolute[2],
        ];
        self.respond(&response, IrqType::Acknowledge, host);
        CommandState::Idle
    }

    /// Command 0x13: GetTN
    ///
    /// First and last track numbers in BCD.
    fn cmd_gettn(&mut self, host: &mut dyn CdromHost) -> CommandState {
        let range = if self.disc_present() {
            self.disc.as_ref().and_then(|d| d.track_range())
        } else {
            None
        };

        match range {
            Some((first, last)) => {
                let response = [self.stat_p.bits(), dec_to_bcd(first), dec_to_bcd(last)];
                self.respond(&response, IrqType::Acknowledge, host);
            }
            None => self.respond(&NO_DISC_RESPONSE, IrqType::DiskError, host),
        }
        CommandState::Idle
    }

    /// Command 0x14: GetTD
    ///
    /// Start of the given track (BCD parameter, 0 = lead-out) as BCD MSF.
    fn cmd_gettd(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        let Some(&track) = params.first() else {
            self.error_response(ERR_WRONG_PARAM_COUNT, host);
            return CommandState::Idle;
        };

        if !self.disc_present() {
            self.respond(&NO_DISC_RESPONSE, IrqType::DiskError, host);
            return CommandState::Idle;
        }

        let track = bcd_to_dec(track);
        match self.disc.as_ref().and_then(|d| d.track_start(track)) {
            Some(start) => {
                let msf = start.to_bcd();
                let response = [self.stat_p.bits(), msf[0], msf[1], msf[2]];
                self.respond(&response, IrqType::Acknowledge, host);
            }
            None => {
                log::warn!("CD-ROM: GetTD of unknown track {}", track);
                self.error_response(ERR_INVALID_PARAM, host);
            }
        }
        CommandState::Idle
    }

    /// Commands 0x15/0x16: SeekL / SeekP
    ///
    /// Acknowledges immediately and completes once the seek time has
    /// elapsed.
    fn cmd_seek(&mut self, seek_state: DriveState, host: &mut dyn CdromHost) -> CommandState {
        self.halt_sessions();

        let ticks = if self.seek.pending {
            calculate_seek_ticks(self.position.to_lba(), self.seek_target.to_lba())
        } else {
            MIN_SEEK_TICKS
        };

        self.stat_p.remove(StatusFlags::READING | StatusFlags::PLAYING);
        self.stat_p.insert(StatusFlags::SEEKING);
        self.drive_state = seek_state;

        log::debug!(
            "CD-ROM: {:?} to {:02}:{:02}:{:02} in {} cycles",
            seek_state,
            self.seek_target.minute,
            self.seek_target.second,
            self.seek_target.sector,
            ticks
        );

        self.ack(host);
        host.schedule_event(
            ticks as TickCount,
            CdromEvent::SeekComplete {
                generation: self.generations.command,
            },
        );
        CommandState::WaitingIrq
    }

    /// Command 0x19: Test
    ///
    /// Subcommand 0x20 returns the controller BIOS date.
    fn cmd_test(&mut self, params: &[u8], host: &mut dyn CdromHost) -> CommandState {
        match params.first() {
            Some(0x20) => self.respond(&[0x94, 0x09, 0x19, 0x94], IrqType::Acknowledge, host),
            _ => self.ack(host),
        }
        CommandState::Idle
    }

    /// Command 0x1A: GetID
    fn cmd_getid(&mut self, host: &mut dyn CdromHost) -> CommandState {
        if !self.disc_present() {
            log::debug!("CD-ROM: GetID with no disc");
            self.respond(&NO_DISC_RESPONSE, IrqType::DiskError, host);
            return CommandState::Idle;
        }

        let response = [
            self.stat_p.bits(),
            0x02,
            0x00,
            0x00,
            0x00,
            b'S',
            b'C',
            b'E',
            b'X',
        ];
        self.respond(&response, IrqType::Complete, host);
        CommandState::Idle
    }

    /// Command 0x1C: Reset
    fn cmd_reset(&mut self, host: &mut dyn CdromHost) -> CommandState {
        self.halt_sessions();
        self.soft_reset();
        self.stat_p = StatusFlags::empty();
        self.motor_on = false;
        self.drive_state = DriveState::Idle;
        self.ack(host);
        CommandState::Idle
    }
}
