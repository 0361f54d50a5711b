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

//! Sector read and CD-DA play sessions
//!
//! Both sessions are self-rescheduling events. A read session delivers one
//! sector per sector period (1x or 2x depending on the mode) through the
//! transfer buffer, or routes XA audio sectors to the audio queue. A play
//! session always runs at 1x and pushes decoded PCM to the audio queue,
//! optionally reporting its position every 10 sectors.

use super::{
    dec_to_bcd, CDPosition, CdromEvent, CdromHost, DriveState, IrqType, ModeFlags, PlayScan,
    StatusFlags, CDROM, CYCLES_PER_SECTOR_1X, IRQ_RETRY_DELAY, SECTOR_SIZE,
};
use crate::core::error::CdRomError;

/// Sectors skipped per tick while fast-forwarding or rewinding
pub const SCAN_STEP: i32 = 5;

/// Play sectors between two position reports
pub const REPORT_INTERVAL: u8 = 10;

/// Error code sent with a failed sector read
const ERR_SECTOR_READ: u8 = 0x04;

/// XA submode bits
const SUBMODE_AUDIO: u8 = 0x04;
const SUBMODE_REALTIME: u8 = 0x40;
const XA_AUDIO_MASK: u8 = SUBMODE_AUDIO | SUBMODE_REALTIME;

/// Where a freshly read sector goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectorRoute {
    /// Transfer buffer + DataReady
    Data,
    /// XA audio matching the filter
    XaAudio,
    /// XA audio for another file/channel
    Skip,
}

impl CDROM {
    /// One tick of the read session
    pub(super) fn sector_read_event(&mut self, generation: u32, host: &mut dyn CdromHost) {
        if self.irq_type.is_some() {
            host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::SectorRead { generation });
            return;
        }

        let position = self.position;
        let sector = match self.fetch_sector(position) {
            Ok(sector) => sector,
            Err(e) => {
                log::warn!(
                    "CD-ROM: read failed at {:02}:{:02}:{:02}: {}",
                    position.minute,
                    position.second,
                    position.sector,
                    e
                );
                self.read_error_count = self.read_error_count.saturating_add(1);
                self.stat_p.remove(StatusFlags::READING);
                self.session_failed(host);
                return;
            }
        };

        self.last_header.copy_from_slice(&sector[12..20]);

        match self.route_sector(&sector) {
            SectorRoute::Data => {
                self.transfer_buffer.copy_from_slice(&sector);
                self.transfer_index = 0;
                self.transfer_size = SECTOR_SIZE;
                self.data_ready = true;
                log::trace!(
                    "CD-ROM: sector {:02}:{:02}:{:02} ready",
                    position.minute,
                    position.second,
                    position.sector
                );
                self.respond(&[self.stat_p.bits()], IrqType::DataReady, host);
            }
            SectorRoute::XaAudio => {
                self.cd_audio.push_xa_sector(sector);
                self.xa_playing = true;
            }
            SectorRoute::Skip => {
                log::trace!("CD-ROM: XA sector for another channel skipped");
            }
        }

        self.position.advance();
        host.schedule_event(self.sector_period(), CdromEvent::SectorRead { generation });
    }

    fn route_sector(&self, sector: &[u8]) -> SectorRoute {
        if !self.mode.contains(ModeFlags::XA_FILTER) {
            return SectorRoute::Data;
        }

        let mode = sector[15];
        let submode = sector[18];
        if mode != 2 || submode & XA_AUDIO_MASK != XA_AUDIO_MASK {
            return SectorRoute::Data;
        }

        if sector[16] == self.xa_file && sector[17] == self.xa_channel {
            SectorRoute::XaAudio
        } else {
            SectorRoute::Skip
        }
    }

    /// Read a raw sector through the cache
    pub(super) fn fetch_sector(&mut self, position: CDPosition) -> Result<Vec<u8>, CdRomError> {
        if !self.disc_present() {
            return Err(CdRomError::NoDisc);
        }

        let lba = position.to_lba();
        if let Some(data) = self.sector_cache.get(lba) {
            return Ok(data.to_vec());
        }

        let disc = self.disc.as_mut().ok_or(CdRomError::NoDisc)?;
        let data = disc.read_sector(&position)?;
        if data.len() != SECTOR_SIZE {
            return Err(CdRomError::ReadError {
                sector: lba,
                reason: format!("backend returned {} bytes", data.len()),
            });
        }

        self.sector_cache.insert(lba, &data);
        Ok(data)
    }

    /// Set up the play session state for the current position
    pub(super) fn start_play_session(&mut self) {
        self.cdda_playing = true;
        self.scan = PlayScan::Normal;
        self.cdda_report_count = 0;
        self.cdda_track = self.locate_track(self.position).map_or(1, |(track, _)| track);
        self.play_end = self.track_end(self.cdda_track);
    }

    /// One tick of the play session
    pub(super) fn cdda_play_event(&mut self, generation: u32, host: &mut dyn CdromHost) {
        let reached_end = self
            .play_end
            .is_some_and(|end| self.position.to_lba() >= end.to_lba());

        if reached_end && self.mode.contains(ModeFlags::AUTO_PAUSE) {
            if self.irq_type.is_some() {
                host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::CddaPlay { generation });
                return;
            }

            log::debug!("CD-ROM: end of track {}, auto-pause", self.cdda_track);
            self.halt_sessions();
            self.stat_p.remove(StatusFlags::PLAYING);
            self.drive_state = DriveState::Idle;
            self.respond(&[self.stat_p.bits()], IrqType::DataEnd, host);
            return;
        }

        if reached_end {
            self.cdda_track = self
                .locate_track(self.position)
                .map_or(self.cdda_track, |(track, _)| track);
            self.play_end = self.track_end(self.cdda_track);
            log::debug!("CD-ROM: playing into track {}", self.cdda_track);
        }

        let position = self.position;
        let samples = match self.read_audio(position) {
            Ok(samples) => samples,
            Err(e) => {
                if self.irq_type.is_some() {
                    host.schedule_event(IRQ_RETRY_DELAY, CdromEvent::CddaPlay { generation });
                    return;
                }
                log::warn!(
                    "CD-ROM: audio read failed at {:02}:{:02}:{:02}: {}",
                    position.minute,
                    position.second,
                    position.sector,
                    e
                );
                self.stat_p.remove(StatusFlags::PLAYING);
                self.session_failed(host);
                return;
            }
        };

        if self.muted {
            self.cd_audio.push_silence(samples.len() / 2);
        } else {
            self.cd_audio.push_samples(&samples);
        }

        match self.scan {
            PlayScan::Normal => self.position.advance(),
            PlayScan::Forward => self.position = self.position.offset(SCAN_STEP),
            PlayScan::Backward => self.position = self.position.offset(-SCAN_STEP),
        }

        if self.mode.contains(ModeFlags::REPORT_IRQ) {
            self.cdda_report_count += 1;
            if self.cdda_report_count >= REPORT_INTERVAL {
                self.cdda_report_count = 0;
                self.report_play_position(host);
            }
        }

        host.schedule_event(CYCLES_PER_SECTOR_1X, CdromEvent::CddaPlay { generation });
    }

    /// Periodic play report, dropped if an interrupt is still pending
    fn report_play_position(&mut self, host: &mut dyn CdromHost) {
        if self.irq_type.is_some() {
            log::trace!("CD-ROM: play report skipped, IRQ pending");
            return;
        }

        let msf = self.position.to_bcd();
        let report = [
            self.stat_p.bits(),
            dec_to_bcd(self.cdda_track),
            0x01,
            msf[0],
            msf[1],
            msf[2],
            0x00,
            0x00,
        ];
        self.respond(&report, IrqType::DataReady, host);
    }

    fn read_audio(&mut self, position: CDPosition) -> Result<Vec<i16>, CdRomError> {
        if !self.disc_present() {
            return Err(CdRomError::NoDisc);
        }
        let disc = self.disc.as_mut().ok_or(CdRomError::NoDisc)?;
        disc.read_audio_sector(&position)
    }

    /// End the running session after a backend failure
    fn session_failed(&mut self, host: &mut dyn CdromHost) {
        self.halt_sessions();
        self.error_code = ERR_SECTOR_READ;
        self.stat_p.insert(StatusFlags::ERROR);
        self.drive_state = DriveState::Error;
        self.respond(
            &[self.stat_p.bits(), ERR_SECTOR_READ],
            IrqType::DiskError,
            host,
        );
    }

    /// Track containing `position` and its start
    pub(super) fn locate_track(&self, position: CDPosition) -> Option<(u8, CDPosition)> {
        let disc = self.disc.as_ref()?;
        let (first, last) = disc.track_range()?;
        let lba = position.to_lba();

        (first..=last).rev().find_map(|track| {
            disc.track_start(track)
                .filter(|start| start.to_lba() <= lba)
                .map(|start| (track, start))
        })
    }

    /// First position after `track` (next track start or lead-out)
    pub(super) fn track_end(&self, track: u8) -> Option<CDPosition> {
        let disc = self.disc.as_ref()?;
        let (_, last) = disc.track_range()?;
        if track < last {
            disc.track_start(track + 1)
        } else {
            disc.track_start(0)
        }
    }
}
