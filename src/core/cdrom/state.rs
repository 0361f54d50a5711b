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

//! Save state conversion for the controller

use super::seek::SeekDescriptor;
use super::{CDPosition, Fifo, IrqType, ModeFlags, StatusFlags, CDROM, FIFO_SIZE, SECTOR_SIZE};
use crate::core::error::SaveStateError;
use crate::core::save_state::{CDROMState, StateSave};

fn msf_tuple(pos: CDPosition) -> (u8, u8, u8) {
    (pos.minute, pos.second, pos.sector)
}

fn msf_from_tuple((minute, second, sector): (u8, u8, u8)) -> Result<CDPosition, SaveStateError> {
    if second >= 60 || sector >= 75 || minute >= 100 {
        return Err(SaveStateError::InvalidState(format!(
            "position {:02}:{:02}:{:02} out of range",
            minute, second, sector
        )));
    }
    Ok(CDPosition::new(minute, second, sector))
}

impl StateSave for CDROM {
    type State = CDROMState;

    fn to_state(&self) -> CDROMState {
        CDROMState {
            ctrl: self.ctrl,
            stat_p: self.stat_p.bits(),
            mode: self.mode.bits(),
            interrupt_enable: self.interrupt_enable,
            irq_type: self.interrupt_flag(),
            drive_state: self.drive_state,
            command_state: self.command_state,
            motor_on: self.motor_on,
            shell_open: self.shell_open,
            position: msf_tuple(self.position),
            seek_target: msf_tuple(self.seek_target),
            seek_distance: self.seek.distance,
            seek_type: self.seek.seek_type,
            seek_pending: self.seek.pending,
            current_command: self.current_command,
            queued_command: self.queued_command,
            command_start_cycle: self.command_start_cycle,
            param_fifo: self.param_fifo.iter().collect(),
            response_fifo: self.response_fifo.iter().collect(),
            transfer_buffer: self.transfer_buffer.clone(),
            transfer_index: self.transfer_index as u32,
            transfer_size: self.transfer_size as u32,
            data_ready: self.data_ready,
            last_header: self.last_header,
            xa_file: self.xa_file,
            xa_channel: self.xa_channel,
            xa_playing: self.xa_playing,
            cdda_playing: self.cdda_playing,
            cdda_track: self.cdda_track,
            cdda_report_count: self.cdda_report_count,
            play_end: self.play_end.map(msf_tuple),
            scan: self.scan,
            muted: self.muted,
            volume_left: self.cd_audio.volume_left,
            volume_right: self.cd_audio.volume_right,
            error_code: self.error_code,
            read_error_count: self.read_error_count,
            generations: self.generations,
        }
    }

    fn restore_from_state(&mut self, state: &CDROMState) -> Result<(), SaveStateError> {
        if state.param_fifo.len() > FIFO_SIZE || state.response_fifo.len() > FIFO_SIZE {
            return Err(SaveStateError::InvalidState(
                "FIFO longer than 16 bytes".to_string(),
            ));
        }
        if state.transfer_buffer.len() != SECTOR_SIZE {
            return Err(SaveStateError::InvalidState(format!(
                "transfer buffer is {} bytes",
                state.transfer_buffer.len()
            )));
        }
        if state.transfer_index > state.transfer_size || state.transfer_size as usize > SECTOR_SIZE
        {
            return Err(SaveStateError::InvalidState(format!(
                "transfer index {} / size {} out of range",
                state.transfer_index, state.transfer_size
            )));
        }
        let irq_type = match state.irq_type {
            0 => None,
            code => Some(IrqType::from_code(code).ok_or_else(|| {
                SaveStateError::InvalidState(format!("unknown interrupt type {}", code))
            })?),
        };
        let position = msf_from_tuple(state.position)?;
        let seek_target = msf_from_tuple(state.seek_target)?;
        let play_end = state.play_end.map(msf_from_tuple).transpose()?;

        self.ctrl = state.ctrl;
        self.stat_p = StatusFlags::from_bits_retain(state.stat_p);
        self.mode = ModeFlags::from_bits_retain(state.mode);
        self.interrupt_enable = state.interrupt_enable & 0x1F;
        self.irq_type = irq_type;
        self.drive_state = state.drive_state;
        self.command_state = state.command_state;
        self.motor_on = state.motor_on;
        self.shell_open = state.shell_open;
        self.position = position;
        self.seek_target = seek_target;
        self.seek = SeekDescriptor {
            distance: state.seek_distance,
            seek_type: state.seek_type,
            pending: state.seek_pending,
        };
        self.current_command = state.current_command;
        self.queued_command = state.queued_command;
        self.command_start_cycle = state.command_start_cycle;
        self.param_fifo = Fifo::from_bytes(&state.param_fifo);
        self.response_fifo = Fifo::from_bytes(&state.response_fifo);
        self.transfer_buffer.copy_from_slice(&state.transfer_buffer);
        self.transfer_index = state.transfer_index as usize;
        self.transfer_size = state.transfer_size as usize;
        self.data_ready = state.data_ready && self.transfer_index < self.transfer_size;
        self.last_header = state.last_header;
        self.xa_file = state.xa_file;
        self.xa_channel = state.xa_channel;
        self.xa_playing = state.xa_playing;
        self.cdda_playing = state.cdda_playing;
        self.cdda_track = state.cdda_track;
        self.cdda_report_count = state.cdda_report_count;
        self.play_end = play_end;
        self.scan = state.scan;
        self.muted = state.muted;
        self.cd_audio.clear();
        self.cd_audio.volume_left = state.volume_left;
        self.cd_audio.volume_right = state.volume_right;
        self.error_code = state.error_code;
        self.read_error_count = state.read_error_count;
        self.generations = state.generations;
        self.sector_cache.invalidate();

        log::debug!(
            "CD-ROM: state restored at {:02}:{:02}:{:02} ({:?}/{:?})",
            position.minute,
            position.second,
            position.sector,
            self.drive_state,
            self.command_state
        );
        Ok(())
    }
}
