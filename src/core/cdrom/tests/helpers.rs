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

//! Shared test fixtures

use std::cell::Cell;
use std::rc::Rc;

use super::super::*;
use crate::core::system::System;

/// First LBA of the audio track on [`FakeDisc`]
pub(super) const TRACK2_LBA: i32 = 1000;

/// Sectors on [`FakeDisc`]
pub(super) const DISC_SECTORS: i32 = 2000;

/// Upper bound used when waiting for an answer
pub(super) const MAX_WAIT: u64 = 50_000_000;

/// In-memory two-track disc
///
/// Track 1 (data) covers LBA 0-999, track 2 (audio) LBA 1000-1999. Every
/// sector carries its BCD address in the header, and its payload bytes are
/// `(lba + offset) as u8`.
pub(super) struct FakeDisc {
    pub(super) present: bool,
    /// Backend reads performed, shared with the test
    pub(super) reads: Rc<Cell<usize>>,
    /// LBA that fails to read
    pub(super) fail_at: Option<i32>,
    /// LBA range of real-time XA audio sectors; file 1, channel = lba % 2
    pub(super) xa_range: Option<std::ops::Range<i32>>,
}

impl FakeDisc {
    pub(super) fn new() -> Self {
        Self {
            present: true,
            reads: Rc::new(Cell::new(0)),
            fail_at: None,
            xa_range: None,
        }
    }

    /// Expected raw contents of a sector
    pub(super) fn sector(lba: i32) -> Vec<u8> {
        let mut data: Vec<u8> = (0..SECTOR_SIZE).map(|i| (lba + i as i32) as u8).collect();

        // Sync pattern
        data[0] = 0x00;
        data[1..11].fill(0xFF);
        data[11] = 0x00;

        let msf = CDPosition::from_lba(lba).to_bcd();
        data[12..15].copy_from_slice(&msf);
        data[15] = 0x02;

        // Subheader: file, channel, submode (data), coding
        data[16..20].copy_from_slice(&[0x00, 0x00, 0x08, 0x00]);
        data[20..24].copy_from_slice(&[0x00, 0x00, 0x08, 0x00]);
        data
    }
}

impl DiscBackend for FakeDisc {
    fn is_present(&self) -> bool {
        self.present
    }

    fn track_range(&self) -> Option<(u8, u8)> {
        Some((1, 2))
    }

    fn track_start(&self, track: u8) -> Option<CDPosition> {
        match track {
            0 => Some(CDPosition::from_lba(DISC_SECTORS)),
            1 => Some(CDPosition::from_lba(0)),
            2 => Some(CDPosition::from_lba(TRACK2_LBA)),
            _ => None,
        }
    }

    fn read_sector(&mut self, position: &CDPosition) -> Result<Vec<u8>, CdRomError> {
        let lba = position.to_lba();
        self.reads.set(self.reads.get() + 1);

        if self.fail_at == Some(lba) {
            return Err(CdRomError::ReadError {
                sector: lba,
                reason: "scratched".to_string(),
            });
        }
        if !(0..DISC_SECTORS).contains(&lba) {
            return Err(CdRomError::InvalidSector { sector: lba });
        }

        let mut data = Self::sector(lba);
        if self.xa_range.as_ref().is_some_and(|r| r.contains(&lba)) {
            // file 1, channel lba % 2, submode audio|realtime|form2
            data[16..20].copy_from_slice(&[0x01, (lba % 2) as u8, 0x64, 0x00]);
        }
        Ok(data)
    }
}

/// System with a [`FakeDisc`] inserted
pub(super) fn system_with_disc() -> System {
    system_with(FakeDisc::new())
}

pub(super) fn system_with(disc: FakeDisc) -> System {
    let mut system = System::new();
    system.insert_disc(Box::new(disc));
    system
}

/// Write parameters then the command byte
pub(super) fn send_command(system: &mut System, cmd: u8, params: &[u8]) {
    system.write_register(0, 0x01);
    for &p in params {
        system.write_register(1, p);
    }
    system.write_register(0, 0x00);
    system.write_register(1, cmd);
}

/// Wait for the next interrupt, acknowledge it, return it with the response
pub(super) fn wait_irq(system: &mut System) -> (IrqType, Vec<u8>) {
    assert!(
        system.run_until_irq(MAX_WAIT),
        "no interrupt within {} cycles",
        MAX_WAIT
    );
    let response = system.cdrom().response_bytes();
    let irq = system.acknowledge_irq().expect("latched interrupt");
    (irq, response)
}

/// Send a command and wait for its first answer
pub(super) fn command(system: &mut System, cmd: u8, params: &[u8]) -> (IrqType, Vec<u8>) {
    send_command(system, cmd, params);
    wait_irq(system)
}

/// Drain the transfer buffer through port 2
pub(super) fn read_sector_bytes(system: &mut System) -> Vec<u8> {
    (0..SECTOR_SIZE).map(|_| system.read_register(2)).collect()
}
