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

//! Test fixtures for common test scenarios

use std::path::PathBuf;

use psx_cdrom::core::cdrom::{CDPosition, IrqType, CDROM, SECTOR_SIZE};
use psx_cdrom::core::system::System;
use tempfile::TempDir;

/// Sectors in the data track
pub const DATA_SECTORS: usize = 20;

/// Sectors in the audio track
pub const AUDIO_SECTORS: usize = 20;

/// Left/right sample stored in every audio frame
pub const AUDIO_SAMPLE: (i16, i16) = (0x1234, -0x1234);

/// Raw contents of data sector `lba`
#[allow(dead_code)]
pub fn data_sector(lba: usize) -> Vec<u8> {
    let mut sector: Vec<u8> = (0..SECTOR_SIZE).map(|i| (i * 7 + lba) as u8).collect();
    sector[0] = 0x00;
    sector[1..11].fill(0xFF);
    sector[11] = 0x00;
    sector[12..15].copy_from_slice(&CDPosition::from_lba(lba as i32).to_bcd());
    sector[15] = 0x02;
    sector[16..24].copy_from_slice(&[0, 0, 0x08, 0, 0, 0, 0x08, 0]);
    sector
}

fn audio_sector() -> Vec<u8> {
    let (left, right) = AUDIO_SAMPLE;
    let frame: Vec<u8> = left
        .to_le_bytes()
        .into_iter()
        .chain(right.to_le_bytes())
        .collect();
    frame.repeat(SECTOR_SIZE / 4)
}

/// Write a two-track .cue/.bin pair and return the .cue path
///
/// Track 1 is data (LBA 0-19), track 2 is audio (LBA 20-39).
#[allow(dead_code)]
pub fn write_test_disc(dir: &TempDir) -> PathBuf {
    let mut bin = Vec::with_capacity((DATA_SECTORS + AUDIO_SECTORS) * SECTOR_SIZE);
    for lba in 0..DATA_SECTORS {
        bin.extend(data_sector(lba));
    }
    for _ in 0..AUDIO_SECTORS {
        bin.extend(audio_sector());
    }

    let cue = "FILE \"test.bin\" BINARY\n\
               \x20 TRACK 01 MODE2/2352\n\
               \x20   INDEX 01 00:00:00\n\
               \x20 TRACK 02 AUDIO\n\
               \x20   INDEX 01 00:00:20\n";

    std::fs::write(dir.path().join("test.bin"), bin).expect("Failed to write .bin");
    let cue_path = dir.path().join("test.cue");
    std::fs::write(&cue_path, cue).expect("Failed to write .cue");
    cue_path
}

/// System with the test disc loaded
#[allow(dead_code)]
pub fn create_system_with_disc(dir: &TempDir) -> System {
    let cue_path = write_test_disc(dir);
    let mut system = System::new();
    system
        .load_disc(cue_path.to_str().expect("UTF-8 temp path"))
        .expect("Failed to load test disc");
    system
}

/// Write parameters then the command byte
#[allow(dead_code)]
pub fn send_command(system: &mut System, cmd: u8, params: &[u8]) {
    system.write_register(CDROM::REG_STATUS, 0x01);
    for &p in params {
        system.write_register(CDROM::REG_COMMAND, p);
    }
    system.write_register(CDROM::REG_STATUS, 0x00);
    system.write_register(CDROM::REG_COMMAND, cmd);
}

/// Wait for the next interrupt, drain the response FIFO and acknowledge
#[allow(dead_code)]
pub fn next_answer(system: &mut System) -> (IrqType, Vec<u8>) {
    assert!(
        system.run_until_irq(100_000_000),
        "no interrupt by cycle {}",
        system.total_cycles()
    );

    let mut response = Vec::new();
    while system.read_register(CDROM::REG_STATUS) & 0x20 != 0 {
        response.push(system.read_register(CDROM::REG_COMMAND));
    }

    let irq = system.acknowledge_irq().expect("interrupt latched");
    (irq, response)
}

/// Send a command and return its first answer
#[allow(dead_code)]
pub fn execute(system: &mut System, cmd: u8, params: &[u8]) -> (IrqType, Vec<u8>) {
    send_command(system, cmd, params);
    next_answer(system)
}

/// Read one full sector through the data port
#[allow(dead_code)]
pub fn read_data(system: &mut System) -> Vec<u8> {
    (0..SECTOR_SIZE)
        .map(|_| system.read_register(CDROM::REG_DATA))
        .collect()
}
