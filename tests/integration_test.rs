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

//! Integration tests driving the controller through the public System API

mod common;

use common::assertions::{assert_answer, assert_sector_header};
use common::fixtures::{
    create_system_with_disc, data_sector, execute, next_answer, read_data, send_command,
};
use psx_cdrom::core::cdrom::{CDPosition, DriveState, IrqType, StatusFlags};
use psx_cdrom::core::save_state::SaveState;
use psx_cdrom::core::system::System;
use tempfile::TempDir;

#[test]
fn test_system_initialization() {
    let system = System::new();

    assert_eq!(system.total_cycles(), 0);
    assert!(!system.cdrom().has_disc());
    assert_eq!(system.cdrom().drive_state(), DriveState::Idle);
    assert_eq!(system.cdrom().position(), CDPosition::new(0, 2, 0));
}

#[test]
fn test_system_reset_keeps_clock_at_zero() {
    let mut system = System::new();
    send_command(&mut system, 0x01, &[]);
    system.run(500);

    system.reset();

    assert_eq!(system.total_cycles(), 0);
    assert!(
        !system.run_until_irq(10_000),
        "reset left a command in flight"
    );
}

#[test]
fn test_getstat_without_disc() {
    let mut system = System::new();

    let answer = execute(&mut system, 0x01, &[]);

    assert_answer(&answer, IrqType::Acknowledge, &[0x02]);
    assert_eq!(system.total_cycles(), 1000);
}

#[test]
fn test_cpu_interrupt_line_follows_controller() {
    let mut system = System::new();
    send_command(&mut system, 0x01, &[]);

    assert!(system.run_until_irq(10_000));
    assert!(system.interrupts().is_pending());

    system.acknowledge_irq();
    assert!(!system.interrupts().is_pending());
}

#[test]
fn test_bios_version_query() {
    let mut system = System::new();

    let answer = execute(&mut system, 0x19, &[0x20]);

    assert_answer(&answer, IrqType::Acknowledge, &[0x94, 0x09, 0x19, 0x94]);
}

#[test]
fn test_getid_without_disc() {
    let mut system = System::new();

    let answer = execute(&mut system, 0x1A, &[]);

    assert_answer(&answer, IrqType::DiskError, &[0x11, 0x80]);
}

#[test]
fn test_disc_identification() {
    let dir = TempDir::new().unwrap();
    let mut system = create_system_with_disc(&dir);

    let getid = execute(&mut system, 0x1A, &[]);
    assert_answer(
        &getid,
        IrqType::Complete,
        &[0x02, 0x02, 0x00, 0x00, 0x00, b'S', b'C', b'E', b'X'],
    );

    let gettn = execute(&mut system, 0x13, &[]);
    assert_answer(&gettn, IrqType::Acknowledge, &[0x02, 0x01, 0x02]);
}

#[test]
fn test_read_session_delivers_sectors_in_order() {
    let dir = TempDir::new().unwrap();
    let mut system = create_system_with_disc(&dir);

    let setloc = execute(&mut system, 0x02, &CDPosition::from_lba(5).to_bcd());
    assert_answer(&setloc, IrqType::Acknowledge, &[0x02]);

    let (irq, _) = execute(&mut system, 0x06, &[]);
    assert_eq!(irq, IrqType::Acknowledge);

    for lba in 5..9 {
        let (irq, _) = next_answer(&mut system);
        assert_eq!(irq, IrqType::DataReady, "sector {}", lba);

        let sector = read_data(&mut system);
        assert_sector_header(&sector, CDPosition::from_lba(lba as i32).to_bcd());
        assert_eq!(sector, data_sector(lba));
    }

    assert!(system.cdrom().stat().contains(StatusFlags::READING));

    let (irq, _) = execute(&mut system, 0x09, &[]);
    assert_eq!(irq, IrqType::Acknowledge);
    let (irq, response) = next_answer(&mut system);
    assert_eq!(irq, IrqType::Complete);
    assert_eq!(response, vec![0x02]);
}

#[test]
fn test_save_state_file_round_trip_mid_read() {
    let dir = TempDir::new().unwrap();
    let mut system = create_system_with_disc(&dir);

    execute(&mut system, 0x02, &CDPosition::from_lba(2).to_bcd());
    execute(&mut system, 0x06, &[]);
    for _ in 0..2 {
        next_answer(&mut system);
        read_data(&mut system);
    }

    let state_path = dir.path().join("session.state");
    system.save_state().save_to_file(&state_path).unwrap();

    let mut expected = Vec::new();
    for _ in 0..2 {
        next_answer(&mut system);
        expected.push((system.total_cycles(), read_data(&mut system)));
    }

    let restored_dir = TempDir::new().unwrap();
    let mut restored = create_system_with_disc(&restored_dir);
    let state = SaveState::load_from_file(&state_path).unwrap();
    restored.load_state(&state).unwrap();

    let mut actual = Vec::new();
    for _ in 0..2 {
        next_answer(&mut restored);
        actual.push((restored.total_cycles(), read_data(&mut restored)));
    }

    assert_eq!(actual, expected);
    assert_eq!(actual[0].1, data_sector(4));
}

#[test]
fn test_save_state_json_contains_metadata() {
    let system = System::new();

    let json = system.save_state().to_json().unwrap();

    assert!(json.contains("\"version\": 1"));
    assert!(json.contains("NO_DISC"));
}

#[test]
fn test_eject_and_reinsert_disc() {
    let dir = TempDir::new().unwrap();
    let mut system = create_system_with_disc(&dir);

    let disc = system.eject_disc().expect("disc was loaded");
    assert!(system.cdrom().stat().is_empty());

    let getid = execute(&mut system, 0x1A, &[]);
    assert_eq!(getid.0, IrqType::DiskError);

    system.insert_disc(disc);
    assert_eq!(system.cdrom().drive_state(), DriveState::SpinningUp);

    system.run(3_000_000);
    assert_eq!(system.cdrom().drive_state(), DriveState::Idle);
    assert!(system.cdrom().stat().contains(StatusFlags::SPINNING));

    let getid = execute(&mut system, 0x1A, &[]);
    assert_eq!(getid.0, IrqType::Complete);
}

#[test]
fn test_audio_track_playback_fills_sample_buffer() {
    let dir = TempDir::new().unwrap();
    let mut system = create_system_with_disc(&dir);

    let (irq, _) = execute(&mut system, 0x03, &[0x02]);
    assert_eq!(irq, IrqType::Acknowledge);

    system.run(5_000_000);

    assert_eq!(system.cdrom().drive_state(), DriveState::Playing);
    assert!(system.cdrom().stat().contains(StatusFlags::PLAYING));
    assert!(system.cdrom().cd_audio().buffered_samples() > 0);
    assert!(system.cdrom().position().to_lba() >= 20);
}
