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

//! Basic CDROM functionality tests (initialization, reset, addressing)

use super::super::*;
use super::helpers::*;

#[test]
fn test_cdrom_initialization() {
    let cdrom = CDROM::new();
    assert_eq!(cdrom.position, CDPosition::new(0, 2, 0));
    assert_eq!(cdrom.stat_p, StatusFlags::SPINNING);
    assert_eq!(cdrom.drive_state, DriveState::Idle);
    assert_eq!(cdrom.command_state, CommandState::Idle);
    assert_eq!(cdrom.interrupt_enable(), 0x1F);
    assert!(cdrom.motor_on);
    assert!(!cdrom.has_disc());
    assert!(!cdrom.irq_pending());
    assert_eq!(cdrom.game_id(), "NO_DISC");
}

#[test]
fn test_bcd_conversion() {
    assert_eq!(bcd_to_dec(0x23), 23);
    assert_eq!(bcd_to_dec(0x00), 0);
    assert_eq!(bcd_to_dec(0x99), 99);

    assert_eq!(dec_to_bcd(23), 0x23);
    assert_eq!(dec_to_bcd(0), 0x00);
    assert_eq!(dec_to_bcd(99), 0x99);
}

#[test]
fn test_msf_to_lba() {
    let pos = CDPosition::new(0, 2, 0);
    assert_eq!(pos.to_lba(), 0); // Start of data (after 2-second pregap)

    let pos = CDPosition::new(0, 3, 0);
    assert_eq!(pos.to_lba(), 75);

    let pos = CDPosition::new(1, 0, 0);
    assert_eq!(pos.to_lba(), 4350);
}

#[test]
fn test_lba_to_msf() {
    assert_eq!(CDPosition::from_lba(0), CDPosition::new(0, 2, 0));
    assert_eq!(CDPosition::from_lba(75), CDPosition::new(0, 3, 0));
    assert_eq!(CDPosition::from_lba(-150), CDPosition::new(0, 0, 0));

    // Before the start of the disc clamps
    assert_eq!(CDPosition::from_lba(-500), CDPosition::new(0, 0, 0));
}

#[test]
fn test_msf_from_bcd() {
    assert_eq!(
        CDPosition::from_bcd(0x00, 0x02, 0x00),
        Some(CDPosition::new(0, 2, 0))
    );
    assert_eq!(
        CDPosition::from_bcd(0x12, 0x34, 0x56),
        Some(CDPosition::new(12, 34, 56))
    );

    // Seconds >= 60, frames >= 75, non-BCD nibbles
    assert_eq!(CDPosition::from_bcd(0x00, 0x60, 0x00), None);
    assert_eq!(CDPosition::from_bcd(0x00, 0x00, 0x75), None);
    assert_eq!(CDPosition::from_bcd(0x0A, 0x00, 0x00), None);

    assert_eq!(CDPosition::new(12, 34, 56).to_bcd(), [0x12, 0x34, 0x56]);
}

#[test]
fn test_position_advance_carries() {
    let mut pos = CDPosition::new(0, 2, 74);
    pos.advance();
    assert_eq!(pos, CDPosition::new(0, 3, 0));

    let mut pos = CDPosition::new(0, 59, 74);
    pos.advance();
    assert_eq!(pos, CDPosition::new(1, 0, 0));

    let mut pos = CDPosition::new(0, 2, 0);
    pos.advance();
    assert_eq!(pos.to_lba(), 1);
}

#[test]
fn test_position_offset() {
    let pos = CDPosition::new(0, 2, 0);
    assert_eq!(pos.offset(5).to_lba(), 5);
    assert_eq!(pos.offset(-5), CDPosition::new(0, 1, 70));
}

#[test]
fn test_command_table() {
    assert_eq!(COMMAND_TABLE.len(), 32);
    assert_eq!(Command::from_opcode(0x01), Command::GetStat);
    assert_eq!(Command::from_opcode(0x1A), Command::GetID);
    assert_eq!(Command::from_opcode(0x1E), Command::ReadTOC);
    assert_eq!(Command::from_opcode(0x1F), Command::Invalid);
    assert_eq!(Command::from_opcode(0x50), Command::Invalid);
    assert_eq!(Command::from_opcode(0xFF), Command::Invalid);
}

#[test]
fn test_command_delays() {
    let expected = [
        (0x01, 1000),
        (0x02, 1000),
        (0x03, 2000),
        (0x06, 2000),
        (0x08, 15_000),
        (0x09, 10_000),
        (0x0A, 4_000_000),
        (0x15, 10_000),
        (0x16, 10_000),
        (0x07, 2_000_000),
        (0x1A, 33_868),
        (0x1C, 2_000_000),
        (0x1E, 45_000),
        (0x99, 1000),
    ];

    for (opcode, delay) in expected {
        assert_eq!(command_delay(opcode), delay, "opcode 0x{:02X}", opcode);
    }
}

#[test]
fn test_sector_periods() {
    assert_eq!(CYCLES_PER_SECTOR_1X, 451_584);
    assert_eq!(CYCLES_PER_SECTOR_2X, 225_792);
}

#[test]
fn test_game_id_with_disc() {
    let system = system_with_disc();
    assert!(system.cdrom().has_disc());
    assert_eq!(system.cdrom().game_id(), "UNKNOWN");
}

#[test]
fn test_reset_keeps_disc_and_invalidates_events() {
    let mut system = system_with_disc();
    send_command(&mut system, 0x01, &[]);
    let before = system.cdrom().generations;

    system.cdrom_mut().reset();

    let cdrom = system.cdrom();
    assert!(cdrom.has_disc());
    assert_eq!(cdrom.command_state, CommandState::Idle);
    assert_ne!(cdrom.generations.command, before.command);
    assert_ne!(cdrom.generations.read, before.read);

    // The pending GetStat is now stale
    system.run(2000);
    assert!(!system.cdrom().irq_pending());
}
