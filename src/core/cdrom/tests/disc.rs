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

//! Disc image loading tests

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use super::super::*;
use super::helpers::*;
use crate::core::error::CdRomError;
use crate::core::system::System;

const CUE: &str = r#"FILE "game.bin" BINARY
  TRACK 01 MODE2/2352
    INDEX 01 00:00:00
  TRACK 02 AUDIO
    INDEX 00 00:00:01
    INDEX 01 00:00:02
"#;

/// Three sectors, each filled with its own index
fn bin_data() -> Vec<u8> {
    (0..3u8)
        .flat_map(|i| std::iter::repeat_n(i + 1, SECTOR_SIZE))
        .collect()
}

fn write_image(dir: &TempDir, cue: &str) -> PathBuf {
    fs::write(dir.path().join("game.bin"), bin_data()).unwrap();
    let cue_path = dir.path().join("game.cue");
    fs::write(&cue_path, cue).unwrap();
    cue_path
}

#[test]
fn test_load_cue_bin() {
    let dir = TempDir::new().unwrap();
    let cue_path = write_image(&dir, CUE);

    let disc = DiscImage::load(&cue_path).unwrap();
    assert_eq!(disc.track_count(), 2);
    assert_eq!(disc.sector_count(), 3);
    assert_eq!(disc.track_range(), Some((1, 2)));

    let track1 = disc.get_track(1).unwrap();
    assert_eq!(track1.track_type, TrackType::Mode2_2352);
    assert_eq!(track1.start_position, CDPosition::new(0, 2, 0));
    assert_eq!(track1.length_sectors, 2);

    let track2 = disc.get_track(2).unwrap();
    assert_eq!(track2.track_type, TrackType::Audio);
    assert_eq!(track2.start_position, CDPosition::new(0, 2, 2));
    assert_eq!(track2.file_offset, 2 * SECTOR_SIZE as u64);
    assert_eq!(track2.length_sectors, 1);

    // Lead-out follows the last sector
    assert_eq!(disc.track_start(0), Some(CDPosition::new(0, 2, 3)));
    assert_eq!(disc.track_start(3), None);
}

#[test]
fn test_read_sectors_from_image() {
    let disc_data = bin_data();
    let mut disc = DiscImage::from_parts(CUE, disc_data.clone()).unwrap();

    let sector = disc.read_sector(&CDPosition::new(0, 2, 1)).unwrap();
    assert_eq!(sector.as_slice(), &disc_data[SECTOR_SIZE..2 * SECTOR_SIZE]);

    assert!(matches!(
        disc.read_sector(&CDPosition::new(0, 2, 3)),
        Err(CdRomError::InvalidSector { sector: 3 })
    ));
    assert!(matches!(
        disc.read_sector(&CDPosition::new(0, 1, 74)),
        Err(CdRomError::InvalidSector { sector: -1 })
    ));
}

#[test]
fn test_audio_sector_decodes_little_endian() {
    let mut disc = DiscImage::from_parts(CUE, bin_data()).unwrap();
    let samples = disc.read_audio_sector(&CDPosition::new(0, 2, 2)).unwrap();
    assert_eq!(samples.len(), 2 * 588);
    assert!(samples.iter().all(|&s| s == 0x0303));
}

#[test]
fn test_cue_without_tracks() {
    let err = DiscImage::from_parts("FILE \"game.bin\" BINARY\n", bin_data()).unwrap_err();
    assert!(matches!(err, CdRomError::DiscLoadError(_)));
}

#[test]
fn test_cue_with_bad_msf() {
    let cue = "FILE \"game.bin\" BINARY\n  TRACK 01 MODE2/2352\n    INDEX 01 00:xx:00\n";
    let err = DiscImage::from_parts(cue, bin_data()).unwrap_err();
    assert!(matches!(err, CdRomError::DiscLoadError(_)));

    assert!(DiscImage::parse_msf("00:02").is_err());
    assert_eq!(
        DiscImage::parse_msf("01:02:03").unwrap(),
        CDPosition::new(1, 2, 3)
    );
}

#[test]
fn test_unknown_track_type_defaults_to_mode2() {
    assert_eq!(
        DiscImage::parse_track_type("MODE1/2352"),
        TrackType::Mode1_2352
    );
    assert_eq!(DiscImage::parse_track_type("AUDIO"), TrackType::Audio);
    assert_eq!(DiscImage::parse_track_type("CDG"), TrackType::Mode2_2352);
}

#[test]
fn test_missing_files() {
    let dir = TempDir::new().unwrap();

    // No .cue at all
    let err = DiscImage::load(dir.path().join("absent.cue")).unwrap_err();
    assert!(matches!(err, CdRomError::IoError(_)));

    // .cue naming a .bin that doesn't exist
    let cue_path = dir.path().join("orphan.cue");
    fs::write(&cue_path, CUE.replace("game.bin", "orphan.bin")).unwrap();
    let err = DiscImage::load(&cue_path).unwrap_err();
    assert!(matches!(err, CdRomError::DiscLoadError(_)));

    // .cue without a FILE line
    let cue_path = dir.path().join("nofile.cue");
    fs::write(&cue_path, "TRACK 01 MODE2/2352\nINDEX 01 00:00:00\n").unwrap();
    let err = DiscImage::load(&cue_path).unwrap_err();
    assert!(matches!(err, CdRomError::DiscLoadError(_)));
}

#[test]
fn test_system_reads_image_bytes() {
    let dir = TempDir::new().unwrap();
    let cue_path = write_image(&dir, CUE);

    let mut system = System::new();
    system.load_disc(cue_path.to_str().unwrap()).unwrap();
    assert!(system.cdrom().has_disc());

    let (_, response) = command(&mut system, 0x14, &[0x02]);
    assert_eq!(response, vec![0x02, 0x00, 0x02, 0x02]);

    command(&mut system, 0x02, &[0x00, 0x02, 0x01]);
    command(&mut system, 0x06, &[]);
    let (irq, _) = wait_irq(&mut system);
    assert_eq!(irq, IrqType::DataReady);
    assert!(read_sector_bytes(&mut system).iter().all(|&b| b == 2));
}

#[test]
fn test_system_load_failure_keeps_drive_empty() {
    let dir = TempDir::new().unwrap();
    let mut system = System::new();
    let path = dir.path().join("absent.cue");
    assert!(system.load_disc(path.to_str().unwrap()).is_err());
    assert!(!system.cdrom().has_disc());
}
