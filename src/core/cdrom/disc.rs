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

//! Disc backends
//!
//! The controller reads media through the [`DiscBackend`] trait. The bundled
//! implementation, [`DiscImage`], loads a single-file .cue/.bin image.
//!
//! All positions exchanged with the controller are absolute disc positions:
//! the first sector of the image is 00:02:00 (LBA 0).

use std::path::{Path, PathBuf};

use super::{CDPosition, SECTOR_SIZE};
use crate::core::error::CdRomError;

/// Source of sectors and table-of-contents data
pub trait DiscBackend {
    /// Whether readable media is present
    fn is_present(&self) -> bool {
        true
    }

    /// First and last track numbers
    fn track_range(&self) -> Option<(u8, u8)>;

    /// Absolute start of `track` (track 0 is the lead-out)
    fn track_start(&self, track: u8) -> Option<CDPosition>;

    /// Raw 2352-byte sector at `position`
    fn read_sector(&mut self, position: &CDPosition) -> Result<Vec<u8>, CdRomError>;

    /// Sector at `position` decoded as interleaved 16-bit stereo PCM
    ///
    /// CD-DA sectors hold 588 little-endian left/right sample pairs.
    fn read_audio_sector(&mut self, position: &CDPosition) -> Result<Vec<i16>, CdRomError> {
        let raw = self.read_sector(position)?;
        Ok(raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect())
    }
}

/// Disc image loaded from .bin/.cue files
///
/// # Example
///
/// ```no_run
/// use psx_cdrom::core::cdrom::{CDPosition, DiscBackend, DiscImage};
///
/// let mut disc = DiscImage::load("game.cue").unwrap();
/// let sector = disc.read_sector(&CDPosition::new(0, 2, 0)).unwrap();
/// assert_eq!(sector.len(), 2352);
/// ```
#[derive(Debug)]
pub struct DiscImage {
    /// Tracks on the disc
    tracks: Vec<Track>,

    /// Raw sector data from .bin file
    data: Vec<u8>,
}

/// CD-ROM track information
#[derive(Debug, Clone)]
pub struct Track {
    /// Track number (1-99)
    pub number: u8,

    /// Track type (Mode1/2352, Mode2/2352, Audio)
    pub track_type: TrackType,

    /// Absolute start position (INDEX 01 + 2 second lead-in)
    pub start_position: CDPosition,

    /// Length in sectors
    pub length_sectors: u32,

    /// Byte offset in .bin file
    pub file_offset: u64,
}

/// CD-ROM track type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    /// Data track, 2352 bytes per sector (Mode 1)
    Mode1_2352,
    /// XA track, 2352 bytes per sector (Mode 2)
    Mode2_2352,
    /// CD-DA audio, 2352 bytes per sector
    Audio,
}

impl DiscImage {
    /// Load a disc image from a .cue file
    ///
    /// # Arguments
    ///
    /// * `cue_path` - Path to the .cue file
    ///
    /// # Returns
    ///
    /// - `Ok(DiscImage)` if loading succeeded
    /// - `Err(CdRomError)` if the cue sheet is malformed or the .bin file
    ///   cannot be read
    pub fn load(cue_path: impl AsRef<Path>) -> Result<Self, CdRomError> {
        let cue_path = cue_path.as_ref();
        let cue_data = std::fs::read_to_string(cue_path)?;
        let bin_path = Self::bin_path_from_cue(cue_path, &cue_data)?;

        let data = std::fs::read(&bin_path).map_err(|e| {
            CdRomError::DiscLoadError(format!(
                "Failed to read bin file '{}': {}",
                bin_path.display(),
                e
            ))
        })?;

        let disc = Self::from_parts(&cue_data, data)?;
        log::info!(
            "Loaded disc image: {} tracks, {} sectors",
            disc.tracks.len(),
            disc.sector_count()
        );
        Ok(disc)
    }

    /// Build an image from cue sheet text and the raw .bin contents
    pub fn from_parts(cue_data: &str, data: Vec<u8>) -> Result<Self, CdRomError> {
        let mut tracks = Self::parse_cue(cue_data)?;
        if tracks.is_empty() {
            return Err(CdRomError::DiscLoadError(
                "No TRACK entries found in .cue file".to_string(),
            ));
        }
        Self::calculate_track_lengths(&mut tracks, data.len());
        Ok(Self { tracks, data })
    }

    /// Resolve the .bin path named by the first FILE directive
    fn bin_path_from_cue(cue_path: &Path, cue_data: &str) -> Result<PathBuf, CdRomError> {
        let file_name = cue_data
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("FILE"))
            .find_map(|line| {
                let start = line.find('"')?;
                let end = line[start + 1..].find('"')?;
                Some(&line[start + 1..start + 1 + end])
            })
            .ok_or_else(|| {
                CdRomError::DiscLoadError("No FILE directive found in .cue file".to_string())
            })?;

        Ok(match cue_path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        })
    }

    /// Parse .cue file content to extract track information
    ///
    /// INDEX 01 times are file-relative; track starts are stored as absolute
    /// disc positions.
    pub(super) fn parse_cue(cue_data: &str) -> Result<Vec<Track>, CdRomError> {
        let mut tracks = Vec::new();
        let mut current_track: Option<Track> = None;

        for line in cue_data.lines() {
            let line = line.trim();

            if line.starts_with("TRACK") {
                if let Some(track) = current_track.take() {
                    tracks.push(track);
                }

                let parts: Vec<&str> = line.split_whitespace().collect();
                let number = parts
                    .get(1)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        CdRomError::DiscLoadError(format!("Invalid TRACK line: '{}'", line))
                    })?;
                let track_type =
                    Self::parse_track_type(parts.get(2).copied().unwrap_or("MODE2/2352"));

                current_track = Some(Track {
                    number,
                    track_type,
                    start_position: CDPosition::default(),
                    length_sectors: 0,
                    file_offset: 0,
                });
            } else if line.starts_with("INDEX 01") {
                if let Some(ref mut track) = current_track {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if let Some(time_str) = parts.get(2) {
                        let file_position = Self::parse_msf(time_str)?;
                        let file_sector = Self::msf_to_frames(&file_position);
                        track.file_offset = file_sector as u64 * SECTOR_SIZE as u64;
                        track.start_position = CDPosition::from_lba(file_sector as i32);
                    }
                }
            }
        }

        if let Some(track) = current_track {
            tracks.push(track);
        }

        Ok(tracks)
    }

    /// Parse MSF time string (MM:SS:FF)
    pub(super) fn parse_msf(msf: &str) -> Result<CDPosition, CdRomError> {
        let parts: Vec<&str> = msf.split(':').collect();
        if parts.len() != 3 {
            return Err(CdRomError::DiscLoadError(format!(
                "Invalid MSF format: '{}'",
                msf
            )));
        }

        let field = |s: &str, name: &str| -> Result<u8, CdRomError> {
            s.parse().map_err(|_| {
                CdRomError::DiscLoadError(format!("Invalid {} in MSF: '{}'", name, msf))
            })
        };

        Ok(CDPosition::new(
            field(parts[0], "minute")?,
            field(parts[1], "second")?,
            field(parts[2], "sector")?,
        ))
    }

    /// Parse track type string from .cue file
    pub(super) fn parse_track_type(s: &str) -> TrackType {
        match s {
            "MODE1/2352" => TrackType::Mode1_2352,
            "MODE2/2352" => TrackType::Mode2_2352,
            "AUDIO" => TrackType::Audio,
            _ => TrackType::Mode2_2352,
        }
    }

    /// Calculate track lengths based on file size and start offsets
    pub(super) fn calculate_track_lengths(tracks: &mut [Track], file_size: usize) {
        let sector_size = SECTOR_SIZE as u64;
        for i in 0..tracks.len() {
            let this_offset = tracks[i].file_offset;
            let end_offset = tracks
                .get(i + 1)
                .map_or(file_size as u64, |next| next.file_offset);
            tracks[i].length_sectors =
                (end_offset.saturating_sub(this_offset) / sector_size) as u32;
        }
    }

    /// Frames counted from 00:00:00 (no lead-in adjustment)
    fn msf_to_frames(pos: &CDPosition) -> u32 {
        (pos.minute as u32 * 60 + pos.second as u32) * 75 + pos.sector as u32
    }

    /// Number of whole sectors in the image
    pub fn sector_count(&self) -> usize {
        self.data.len() / SECTOR_SIZE
    }

    /// Get the number of tracks on the disc
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get track information by track number
    pub fn get_track(&self, track_num: u8) -> Option<&Track> {
        self.tracks.iter().find(|t| t.number == track_num)
    }

    /// Raw sector slice at `position`
    fn sector_slice(&self, position: &CDPosition) -> Result<&[u8], CdRomError> {
        let lba = position.to_lba();
        if lba < 0 {
            return Err(CdRomError::InvalidSector { sector: lba });
        }

        let offset = lba as usize * SECTOR_SIZE;
        self.data
            .get(offset..offset + SECTOR_SIZE)
            .ok_or(CdRomError::InvalidSector { sector: lba })
    }
}

impl DiscBackend for DiscImage {
    fn track_range(&self) -> Option<(u8, u8)> {
        let first = self.tracks.iter().map(|t| t.number).min()?;
        let last = self.tracks.iter().map(|t| t.number).max()?;
        Some((first, last))
    }

    fn track_start(&self, track: u8) -> Option<CDPosition> {
        if track == 0 {
            return Some(CDPosition::from_lba(self.sector_count() as i32));
        }
        self.get_track(track).map(|t| t.start_position)
    }

    fn read_sector(&mut self, position: &CDPosition) -> Result<Vec<u8>, CdRomError> {
        self.sector_slice(position).map(<[u8]>::to_vec)
    }
}
