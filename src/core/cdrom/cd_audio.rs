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

//! CD audio output queue
//!
//! The controller pushes decoded CD-DA samples and raw XA audio sectors here;
//! the sound mixer (outside this crate) pulls them. CD audio is 44.1kHz,
//! 16-bit stereo PCM. Each sector carries 588 stereo samples
//! (2352 bytes / 4 bytes per sample).

use std::collections::VecDeque;

/// Stereo samples in one CD-DA sector
pub const SAMPLES_PER_SECTOR: usize = 588;

/// Sectors of PCM kept before the oldest samples are dropped
const MAX_BUFFERED_SECTORS: usize = 8;

/// Maximum queued XA sectors
const MAX_XA_SECTORS: usize = 8;

/// CD audio sample queue
///
/// # Example
///
/// ```
/// use psx_cdrom::core::cdrom::cd_audio::CDAudio;
///
/// let mut cd_audio = CDAudio::new();
/// cd_audio.push_samples(&[1000, -1000]);
/// assert_eq!(cd_audio.pop_sample(), (1000, -1000));
/// assert_eq!(cd_audio.pop_sample(), (0, 0));
/// ```
#[derive(Debug, Clone)]
pub struct CDAudio {
    /// Decoded stereo samples waiting for the mixer
    samples: VecDeque<(i16, i16)>,

    /// Raw XA audio sectors waiting for the ADPCM decoder
    xa_sectors: VecDeque<Vec<u8>>,

    /// Volume (left/right), 0x80 = unity
    pub(crate) volume_left: i16,
    pub(crate) volume_right: i16,
}

impl CDAudio {
    /// Create an empty queue at unity volume
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(SAMPLES_PER_SECTOR * MAX_BUFFERED_SECTORS),
            xa_sectors: VecDeque::new(),
            volume_left: 0x80,
            volume_right: 0x80,
        }
    }

    /// Queue interleaved left/right PCM samples
    ///
    /// When the queue is full the oldest samples are dropped.
    pub fn push_samples(&mut self, pcm: &[i16]) {
        for pair in pcm.chunks_exact(2) {
            self.push_frame(pair[0], pair[1]);
        }
    }

    /// Queue `frames` stereo frames of silence
    pub fn push_silence(&mut self, frames: usize) {
        for _ in 0..frames {
            self.push_frame(0, 0);
        }
    }

    fn push_frame(&mut self, left: i16, right: i16) {
        if self.samples.len() >= SAMPLES_PER_SECTOR * MAX_BUFFERED_SECTORS {
            self.samples.pop_front();
        }
        self.samples.push_back((left, right));
    }

    /// Next stereo sample with volume applied, or silence when empty
    pub fn pop_sample(&mut self) -> (i16, i16) {
        let Some((left, right)) = self.samples.pop_front() else {
            return (0, 0);
        };

        // Scale by volume/128
        let left = (left as i32 * self.volume_left as i32) >> 7;
        let right = (right as i32 * self.volume_right as i32) >> 7;

        (
            left.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            right.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
        )
    }

    /// Queue a raw XA audio sector
    pub fn push_xa_sector(&mut self, sector: Vec<u8>) {
        if self.xa_sectors.len() >= MAX_XA_SECTORS {
            log::trace!("CD-ROM: XA queue full, dropping oldest sector");
            self.xa_sectors.pop_front();
        }
        self.xa_sectors.push_back(sector);
    }

    /// Next raw XA audio sector
    pub fn pop_xa_sector(&mut self) -> Option<Vec<u8>> {
        self.xa_sectors.pop_front()
    }

    /// Set volume for CD audio
    ///
    /// # Arguments
    ///
    /// * `left` - Left channel volume (0-255)
    /// * `right` - Right channel volume (0-255)
    pub fn set_volume(&mut self, left: u8, right: u8) {
        self.volume_left = left as i16;
        self.volume_right = right as i16;
    }

    /// Queued stereo samples
    pub fn buffered_samples(&self) -> usize {
        self.samples.len()
    }

    /// Queued XA sectors
    pub fn buffered_xa_sectors(&self) -> usize {
        self.xa_sectors.len()
    }

    /// Drop everything queued
    pub fn clear(&mut self) {
        self.samples.clear();
        self.xa_sectors.clear();
    }
}

impl Default for CDAudio {
    fn default() -> Self {
        Self::new()
    }
}
