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

//! Seek timing model
//!
//! Seek time depends only on the absolute distance in sectors:
//!
//! | Distance  | Type      | Ticks                                   |
//! |-----------|-----------|-----------------------------------------|
//! | 0         | None      | 33,868 (~1ms)                           |
//! | 1-3       | Forward   | 33,868 (rotational wait only)           |
//! | 4-16      | TrackJump | 135,472 + d * 5,000                     |
//! | 17-1000   | Medium    | 677,360 + d * 200                       |
//! | >1000     | Long      | 3,386,880 + d * 100, capped at 900ms    |

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use super::PSXCLK;

/// Minimum seek time (~1ms)
pub const MIN_SEEK_TICKS: u32 = 33_868;

/// Base time for track jumps (~4ms)
pub const SEEK_TICKS_SHORT: u32 = 135_472;

/// Base time for medium seeks (~20ms)
pub const SEEK_TICKS_MEDIUM_BASE: u32 = 677_360;

/// Base time for sled seeks (~100ms)
pub const SEEK_TICKS_LONG_BASE: u32 = 3_386_880;

/// Upper bound for any seek
pub const MAX_SEEK_TICKS: u32 = ms_to_cycles(900);

/// Convert milliseconds to CPU cycles
pub const fn ms_to_cycles(ms: u32) -> u32 {
    (ms as u64 * PSXCLK as u64 / 1000) as u32
}

/// Seek classification by distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum SeekType {
    /// Already there
    #[default]
    None,
    /// 1-3 sectors
    Forward,
    /// 4-16 sectors
    TrackJump,
    /// 17-1000 sectors
    Medium,
    /// More than 1000 sectors
    Long,
}

impl SeekType {
    /// Classify a seek distance
    pub fn classify(distance: u32) -> Self {
        match distance {
            0 => SeekType::None,
            1..=3 => SeekType::Forward,
            4..=16 => SeekType::TrackJump,
            17..=1000 => SeekType::Medium,
            _ => SeekType::Long,
        }
    }
}

/// Pending seek computed by SetLoc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekDescriptor {
    /// Absolute LBA distance
    pub distance: u32,
    /// Classification of `distance`
    pub seek_type: SeekType,
    /// Whether a seek/read/play command still has to consume the target
    pub pending: bool,
}

impl SeekDescriptor {
    /// Describe the seek from `from_lba` to `to_lba`
    ///
    /// The target stays pending even at distance 0: the head may still move
    /// before the next seek, read or play consumes it.
    pub fn between(from_lba: i32, to_lba: i32) -> Self {
        let distance = from_lba.abs_diff(to_lba);
        Self {
            distance,
            seek_type: SeekType::classify(distance),
            pending: true,
        }
    }
}

/// Seek duration in cycles between two LBAs
///
/// Symmetric in its arguments.
pub fn calculate_seek_ticks(from_lba: i32, to_lba: i32) -> u32 {
    let distance = from_lba.abs_diff(to_lba);

    match SeekType::classify(distance) {
        SeekType::None | SeekType::Forward => MIN_SEEK_TICKS,
        SeekType::TrackJump => SEEK_TICKS_SHORT + distance * 5_000,
        SeekType::Medium => SEEK_TICKS_MEDIUM_BASE + distance * 200,
        SeekType::Long => {
            let ticks = SEEK_TICKS_LONG_BASE as u64 + distance as u64 * 100;
            ticks.min(MAX_SEEK_TICKS as u64) as u32
        }
    }
}
