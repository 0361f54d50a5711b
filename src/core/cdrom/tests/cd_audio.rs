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

use super::super::cd_audio::SAMPLES_PER_SECTOR;
use super::super::*;

#[test]
fn test_empty_queue_yields_silence() {
    let mut audio = CDAudio::new();
    assert_eq!(audio.buffered_samples(), 0);
    assert_eq!(audio.pop_sample(), (0, 0));
}

#[test]
fn test_volume_scaling() {
    let mut audio = CDAudio::new();
    audio.set_volume(0x40, 0x00);
    audio.push_samples(&[1000, 1000]);
    assert_eq!(audio.pop_sample(), (500, 0));
}

#[test]
fn test_volume_clamps() {
    let mut audio = CDAudio::new();
    audio.set_volume(0xFF, 0xFF);
    audio.push_samples(&[i16::MAX, i16::MIN]);
    assert_eq!(audio.pop_sample(), (i16::MAX, i16::MIN));
}

#[test]
fn test_odd_trailing_sample_is_ignored() {
    let mut audio = CDAudio::new();
    audio.push_samples(&[1, 2, 3]);
    assert_eq!(audio.buffered_samples(), 1);
}

#[test]
fn test_overflow_drops_oldest() {
    let mut audio = CDAudio::new();
    let capacity = SAMPLES_PER_SECTOR * 8;

    audio.push_samples(&[7, 7]);
    audio.push_silence(capacity);
    assert_eq!(audio.buffered_samples(), capacity);

    // The (7, 7) frame was pushed out
    assert_eq!(audio.pop_sample(), (0, 0));
}

#[test]
fn test_xa_queue_is_capped() {
    let mut audio = CDAudio::new();
    for i in 0..10u8 {
        audio.push_xa_sector(vec![i; SECTOR_SIZE]);
    }
    assert_eq!(audio.buffered_xa_sectors(), 8);
    assert_eq!(audio.pop_xa_sector().map(|s| s[0]), Some(2));
}

#[test]
fn test_clear() {
    let mut audio = CDAudio::new();
    audio.push_samples(&[1, 2]);
    audio.push_xa_sector(vec![0; SECTOR_SIZE]);
    audio.clear();
    assert_eq!(audio.buffered_samples(), 0);
    assert_eq!(audio.pop_xa_sector(), None);
}
