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

//! Recently read sectors
//!
//! A small fully-associative cache in front of the disc backend, so that
//! re-reading sectors after a short seek does not hit the image again.
//! Replacement is round-robin.

use super::SECTOR_SIZE;

/// Number of cached sectors
pub const NUM_SECTOR_BUFFERS: usize = 8;

#[derive(Debug, Clone)]
struct SectorSlot {
    lba: i32,
    valid: bool,
    data: Vec<u8>,
}

/// Sector cache keyed by LBA
#[derive(Debug, Clone)]
pub struct SectorCache {
    slots: Vec<SectorSlot>,
    next_slot: usize,
    hits: u64,
    misses: u64,
}

impl SectorCache {
    pub fn new() -> Self {
        let slot = SectorSlot {
            lba: 0,
            valid: false,
            data: vec![0; SECTOR_SIZE],
        };
        Self {
            slots: vec![slot; NUM_SECTOR_BUFFERS],
            next_slot: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Cached copy of the sector at `lba`
    pub fn get(&mut self, lba: i32) -> Option<&[u8]> {
        match self.slots.iter().position(|s| s.valid && s.lba == lba) {
            Some(index) => {
                self.hits += 1;
                Some(self.slots[index].data.as_slice())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a sector, replacing the oldest slot
    pub fn insert(&mut self, lba: i32, data: &[u8]) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.valid && s.lba == lba) {
            slot.data.clear();
            slot.data.extend_from_slice(data);
            return;
        }

        let slot = &mut self.slots[self.next_slot];
        slot.lba = lba;
        slot.valid = true;
        slot.data.clear();
        slot.data.extend_from_slice(data);
        self.next_slot = (self.next_slot + 1) % NUM_SECTOR_BUFFERS;
    }

    /// Drop every cached sector
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            slot.valid = false;
        }
        self.next_slot = 0;
    }

    /// Number of valid slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for SectorCache {
    fn default() -> Self {
        Self::new()
    }
}
