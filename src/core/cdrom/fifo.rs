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

//! Parameter and response FIFOs
//!
//! Both FIFOs are 16-byte ring buffers. They never fail: a push on a full
//! FIFO is dropped (the hardware saturates) and a pop on an empty one
//! returns 0.

/// Capacity of the parameter and response FIFOs
pub const FIFO_SIZE: usize = 16;

/// Fixed-capacity byte ring buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fifo {
    data: [u8; FIFO_SIZE],
    read_pos: usize,
    write_pos: usize,
    size: usize,
}

impl Fifo {
    /// Create an empty FIFO
    pub const fn new() -> Self {
        Self {
            data: [0; FIFO_SIZE],
            read_pos: 0,
            write_pos: 0,
            size: 0,
        }
    }

    /// Append a byte, dropping it if the FIFO is full
    ///
    /// Returns whether the byte was stored.
    pub fn push(&mut self, value: u8) -> bool {
        if self.size == FIFO_SIZE {
            log::trace!("CD-ROM: FIFO full, dropped 0x{:02X}", value);
            return false;
        }

        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % FIFO_SIZE;
        self.size += 1;
        true
    }

    /// Remove and return the oldest byte (0 when empty)
    pub fn pop(&mut self) -> u8 {
        if self.size == 0 {
            return 0;
        }

        let value = self.data[self.read_pos];
        self.read_pos = (self.read_pos + 1) % FIFO_SIZE;
        self.size -= 1;
        value
    }

    /// Return the oldest byte without removing it (0 when empty)
    pub fn peek(&self) -> u8 {
        if self.size == 0 {
            0
        } else {
            self.data[self.read_pos]
        }
    }

    /// Drop all queued bytes
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.size = 0;
    }

    /// Remove every queued byte, oldest first
    pub fn take_all(&mut self) -> Vec<u8> {
        let bytes: Vec<u8> = self.iter().collect();
        self.clear();
        bytes
    }

    /// Iterate over the queued bytes, oldest first
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.size).map(move |i| self.data[(self.read_pos + i) % FIFO_SIZE])
    }

    /// Rebuild a FIFO from bytes captured with [`Fifo::iter`]
    ///
    /// Bytes beyond the capacity are dropped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut fifo = Self::new();
        for &b in bytes {
            fifo.push(b);
        }
        fifo
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.size == FIFO_SIZE
    }
}

impl Default for Fifo {
    fn default() -> Self {
        Self::new()
    }
}
