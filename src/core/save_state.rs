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

//! Save state serialization
//!
//! A save state captures everything needed to resume the controller at an
//! exact cycle:
//! - Metadata (timestamp, game ID, cycle count)
//! - CD-ROM state (FIFOs, drive/command phases, position, transfer buffer,
//!   interrupt latch, generation counters)
//! - The pending CD-ROM events on the timing queue
//! - Interrupt controller state (I_STAT, I_MASK)
//!
//! The inserted disc is not part of the state; the frontend re-inserts it.
//!
//! # Save State Format
//!
//! States are encoded with bincode (standard config). The component states
//! are explicit field-by-field structures, so the format does not depend on
//! the in-memory layout of the controller.
//!
//! # Version Compatibility
//!
//! Loading a state with a different version fails with
//! [`SaveStateError::IncompatibleVersion`].
//!
//! # Example
//!
//! ```
//! use psx_cdrom::core::save_state::SaveState;
//! use psx_cdrom::core::system::System;
//!
//! let mut system = System::new();
//! system.run(10_000);
//!
//! let bytes = system.save_state().to_bytes().unwrap();
//! let state = SaveState::from_bytes(&bytes).unwrap();
//!
//! let mut restored = System::new();
//! restored.load_state(&state).unwrap();
//! assert_eq!(restored.total_cycles(), 10_000);
//! ```

use bincode::{config, Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::core::cdrom::{CdromEvent, CommandState, DriveState, Generations, PlayScan, SeekType};
use crate::core::error::SaveStateError;
use crate::core::timing::{GlobalTicks, TimingEvent};

/// Save state version for compatibility checking
///
/// Incremented whenever the format changes incompatibly.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Complete controller save state
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct SaveState {
    /// Version number for compatibility checking
    pub version: u32,

    /// Save state metadata
    pub metadata: SaveStateMetadata,

    /// CD-ROM controller state
    pub cdrom: CDROMState,

    /// Clock and pending CD-ROM events
    pub timing: TimingState,

    /// Interrupt controller state
    pub interrupts: InterruptState,
}

/// Save state metadata
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
#[bincode(encode_bounds = "", decode_bounds = "")]
pub struct SaveStateMetadata {
    /// Timestamp when the save state was created
    #[bincode(with_serde)]
    pub timestamp: DateTime<Utc>,

    /// Game ID from disc ("UNKNOWN" / "NO_DISC")
    pub game_id: String,

    /// Machine cycle count at save time
    pub cycle_count: u64,
}

/// CD-ROM controller state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CDROMState {
    /// Registers
    pub ctrl: u8,
    pub stat_p: u8,
    pub mode: u8,
    pub interrupt_enable: u8,

    /// Interrupt type waiting for acknowledge (0 = none)
    pub irq_type: u8,

    /// Phases
    pub drive_state: DriveState,
    pub command_state: CommandState,
    pub motor_on: bool,
    pub shell_open: bool,

    /// Positions as (minute, second, sector) in decimal
    pub position: (u8, u8, u8),
    pub seek_target: (u8, u8, u8),

    /// Seek descriptor
    pub seek_distance: u32,
    pub seek_type: SeekType,
    pub seek_pending: bool,

    /// Command bookkeeping
    pub current_command: u8,
    pub queued_command: Option<u8>,
    pub command_start_cycle: u64,

    /// FIFO contents, oldest first
    pub param_fifo: Vec<u8>,
    pub response_fifo: Vec<u8>,

    /// Transfer buffer
    pub transfer_buffer: Vec<u8>,
    pub transfer_index: u32,
    pub transfer_size: u32,
    pub data_ready: bool,
    pub last_header: [u8; 8],

    /// Audio
    pub xa_file: u8,
    pub xa_channel: u8,
    pub xa_playing: bool,
    pub cdda_playing: bool,
    pub cdda_track: u8,
    pub cdda_report_count: u8,
    pub play_end: Option<(u8, u8, u8)>,
    pub scan: PlayScan,
    pub muted: bool,
    pub volume_left: i16,
    pub volume_right: i16,

    /// Errors
    pub error_code: u8,
    pub read_error_count: u8,

    /// Session generation counters
    pub generations: Generations,
}

/// Machine clock and pending CD-ROM events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TimingState {
    /// Global tick counter at save time
    pub global_tick_counter: GlobalTicks,

    /// Pending events, soonest first
    pub events: Vec<TimingEvent<CdromEvent>>,
}

/// Interrupt controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct InterruptState {
    /// Interrupt status register
    pub i_stat: u16,

    /// Interrupt mask register
    pub i_mask: u16,
}

impl SaveState {
    /// Encode with bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        Ok(bincode::encode_to_vec(self, config::standard())?)
    }

    /// Decode with bincode and verify the version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaveStateError> {
        let (state, _): (SaveState, usize) =
            bincode::decode_from_slice(bytes, config::standard())?;

        if state.version != SAVE_STATE_VERSION {
            return Err(SaveStateError::IncompatibleVersion {
                expected: SAVE_STATE_VERSION,
                got: state.version,
            });
        }

        Ok(state)
    }

    /// Save state to file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Serialization fails
    /// - File cannot be created or written
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use psx_cdrom::core::save_state::SaveState;
    /// # let state = SaveState::default();
    /// state.save_to_file("save.state").unwrap();
    /// ```
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveStateError> {
        let encoded = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load state from file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be opened or read
    /// - Deserialization fails
    /// - Version is incompatible
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SaveStateError> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    /// Human-readable dump for debugging
    pub fn to_json(&self) -> Result<String, SaveStateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SaveState {
    fn default() -> Self {
        use crate::core::cdrom::CDROM;

        Self {
            version: SAVE_STATE_VERSION,
            metadata: SaveStateMetadata {
                timestamp: Utc::now(),
                game_id: "NO_DISC".to_string(),
                cycle_count: 0,
            },
            cdrom: CDROM::new().to_state(),
            timing: TimingState {
                global_tick_counter: 0,
                events: Vec::new(),
            },
            interrupts: InterruptState {
                i_stat: 0,
                i_mask: 0,
            },
        }
    }
}

/// Trait for components that can be saved and restored
///
/// # Example
///
/// ```
/// use psx_cdrom::core::cdrom::CDROM;
/// use psx_cdrom::core::save_state::StateSave;
///
/// let cdrom = CDROM::new();
/// let state = cdrom.to_state();
///
/// let mut other = CDROM::new();
/// other.restore_from_state(&state).unwrap();
/// assert_eq!(other.to_state(), state);
/// ```
pub trait StateSave {
    /// The state type for this component
    type State: Serialize + for<'de> Deserialize<'de>;

    /// Convert this component to a saveable state
    fn to_state(&self) -> Self::State;

    /// Restore this component from a saved state
    ///
    /// Fails without modifying the component if the state is inconsistent.
    fn restore_from_state(&mut self, state: &Self::State) -> Result<(), SaveStateError>;
}
