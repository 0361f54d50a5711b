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

/// Emulator error types
///
/// These errors only surface at the Rust boundary (loading disc images,
/// reading and writing save states). Faults of the emulated drive itself are
/// reported to the emulated CPU as status bits and interrupts instead.
use thiserror::Error;

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CD-ROM error: {0}")]
    CdRom(#[from] CdRomError),

    #[error("Save state error: {0}")]
    SaveState(#[from] SaveStateError),
}

/// CD-ROM-specific error types
#[derive(Error, Debug)]
pub enum CdRomError {
    #[error("No disc inserted")]
    NoDisc,

    #[error("Invalid sector: {sector}")]
    InvalidSector { sector: i32 },

    #[error("Read error at sector {sector}: {reason}")]
    ReadError { sector: i32, reason: String },

    #[error("Disc load error: {0}")]
    DiscLoadError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Save state error types
#[derive(Error, Debug)]
pub enum SaveStateError {
    #[error("Failed to encode save state: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode save state: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Incompatible save state version: expected {expected}, got {got}")]
    IncompatibleVersion { expected: u32, got: u32 },

    #[error("Invalid CD-ROM state: {0}")]
    InvalidState(String),

    #[error("Failed to render save state as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
