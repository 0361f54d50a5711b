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

//! CD-ROM test modules
//!
//! Tests are organized into the following categories:
//! - `helpers`: in-memory disc and command helpers shared by the others
//! - `basic`: initialization, MSF/BCD helpers, command table
//! - `registers`: port reads and writes
//! - `commands`: command responses and phases
//! - `timing`: interrupt latch, deferral and re-assertion
//! - `pipeline`: sector reads and CD-DA playback
//! - `lid`: shell open/close, disc insert/eject
//! - `disc`: .cue/.bin loading
//! - `cd_audio`: audio output queue
//! - `state`: save state capture and restore

#[cfg(test)]
mod helpers;

#[cfg(test)]
mod basic;






#[cfg(test)]
mod disc;

#[cfg(test)]
mod cd_audio;
