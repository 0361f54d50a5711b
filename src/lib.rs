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

//! PlayStation CD-ROM controller emulation
//!
//! This library emulates the PlayStation CD-ROM controller as an
//! event-driven peripheral: command handling, seek timing, sector reads,
//! CD-DA playback and interrupt delivery, plus save states for all of it.
//!
//! # Example
//!
//! ```
//! use psx_cdrom::core::system::System;
//!
//! let mut system = System::new();
//!
//! // GetStat
//! system.write_register(0x1F801800, 0x00);
//! system.write_register(0x1F801801, 0x01);
//! assert!(system.run_until_irq(10_000));
//!
//! let stat = system.read_register(0x1F801801);
//! assert_eq!(stat & 0x02, 0x02); // motor spinning
//! ```

pub mod core;
