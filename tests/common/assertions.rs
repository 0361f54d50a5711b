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

//! Custom assertions for CD-ROM testing

use psx_cdrom::core::cdrom::IrqType;

/// Assert an answer has the expected interrupt type and response bytes
#[allow(dead_code)]
pub fn assert_answer(answer: &(IrqType, Vec<u8>), irq: IrqType, response: &[u8]) {
    assert_eq!(
        answer.0, irq,
        "Interrupt mismatch: expected INT{}, got INT{} (response {:02X?})",
        irq as u8, answer.0 as u8, answer.1
    );
    assert_eq!(
        answer.1.as_slice(),
        response,
        "Response mismatch for INT{}: expected {:02X?}, got {:02X?}",
        irq as u8,
        response,
        answer.1
    );
}

/// Assert the sector header carries the expected BCD address
#[allow(dead_code)]
pub fn assert_sector_header(sector: &[u8], bcd_msf: [u8; 3]) {
    assert_eq!(
        &sector[12..15],
        &bcd_msf,
        "Sector header mismatch: expected {:02X?}, got {:02X?}",
        bcd_msf,
        &sector[12..15]
    );
}
