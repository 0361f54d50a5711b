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

//! Interrupt latch and delivery

use super::{CdromEvent, CdromHost, CDROM};
use crate::core::timing::TickCount;

/// Interrupt type reported on port 3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IrqType {
    /// Sector delivered or play report (INT1)
    DataReady = 1,
    /// Second response (INT2)
    Complete = 2,
    /// First response (INT3)
    Acknowledge = 3,
    /// End of track reached with auto-pause (INT4)
    DataEnd = 4,
    /// Error response (INT5)
    DiskError = 5,
}

impl IrqType {
    /// Interrupt type from its port 3 code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(IrqType::DataReady),
            2 => Some(IrqType::Complete),
            3 => Some(IrqType::Acknowledge),
            4 => Some(IrqType::DataEnd),
            5 => Some(IrqType::DiskError),
            _ => None,
        }
    }

    /// Bit in the interrupt enable mask
    #[inline]
    pub fn mask_bit(self) -> u8 {
        1 << (self as u8 - 1)
    }

    /// Delay before the line is asserted again if still unacknowledged
    pub fn recheck_delay(self) -> TickCount {
        match self {
            IrqType::Acknowledge | IrqType::DataReady => 500,
            _ => 1000,
        }
    }
}

impl CDROM {
    /// Latch an interrupt and assert the line
    ///
    /// Callers defer themselves while the latch is set, so this never
    /// overwrites an unacknowledged interrupt in normal operation.
    pub(super) fn generate_irq(&mut self, irq: IrqType, host: &mut dyn CdromHost) {
        if let Some(previous) = self.irq_type {
            log::warn!("CD-ROM: {:?} overwrites unacknowledged {:?}", irq, previous);
        }

        self.irq_type = Some(irq);
        self.generations.irq = self.generations.irq.wrapping_add(1);
        log::trace!("CD-ROM: IRQ {:?} latched", irq);

        self.raise_line(irq, host);
        host.schedule_event(
            irq.recheck_delay(),
            CdromEvent::IrqRecheck {
                generation: self.generations.irq,
            },
        );
    }

    fn raise_line(&self, irq: IrqType, host: &mut dyn CdromHost) {
        if self.interrupt_enable & irq.mask_bit() != 0 {
            host.assert_interrupt();
        } else {
            log::trace!("CD-ROM: IRQ {:?} masked", irq);
        }
    }

    /// Re-assert the line if the latch is still set
    pub(super) fn irq_recheck_event(&mut self, host: &mut dyn CdromHost) {
        if let Some(irq) = self.irq_type {
            log::trace!("CD-ROM: IRQ {:?} still pending, re-asserting", irq);
            self.raise_line(irq, host);
        }
    }

    /// Read the interrupt type (port 3) and clear the latch
    pub fn read_interrupt_flag(&mut self) -> u8 {
        match self.irq_type.take() {
            Some(irq) => {
                log::trace!("CD-ROM: IRQ {:?} acknowledged", irq);
                irq as u8
            }
            None => 0,
        }
    }

    /// Interrupt type currently latched, without clearing it
    pub fn interrupt_flag(&self) -> u8 {
        self.irq_type.map_or(0, |irq| irq as u8)
    }

    /// Replace the response FIFO contents and raise `irq`
    pub(super) fn respond(&mut self, bytes: &[u8], irq: IrqType, host: &mut dyn CdromHost) {
        self.response_fifo.clear();
        for &b in bytes {
            self.response_fifo.push(b);
        }
        self.generate_irq(irq, host);
    }

    /// Acknowledge with the current status
    pub(super) fn ack(&mut self, host: &mut dyn CdromHost) {
        self.respond(&[self.stat_p.bits()], IrqType::Acknowledge, host);
    }

    /// Error answer: status with the error bit plus a reason code
    pub(super) fn error_response(&mut self, code: u8, host: &mut dyn CdromHost) {
        self.error_code = code;
        let stat = (self.stat_p | super::StatusFlags::ERROR).bits();
        log::debug!(
            "CD-ROM: command 0x{:02X} rejected (code 0x{:02X})",
            self.current_command,
            code
        );
        self.respond(&[stat, code], IrqType::DiskError, host);
    }
}
