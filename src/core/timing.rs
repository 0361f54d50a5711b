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

//! Timing Event System
//!
//! This module implements the machine-wide cycle counter and the event queue
//! that peripherals use to run code "N cycles from now".
//!
//! # Architecture
//!
//! - The global tick counter is the absolute time in CPU cycles since reset.
//! - The CPU accumulates executed cycles in `pending_ticks`.
//! - [`TimingEventManager::next_due`] pops events whose time has been reached,
//!   one at a time, and moves the global counter to the event's due time
//!   before handing it out. A handler that reschedules itself therefore keeps
//!   an exact cadence no matter how coarse the CPU slices are.
//! - [`TimingEventManager::finish_run`] commits the remaining pending ticks.
//!
//! Events due on the same cycle fire in the order they were scheduled. There
//! is no cancellation: owners tag their payloads and ignore stale ones.
//!
//! # Example
//!
//! ```
//! use psx_cdrom::core::timing::TimingEventManager;
//!
//! let mut timing = TimingEventManager::new();
//! timing.schedule(1000, "first");
//! timing.schedule(1000, "second");
//!
//! timing.pending_ticks = 1500;
//! assert_eq!(timing.next_due(), Some("first"));
//! assert_eq!(timing.global_tick_counter, 1000);
//! assert_eq!(timing.next_due(), Some("second"));
//! assert_eq!(timing.next_due(), None);
//!
//! timing.finish_run();
//! assert_eq!(timing.global_tick_counter, 1500);
//! ```

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Tick count type (relative time in CPU cycles)
pub type TickCount = i32;

/// Global tick counter type (absolute time in CPU cycles since reset)
pub type GlobalTicks = u64;

/// A scheduled event
///
/// `sequence` is the submission order and breaks ties between events due on
/// the same cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct TimingEvent<E> {
    /// Execution time (global ticks)
    pub next_run_time: GlobalTicks,

    /// Submission order
    pub sequence: u64,

    /// Owner-defined payload
    pub payload: E,
}

/// Timing Event Manager
///
/// Keeps scheduled events sorted by `(next_run_time, sequence)`.
#[derive(Debug)]
pub struct TimingEventManager<E> {
    /// Global tick counter (absolute time since reset)
    pub global_tick_counter: GlobalTicks,

    /// Pending ticks (accumulated since last event run)
    pub pending_ticks: TickCount,

    /// Downcount (cycles until next event)
    pub downcount: TickCount,

    /// Scheduled events, soonest first
    events: Vec<TimingEvent<E>>,

    /// Sequence number handed to the next scheduled event
    next_sequence: u64,
}

impl<E> TimingEventManager<E> {
    /// Create a new timing event manager
    ///
    /// # Example
    ///
    /// ```
    /// use psx_cdrom::core::timing::TimingEventManager;
    ///
    /// let timing: TimingEventManager<u8> = TimingEventManager::new();
    /// assert_eq!(timing.global_tick_counter, 0);
    /// assert_eq!(timing.pending_ticks, 0);
    /// ```
    pub fn new() -> Self {
        Self {
            global_tick_counter: 0,
            pending_ticks: 0,
            downcount: i32::MAX,
            events: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Schedule `payload` to fire `ticks` cycles after the current time
    ///
    /// Negative delays are treated as zero. Returns the sequence number
    /// assigned to the event.
    pub fn schedule(&mut self, ticks: TickCount, payload: E) -> u64 {
        let next_run_time = self.global_tick_counter + ticks.max(0) as GlobalTicks;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        // Sequence numbers only grow, so the new event goes after every
        // event due at the same time.
        let index = self
            .events
            .partition_point(|e| e.next_run_time <= next_run_time);
        self.events.insert(
            index,
            TimingEvent {
                next_run_time,
                sequence,
                payload,
            },
        );

        self.update_downcount();
        sequence
    }

    /// Get current time
    #[inline]
    pub fn current_time(&self) -> GlobalTicks {
        self.global_tick_counter
    }

    /// Update downcount to the next event's run time
    pub fn update_downcount(&mut self) {
        if let Some(event) = self.events.first() {
            let cycles_until_event = event.next_run_time.saturating_sub(self.global_tick_counter);
            self.downcount = cycles_until_event.min(i32::MAX as u64) as i32;
        } else {
            self.downcount = i32::MAX;
        }
    }

    /// Pop the next event due within the pending ticks
    ///
    /// The global counter is moved to the event's due time (pending ticks are
    /// reduced by the same amount) so that anything the handler schedules is
    /// relative to when the event actually fired.
    pub fn next_due(&mut self) -> Option<E> {
        let target = self.global_tick_counter + self.pending_ticks.max(0) as GlobalTicks;
        if self.events.first().is_none_or(|e| e.next_run_time > target) {
            return None;
        }

        let event = self.events.remove(0);
        if event.next_run_time > self.global_tick_counter {
            let elapsed = event.next_run_time - self.global_tick_counter;
            self.global_tick_counter = event.next_run_time;
            self.pending_ticks -= elapsed as TickCount;
        } else {
            log::trace!(
                "Timing: event #{} late by {} ticks",
                event.sequence,
                self.global_tick_counter - event.next_run_time
            );
        }

        self.update_downcount();
        Some(event.payload)
    }

    /// Commit the pending ticks that no event consumed
    pub fn finish_run(&mut self) {
        self.global_tick_counter += self.pending_ticks.max(0) as GlobalTicks;
        self.pending_ticks = 0;
        self.update_downcount();
    }

    /// Number of scheduled events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are scheduled
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Scheduled events, soonest first
    pub fn events(&self) -> &[TimingEvent<E>] {
        &self.events
    }

    /// Drop every scheduled event for which `keep` returns false
    pub fn retain<F: FnMut(&E) -> bool>(&mut self, mut keep: F) {
        self.events.retain(|e| keep(&e.payload));
        self.update_downcount();
    }

    /// Replace the clock and queue with a previously captured snapshot
    pub fn restore(&mut self, global_tick_counter: GlobalTicks, mut events: Vec<TimingEvent<E>>) {
        events.sort_by_key(|e| (e.next_run_time, e.sequence));
        self.next_sequence = events.iter().map(|e| e.sequence + 1).max().unwrap_or(0);
        self.global_tick_counter = global_tick_counter;
        self.pending_ticks = 0;
        self.events = events;
        self.update_downcount();
    }

    /// Reset the timing system
    ///
    /// Clears the clock and drops all scheduled events.
    pub fn reset(&mut self) {
        self.global_tick_counter = 0;
        self.pending_ticks = 0;
        self.downcount = i32::MAX;
        self.events.clear();
        self.next_sequence = 0;
    }
}

impl<E> Default for TimingEventManager<E> {
    fn default() -> Self {
        Self::new()
    }
}
