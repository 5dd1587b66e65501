// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logical time.
//!
//! STYX uses Lamport-style logical timestamps instead of wall clocks.
//! Wall clocks lie: NTP jumps backwards, virtualization drifts, CPU stalls
//! make timestamps meaningless. Logical time captures what actually
//! matters for liveness reasoning: causality.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Lamport-style logical timestamp.
///
/// If event A happens before event B then ts(A) < ts(B); the converse does
/// not hold for concurrent events. Within a single process the counter is
/// monotonically increasing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LogicalTimestamp(u64);

impl LogicalTimestamp {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advance on a local event; returns the new value.
    pub fn increment(&mut self) -> LogicalTimestamp {
        self.0 += 1;
        *self
    }

    /// Merge a received timestamp, Lamport's rule:
    /// ts = max(local, received) + 1.
    pub fn update(&mut self, received: LogicalTimestamp) -> LogicalTimestamp {
        if received.0 > self.0 {
            self.0 = received.0;
        }
        self.increment()
    }

    pub fn is_before(&self, other: LogicalTimestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: LogicalTimestamp) -> bool {
        self.0 > other.0
    }

    /// Age of this event relative to `now`; events in the future age 0.
    pub fn age_since(&self, now: LogicalTimestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }
}

impl fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
