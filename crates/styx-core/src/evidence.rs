// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Evidence records.
//!
//! Evidence is the foundation of the belief system: each record is a single
//! observation with a kind, a causal timestamp, and a weight fixed at
//! construction. Absence of evidence is not evidence of absence: timeouts
//! carry deliberately weak weights and can never prove death on their own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::belief::BeliefState;
use crate::clock::LogicalTimestamp;
use crate::node::NodeId;

/// Unique identifier for a causal event.
pub type EventId = u64;

/// Discriminant for evidence records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvidenceKind {
    /// A direct response to a probe. Strong evidence of liveness, never
    /// absolute.
    DirectResponse,
    /// No response within the timeout period. Weak evidence: silence is
    /// never death.
    Timeout,
    /// Another node's report about the target. Indirect; weight depends on
    /// trust.
    WitnessReport,
    /// An observed causal event from the target. The node was alive when
    /// the event was created.
    CausalEvent,
    /// Abnormal local scheduling. Load is not failure; this discounts
    /// other evidence rather than suggesting death.
    SchedulingJitter,
    /// Network trouble observed on the path to the target.
    NetworkInstability,
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceKind::DirectResponse => "DirectResponse",
            EvidenceKind::Timeout => "Timeout",
            EvidenceKind::WitnessReport => "WitnessReport",
            EvidenceKind::CausalEvent => "CausalEvent",
            EvidenceKind::SchedulingJitter => "SchedulingJitter",
            EvidenceKind::NetworkInstability => "NetworkInstability",
        };
        f.write_str(s)
    }
}

/// Kind-specific payload of an evidence record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EvidenceDetails {
    DirectResponse {
        latency_ms: u64,
    },
    Timeout {
        expected_ms: u64,
        waited_ms: u64,
    },
    WitnessReport {
        witness: NodeId,
        reported_state: BeliefState,
        witness_confidence: f64,
    },
    CausalEvent {
        event_id: EventId,
    },
    SchedulingJitter {
        observed_delay_ms: u64,
    },
    NetworkInstability {
        packet_loss_rate: f64,
        latency_variance_ms: u64,
    },
}

impl EvidenceDetails {
    pub fn kind(&self) -> EvidenceKind {
        match self {
            EvidenceDetails::DirectResponse { .. } => EvidenceKind::DirectResponse,
            EvidenceDetails::Timeout { .. } => EvidenceKind::Timeout,
            EvidenceDetails::WitnessReport { .. } => EvidenceKind::WitnessReport,
            EvidenceDetails::CausalEvent { .. } => EvidenceKind::CausalEvent,
            EvidenceDetails::SchedulingJitter { .. } => EvidenceKind::SchedulingJitter,
            EvidenceDetails::NetworkInstability { .. } => EvidenceKind::NetworkInstability,
        }
    }
}

/// A single observation about a node's liveness.
///
/// Weights are assigned by the factory functions and immutable thereafter;
/// the prober is the one caller allowed to discount a freshly built record
/// before it enters an evidence set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Evidence {
    pub timestamp: LogicalTimestamp,
    pub weight: f64,
    pub source: NodeId,
    pub target: NodeId,
    pub details: EvidenceDetails,
}

impl Evidence {
    /// Evidence of a direct probe response. Faster responses weigh more.
    pub fn direct_response(
        ts: LogicalTimestamp,
        latency_ms: u64,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        let weight = if latency_ms < 100 {
            1.0
        } else if latency_ms < 1000 {
            0.8
        } else {
            0.6
        };
        Self {
            timestamp: ts,
            weight,
            source,
            target,
            details: EvidenceDetails::DirectResponse { latency_ms },
        }
    }

    /// Evidence of a timeout. Weak by construction: the weight ceiling is
    /// 0.3 no matter how long the wait was.
    pub fn timeout(
        ts: LogicalTimestamp,
        expected_ms: u64,
        waited_ms: u64,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        let ratio = if expected_ms == 0 {
            f64::INFINITY
        } else {
            waited_ms as f64 / expected_ms as f64
        };
        let weight = if ratio > 10.0 {
            0.3
        } else if ratio > 3.0 {
            0.2
        } else {
            0.1
        };
        Self {
            timestamp: ts,
            weight,
            source,
            target,
            details: EvidenceDetails::Timeout {
                expected_ms,
                waited_ms,
            },
        }
    }

    /// Evidence of an observed causal event: the node was provably alive
    /// when it produced the event.
    pub fn causal_event(
        ts: LogicalTimestamp,
        event_id: EventId,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        Self {
            timestamp: ts,
            weight: 1.0,
            source,
            target,
            details: EvidenceDetails::CausalEvent { event_id },
        }
    }

    /// Evidence of local scheduling jitter. Reduces confidence in other
    /// evidence; never proof of death.
    pub fn scheduling_jitter(
        ts: LogicalTimestamp,
        observed_delay_ms: u64,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        let weight = if observed_delay_ms > 1000 { 0.4 } else { 0.2 };
        Self {
            timestamp: ts,
            weight,
            source,
            target,
            details: EvidenceDetails::SchedulingJitter { observed_delay_ms },
        }
    }

    /// Evidence of network instability; the weight is proportional to the
    /// observed loss rate.
    pub fn network_instability(
        ts: LogicalTimestamp,
        packet_loss_rate: f64,
        latency_variance_ms: u64,
        source: NodeId,
        target: NodeId,
    ) -> Self {
        let weight = if packet_loss_rate.is_nan() {
            0.0
        } else {
            packet_loss_rate.clamp(0.0, 1.0)
        };
        Self {
            timestamp: ts,
            weight,
            source,
            target,
            details: EvidenceDetails::NetworkInstability {
                packet_loss_rate,
                latency_variance_ms,
            },
        }
    }

    pub fn kind(&self) -> EvidenceKind {
        self.details.kind()
    }

    pub fn suggests_alive(&self) -> bool {
        matches!(
            self.kind(),
            EvidenceKind::DirectResponse | EvidenceKind::CausalEvent
        )
    }

    /// True if this evidence suggests the target MIGHT be dead. Never
    /// conclusive on its own.
    pub fn suggests_dead(&self) -> bool {
        self.kind() == EvidenceKind::Timeout
    }

    /// Weight adjusted for age decay: weight * 0.5^(age / half_life).
    pub fn effective_weight(&self, now: LogicalTimestamp, half_life: u64) -> f64 {
        let age = self.timestamp.age_since(now);
        let decay = 0.5f64.powf(age as f64 / half_life as f64);
        self.weight * decay
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} from {} about {} (w={:.2})",
            self.timestamp,
            self.kind(),
            self.source,
            self.target,
            self.weight
        )
    }
}
