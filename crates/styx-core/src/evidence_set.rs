// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::belief::Belief;
use crate::clock::LogicalTimestamp;
use crate::evidence::Evidence;

/// Default evidence decay half-life, in logical time units.
pub const DEFAULT_HALF_LIFE: u64 = 100;

/// Positive evidence alone can never push alive or dead past this mass.
const MAX_EVIDENCE_CERTAINTY: f64 = 0.90;

/// Unknown mass never drops below this under normal operation.
const UNKNOWN_FLOOR: f64 = 0.05;

/// Append-only collection of evidence about a single node.
///
/// Records are never removed or rewritten; belief only sharpens or decays
/// through the arrival of new evidence and the passage of logical time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSet {
    evidence: Vec<Evidence>,
    half_life: u64,
}

impl Default for EvidenceSet {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceSet {
    pub fn new() -> Self {
        Self {
            evidence: Vec::new(),
            half_life: DEFAULT_HALF_LIFE,
        }
    }

    pub fn with_half_life(half_life: u64) -> Self {
        Self {
            evidence: Vec::new(),
            half_life,
        }
    }

    /// Append a record. This is the only write path.
    pub fn add(&mut self, e: Evidence) {
        self.evidence.push(e);
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    pub fn all(&self) -> &[Evidence] {
        &self.evidence
    }

    pub fn latest_timestamp(&self) -> LogicalTimestamp {
        self.evidence
            .iter()
            .map(|e| e.timestamp)
            .max()
            .unwrap_or_default()
    }

    pub fn alive_evidence(&self) -> Vec<Evidence> {
        self.evidence
            .iter()
            .copied()
            .filter(Evidence::suggests_alive)
            .collect()
    }

    pub fn dead_evidence(&self) -> Vec<Evidence> {
        self.evidence
            .iter()
            .copied()
            .filter(Evidence::suggests_dead)
            .collect()
    }

    /// Reduce the set to a belief distribution at logical time `now`.
    ///
    /// Conflicting evidence widens the distribution instead of averaging
    /// away; the unknown mass keeps a 0.05 floor so certainty is never
    /// absolute.
    pub fn compute_belief(&self, now: LogicalTimestamp) -> Belief {
        if self.is_empty() {
            return Belief::unknown_belief();
        }

        let mut alive_weight = 0.0;
        let mut dead_weight = 0.0;
        let mut total_weight = 0.0;

        for e in &self.evidence {
            let w = e.effective_weight(now, self.half_life);
            total_weight += w;
            if e.suggests_alive() {
                alive_weight += w;
            } else if e.suggests_dead() {
                dead_weight += w;
            }
        }

        if total_weight < 1e-10 {
            return Belief::unknown_belief();
        }

        let max_certainty = (total_weight / (total_weight + 1.0)).min(MAX_EVIDENCE_CERTAINTY);

        let alive_ratio = alive_weight / total_weight;
        let dead_ratio = dead_weight / total_weight;

        // Balanced conflict halves the remaining certainty.
        let conflict_factor = if alive_weight > 0.0 && dead_weight > 0.0 {
            let balance = alive_weight.min(dead_weight) / alive_weight.max(dead_weight);
            1.0 - balance * 0.5
        } else {
            1.0
        };

        let mut alive = alive_ratio * max_certainty * conflict_factor;
        let mut dead = dead_ratio * max_certainty * conflict_factor;
        let mut unknown = 1.0 - alive - dead;

        if unknown < UNKNOWN_FLOOR {
            let deficit = UNKNOWN_FLOOR - unknown;
            alive -= deficit / 2.0;
            dead -= deficit / 2.0;
            unknown = UNKNOWN_FLOOR;
        }

        Belief::new(alive, dead, unknown).unwrap_or_else(|_| Belief::unknown_belief())
    }

    /// Belief at the timestamp of the most recent record.
    pub fn compute_belief_now(&self) -> Belief {
        self.compute_belief(self.latest_timestamp())
    }
}
