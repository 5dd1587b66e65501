// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Death finality.
//!
//! A death declaration is irreversible: once a node enters the dead map, no
//! code path removes or overwrites it. False death being forbidden, the
//! preconditions demand overwhelming agreed evidence, and silence alone can
//! never satisfy them.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::aggregator::WitnessReport;
use crate::belief::Belief;
use crate::error::{StyxError, StyxResult};
use crate::node::NodeId;

/// Dead mass required to even consider a declaration.
pub const MIN_DEAD_CONFIDENCE: f64 = 0.85;
/// Distinct reports required.
pub const MIN_WITNESSES: usize = 3;
/// Maximum variance of per-witness dead masses.
pub const MAX_DISAGREEMENT: f64 = 0.2;

/// The record created when a node is declared dead. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathRecord {
    pub node_id: NodeId,
    pub final_belief: Belief,
    pub witnesses: Vec<NodeId>,
    pub reason: String,
}

/// Enforces the death-declaration preconditions and stores the irreversible
/// records.
#[derive(Debug, Default)]
pub struct Engine {
    dead: RwLock<HashMap<NodeId, DeathRecord>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Once dead, always dead.
    pub fn is_dead(&self, id: NodeId) -> bool {
        self.dead.read().contains_key(&id)
    }

    /// A copy of the death record, if one exists.
    pub fn death_record(&self, id: NodeId) -> Option<DeathRecord> {
        self.dead.read().get(&id).cloned()
    }

    /// Attempt to declare a node dead.
    ///
    /// Checking the preconditions and inserting the record happen under one
    /// exclusive lock, so no interleaving can produce a second record.
    pub fn declare_death(
        &self,
        node_id: NodeId,
        aggregated_belief: Belief,
        reports: &[WitnessReport],
        has_non_timeout_evidence: bool,
    ) -> StyxResult<DeathRecord> {
        let mut dead = self.dead.write();

        if dead.contains_key(&node_id) {
            return Err(StyxError::AlreadyDead);
        }

        if aggregated_belief.dead().value() < MIN_DEAD_CONFIDENCE {
            return Err(StyxError::InsufficientEvidence);
        }

        if reports.len() < MIN_WITNESSES {
            return Err(StyxError::InsufficientEvidence);
        }

        if !has_non_timeout_evidence {
            return Err(StyxError::SilenceOnly);
        }

        if dead_mass_variance(reports) > MAX_DISAGREEMENT {
            return Err(StyxError::InsufficientEvidence);
        }

        let record = DeathRecord {
            node_id,
            final_belief: aggregated_belief,
            witnesses: reports.iter().map(|r| r.witness).collect(),
            reason: "overwhelming evidence from multiple witnesses".to_string(),
        };
        dead.insert(node_id, record.clone());
        Ok(record)
    }

    /// Resurrection is not an operation: this always fails for a node in
    /// the dead map. A returning process must present a rebirth identity.
    pub fn attempt_resurrection(&self, id: NodeId) -> StyxResult<()> {
        if self.dead.read().contains_key(&id) {
            return Err(StyxError::Resurrection);
        }
        Ok(())
    }

    pub fn all_dead(&self) -> Vec<NodeId> {
        self.dead.read().keys().copied().collect()
    }
}

/// Variance of the per-witness dead masses.
fn dead_mass_variance(reports: &[WitnessReport]) -> f64 {
    if reports.len() < 2 {
        return 0.0;
    }

    let n = reports.len() as f64;
    let mean = reports
        .iter()
        .map(|r| r.belief.dead().value())
        .sum::<f64>()
        / n;

    reports
        .iter()
        .map(|r| {
            let diff = r.belief.dead().value() - mean;
            diff * diff
        })
        .sum::<f64>()
        / n
}
