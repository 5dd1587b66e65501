// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Witness catalog and trust dynamics.
//!
//! Trust decays fast on wrong reports and recovers slowly on correct ones,
//! and never reaches zero: every witness keeps some voice.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::belief::Belief;
use crate::node::NodeId;

/// Full trust in a witness.
pub const MAX_TRUST: f64 = 1.0;
/// Floor trust; never zero.
pub const MIN_TRUST: f64 = 0.1;
/// Trust granted on first registration.
pub const DEFAULT_TRUST: f64 = 0.8;
/// Trust lost per wrong report.
pub const DECAY_RATE: f64 = 0.1;
/// Trust gained per correct report. Recovery is slower than decay.
pub const RECOVERY_RATE: f64 = 0.05;

/// Per-witness bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessRecord {
    pub id: NodeId,
    pub trust: f64,
    pub correct_reports: u64,
    pub wrong_reports: u64,
    pub last_report: Option<Belief>,
}

impl WitnessRecord {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            trust: DEFAULT_TRUST,
            correct_reports: 0,
            wrong_reports: 0,
            last_report: None,
        }
    }
}

/// Catalog of known witnesses. Records are created on first registration
/// or first report and never removed.
#[derive(Debug, Default)]
pub struct Registry {
    witnesses: RwLock<HashMap<NodeId, WitnessRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: re-registering leaves existing state untouched.
    pub fn register(&self, id: NodeId) {
        let mut witnesses = self.witnesses.write();
        witnesses.entry(id).or_insert_with(|| WitnessRecord::new(id));
    }

    /// Trust score for a witness; strangers get the default.
    pub fn trust_of(&self, id: NodeId) -> f64 {
        let witnesses = self.witnesses.read();
        witnesses.get(&id).map_or(DEFAULT_TRUST, |w| w.trust)
    }

    /// A correct report recovers a little trust.
    pub fn record_correct(&self, id: NodeId) {
        let mut witnesses = self.witnesses.write();
        let w = witnesses.entry(id).or_insert_with(|| WitnessRecord::new(id));
        w.correct_reports += 1;
        w.trust = (w.trust + RECOVERY_RATE).min(MAX_TRUST);
    }

    /// A wrong report costs twice what a correct one earns.
    pub fn record_wrong(&self, id: NodeId) {
        let mut witnesses = self.witnesses.write();
        let w = witnesses.entry(id).or_insert_with(|| WitnessRecord::new(id));
        w.wrong_reports += 1;
        w.trust = (w.trust - DECAY_RATE).max(MIN_TRUST);
    }

    /// Remember the latest belief a witness reported.
    pub fn record_report(&self, id: NodeId, belief: Belief) {
        let mut witnesses = self.witnesses.write();
        let w = witnesses.entry(id).or_insert_with(|| WitnessRecord::new(id));
        w.last_report = Some(belief);
    }

    pub fn all_witnesses(&self) -> Vec<NodeId> {
        let witnesses = self.witnesses.read();
        witnesses.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.witnesses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.witnesses.read().is_empty()
    }

    /// A copy of the record, so callers cannot disturb trust state.
    pub fn record_of(&self, id: NodeId) -> Option<WitnessRecord> {
        let witnesses = self.witnesses.read();
        witnesses.get(&id).cloned()
    }
}
