// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Partition detection.
//!
//! When witness reports cluster into contradictory groups, the network may
//! have split into divergent realities. Answering from either side would be
//! a guess, so a confirmed split makes the oracle refuse instead.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::aggregator::WitnessReport;
use crate::belief::{Belief, BeliefState};
use crate::node::NodeId;

/// Fraction of the minority dominant vote above which a split is confirmed.
const DISAGREEMENT_THRESHOLD: f64 = 0.4;

/// What is known about network partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionState {
    NoPartition,
    SuspectedPartition,
    ConfirmedPartition,
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PartitionState::NoPartition => "NO_PARTITION",
            PartitionState::SuspectedPartition => "SUSPECTED_PARTITION",
            PartitionState::ConfirmedPartition => "CONFIRMED_PARTITION",
        };
        f.write_str(s)
    }
}

/// A set of witnesses that share one view of the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessGroup {
    pub witnesses: Vec<NodeId>,
    pub beliefs: HashMap<NodeId, Belief>,
}

impl WitnessGroup {
    fn new() -> Self {
        Self {
            witnesses: Vec::new(),
            beliefs: HashMap::new(),
        }
    }
}

/// Divergent views of the world: one group sees the target alive, the other
/// sees it dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReality {
    pub groups: Vec<WitnessGroup>,
    pub disagreement: f64,
    /// Nodes with conflicting status across groups.
    pub ambiguous: Vec<NodeId>,
}

#[derive(Debug)]
struct DetectorState {
    state: PartitionState,
    last_split: Option<SplitReality>,
}

impl Default for DetectorState {
    fn default() -> Self {
        Self {
            state: PartitionState::NoPartition,
            last_split: None,
        }
    }
}

/// Classifies witness report sets into partition states and remembers the
/// most recent classification for introspection.
#[derive(Debug, Default)]
pub struct Detector {
    inner: RwLock<DetectorState>,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the reports about `target`.
    pub fn analyze(
        &self,
        reports: &[WitnessReport],
        target: NodeId,
    ) -> (PartitionState, Option<SplitReality>) {
        let mut inner = self.inner.write();

        if reports.len() < 2 {
            inner.state = PartitionState::NoPartition;
            return (PartitionState::NoPartition, None);
        }

        let mut alive_votes = 0usize;
        let mut dead_votes = 0usize;
        let mut unknown_votes = 0usize;

        for r in reports {
            match r.belief.dominant() {
                BeliefState::Alive => alive_votes += 1,
                BeliefState::Dead => dead_votes += 1,
                BeliefState::Unknown => unknown_votes += 1,
            }
        }

        let total = reports.len();

        if alive_votes > 0 && dead_votes > 0 {
            let disagreement = alive_votes.min(dead_votes) as f64 / total as f64;

            if disagreement > DISAGREEMENT_THRESHOLD {
                // Some witnesses see the target alive, others see it dead.
                let mut alive_group = WitnessGroup::new();
                let mut dead_group = WitnessGroup::new();

                for r in reports {
                    match r.belief.dominant() {
                        BeliefState::Alive => {
                            alive_group.witnesses.push(r.witness);
                            alive_group.beliefs.insert(target, r.belief);
                        }
                        BeliefState::Dead => {
                            dead_group.witnesses.push(r.witness);
                            dead_group.beliefs.insert(target, r.belief);
                        }
                        BeliefState::Unknown => {}
                    }
                }

                let split = SplitReality {
                    groups: vec![alive_group, dead_group],
                    disagreement,
                    ambiguous: vec![target],
                };

                inner.state = PartitionState::ConfirmedPartition;
                inner.last_split = Some(split.clone());
                return (PartitionState::ConfirmedPartition, Some(split));
            }

            inner.state = PartitionState::SuspectedPartition;
            return (PartitionState::SuspectedPartition, None);
        }

        if unknown_votes as f64 / total as f64 > 0.5 {
            inner.state = PartitionState::SuspectedPartition;
            return (PartitionState::SuspectedPartition, None);
        }

        inner.state = PartitionState::NoPartition;
        (PartitionState::NoPartition, None)
    }

    /// The most recent classification.
    pub fn state(&self) -> PartitionState {
        self.inner.read().state
    }

    /// The most recent split reality, as a copy.
    pub fn last_split(&self) -> Option<SplitReality> {
        self.inner.read().last_split.clone()
    }

    /// Answering during a confirmed split would be a guess.
    pub fn should_refuse(&self) -> bool {
        self.inner.read().state == PartitionState::ConfirmedPartition
    }
}
