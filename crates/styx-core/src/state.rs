// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-observer local state: one evidence set and cached belief per target,
//! plus the observer's logical clock.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::belief::{Belief, BeliefState};
use crate::clock::LogicalTimestamp;
use crate::evidence::Evidence;
use crate::evidence_set::EvidenceSet;
use crate::node::NodeId;

/// What a single observer believes about one target node.
#[derive(Debug, Clone)]
pub struct LocalBelief {
    target: NodeId,
    belief: Belief,
    evidence: EvidenceSet,
    last_updated: LogicalTimestamp,
}

impl LocalBelief {
    /// Starts with pure uncertainty and no evidence.
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            belief: Belief::unknown_belief(),
            evidence: EvidenceSet::new(),
            last_updated: LogicalTimestamp::zero(),
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn belief(&self) -> Belief {
        self.belief
    }

    pub fn evidence(&self) -> &EvidenceSet {
        &self.evidence
    }

    pub fn last_updated(&self) -> LogicalTimestamp {
        self.last_updated
    }

    /// Append evidence and recompute the belief.
    pub fn record_evidence(&mut self, e: Evidence) -> Belief {
        if e.timestamp > self.last_updated {
            self.last_updated = e.timestamp;
        }
        self.evidence.add(e);
        self.belief = self.evidence.compute_belief(self.last_updated);
        self.belief
    }

    /// Recompute the belief at a given time, applying decay.
    pub fn recompute_at(&mut self, now: LogicalTimestamp) {
        self.belief = self.evidence.compute_belief(now);
        self.last_updated = now;
    }

    pub fn is_certain_alive(&self) -> bool {
        self.belief.is_certain_alive()
    }

    pub fn is_certain_dead(&self) -> bool {
        self.belief.is_certain_dead()
    }

    /// A summary of why this belief is held.
    pub fn reasoning(&self) -> BeliefReasoning {
        BeliefReasoning {
            belief: self.belief,
            evidence_count: self.evidence.len(),
            alive_evidence_count: self.evidence.alive_evidence().len(),
            dead_evidence_count: self.evidence.dead_evidence().len(),
            latest_evidence: self.evidence.latest_timestamp(),
        }
    }
}

/// Why a belief is held.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BeliefReasoning {
    pub belief: Belief,
    pub evidence_count: usize,
    pub alive_evidence_count: usize,
    pub dead_evidence_count: usize,
    pub latest_evidence: LogicalTimestamp,
}

impl fmt::Display for BeliefReasoning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (evidence: {} total, {} alive, {} dead)",
            self.belief, self.evidence_count, self.alive_evidence_count, self.dead_evidence_count
        )
    }
}

/// The result of querying an observer's local belief.
#[derive(Debug, Clone, Copy)]
pub struct BeliefQuery {
    pub target: NodeId,
    pub belief: Belief,
    pub reasoning: BeliefReasoning,
    pub observer: NodeId,
    pub query_time: LogicalTimestamp,
}

impl BeliefQuery {
    pub fn dominant(&self) -> BeliefState {
        self.belief.dominant()
    }
}

/// Complete local state of a single observer node.
#[derive(Debug)]
pub struct ObserverState {
    self_id: NodeId,
    beliefs: HashMap<NodeId, LocalBelief>,
    logical_clock: LogicalTimestamp,
}

impl ObserverState {
    pub fn new(self_id: NodeId) -> Self {
        Self {
            self_id,
            beliefs: HashMap::new(),
            logical_clock: LogicalTimestamp::zero(),
        }
    }

    pub fn self_id(&self) -> NodeId {
        self.self_id
    }

    pub fn logical_time(&self) -> LogicalTimestamp {
        self.logical_clock
    }

    /// Advance the clock on a local event.
    pub fn tick(&mut self) -> LogicalTimestamp {
        self.logical_clock.increment()
    }

    /// Merge a received timestamp into the clock.
    pub fn receive(&mut self, received: LogicalTimestamp) -> LogicalTimestamp {
        self.logical_clock.update(received)
    }

    /// Record evidence about a target; returns the updated belief.
    pub fn record_evidence(&mut self, target: NodeId, e: Evidence) -> Belief {
        self.beliefs
            .entry(target)
            .or_insert_with(|| LocalBelief::new(target))
            .record_evidence(e)
    }

    /// The belief about a node, or None if nothing is known about it.
    pub fn query(&self, target: NodeId) -> Option<BeliefQuery> {
        self.beliefs.get(&target).map(|lb| BeliefQuery {
            target,
            belief: lb.belief(),
            reasoning: lb.reasoning(),
            observer: self.self_id,
            query_time: self.logical_clock,
        })
    }

    /// Like [`query`](Self::query), defaulting to unknown.
    pub fn query_or_unknown(&self, target: NodeId) -> BeliefQuery {
        self.query(target).unwrap_or(BeliefQuery {
            target,
            belief: Belief::unknown_belief(),
            reasoning: BeliefReasoning {
                belief: Belief::unknown_belief(),
                evidence_count: 0,
                alive_evidence_count: 0,
                dead_evidence_count: 0,
                latest_evidence: LogicalTimestamp::zero(),
            },
            observer: self.self_id,
            query_time: self.logical_clock,
        })
    }

    pub fn known_nodes(&self) -> Vec<NodeId> {
        self.beliefs.keys().copied().collect()
    }

    pub fn alive_nodes(&self) -> Vec<NodeId> {
        self.nodes_in(BeliefState::Alive)
    }

    pub fn dead_nodes(&self) -> Vec<NodeId> {
        self.nodes_in(BeliefState::Dead)
    }

    pub fn unknown_nodes(&self) -> Vec<NodeId> {
        self.nodes_in(BeliefState::Unknown)
    }

    fn nodes_in(&self, state: BeliefState) -> Vec<NodeId> {
        self.beliefs
            .iter()
            .filter(|(_, lb)| lb.belief().dominant() == state)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Recompute all beliefs at the current clock, applying decay.
    pub fn recompute_beliefs(&mut self) {
        let now = self.logical_clock;
        for lb in self.beliefs.values_mut() {
            lb.recompute_at(now);
        }
    }
}
