// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adversarial-condition tests: lying witnesses, flapping nodes, timeout
//! storms, and randomized report streams.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use styx_core::{Belief, NodeId, Oracle};

fn belief(alive: f64, dead: f64, unknown: f64) -> Belief {
    Belief::new(alive, dead, unknown).unwrap()
}

#[test]
fn byzantine_minority_cannot_flip_verdict() {
    let oracle = Oracle::new(NodeId::new(1));
    let target = NodeId::new(99);

    // Reality: the node is alive. Seven honest witnesses report alive,
    // three byzantine witnesses report the opposite.
    for i in 1..=7 {
        oracle.receive_report(NodeId::new(i), target, belief(0.85, 0.05, 0.10));
    }
    for i in 8..=10 {
        oracle.receive_report(NodeId::new(i), target, belief(0.05, 0.85, 0.10));
    }

    let result = oracle.query(target);
    if result.refused {
        // Acceptable: high disagreement triggers caution, not a wrong answer.
        assert!(result.refusal_reason.is_some());
        return;
    }
    assert!(result.belief.alive().value() >= result.belief.dead().value());
}

#[test]
fn flapping_node_surfaces_uncertainty() {
    let oracle = Oracle::new(NodeId::new(1));
    let target = NodeId::new(99);

    for i in 0..20u64 {
        let witness = NodeId::new(100 + i);
        if i % 2 == 0 {
            oracle.receive_report(witness, target, belief(0.8, 0.1, 0.1));
        } else {
            oracle.receive_report(witness, target, belief(0.1, 0.8, 0.1));
        }
    }

    let result = oracle.query(target);
    // A flapping node must never look confidently alive or dead: either
    // the oracle refuses outright or the answer carries real uncertainty.
    if !result.refused {
        assert!(
            result.disagreement > 0.2 || result.belief.unknown().value() > 0.3,
            "flapping produced a confident answer: disagreement={} unknown={}",
            result.disagreement,
            result.belief.unknown().value()
        );
    }
}

#[test]
fn timeout_storm_cannot_trigger_finality() {
    let oracle = Oracle::new(NodeId::new(1));
    let target = NodeId::new(99);

    for i in 1..=100 {
        oracle.receive_report(NodeId::new(i), target, belief(0.2, 0.5, 0.3));
    }

    let result = oracle.query(target);
    assert!(!result.dead, "timeout storm triggered finality");
    assert!(result.belief.dead().value() < 0.95);

    // Even an explicit declaration attempt is rejected without
    // non-timeout evidence.
    let reports = oracle.reports_for(target);
    let aggregate = result.belief;
    assert!(oracle
        .declare_death(target, aggregate, &reports, false)
        .is_err());
    assert!(!oracle.finality().is_dead(target));
}

#[test]
fn random_report_streams_never_break_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x57_79_78);
    let oracle = Oracle::new(NodeId::new(1));

    for round in 0..500u64 {
        let witness = NodeId::new(rng.random_range(1..50));
        let target = NodeId::new(rng.random_range(100..110));

        let alive: f64 = rng.random_range(0.0..1.0);
        let dead: f64 = rng.random_range(0.0..(1.0 - alive));
        let unknown = 1.0 - alive - dead;
        oracle.receive_report(witness, target, belief(alive, dead, unknown));

        if round % 7 == 0 {
            let result = oracle.query(target);
            let sum = result.belief.alive().value()
                + result.belief.dead().value()
                + result.belief.unknown().value();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(result.belief.is_valid());
            if result.refused {
                assert!(result.refusal_reason.is_some());
            }
        }
    }

    // Trust bounds survive arbitrary scoring churn.
    for i in 1..50 {
        let id = NodeId::new(i);
        for _ in 0..rng.random_range(0..20) {
            if rng.random_bool(0.5) {
                oracle.registry().record_correct(id);
            } else {
                oracle.registry().record_wrong(id);
            }
        }
        let trust = oracle.registry().trust_of(id);
        assert!((0.1..=1.0).contains(&trust));
    }
}

#[test]
fn dead_node_stays_dead_through_chaos() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let oracle = Oracle::new(NodeId::new(1));
    let target = NodeId::new(99);
    let dead_belief = belief(0.02, 0.95, 0.03);

    for i in 1..=5 {
        oracle.receive_report(NodeId::new(i), target, dead_belief);
    }
    let reports = oracle.reports_for(target);
    oracle
        .declare_death(target, dead_belief, &reports, true)
        .unwrap();

    // A flood of resurrection-shaped reports changes nothing.
    for _ in 0..200 {
        let witness = NodeId::new(rng.random_range(1..30));
        oracle.receive_report(witness, target, belief(0.95, 0.02, 0.03));
        let result = oracle.query(target);
        assert!(result.dead);
        assert!(result.belief.approx_eq(&Belief::certainly_dead()));
    }

    // The reborn identity is a different node entirely.
    let reborn = target.rebirth();
    assert!(!oracle.finality().is_dead(reborn));
    let fresh = oracle.query(reborn);
    assert!(!fresh.dead);
}
