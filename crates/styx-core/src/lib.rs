// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! styx-core
//!
//! The belief-computation core of the STYX membership oracle.
//!
//! STYX answers "is node X alive?" with a probability distribution over
//! {alive, dead, unknown} instead of a boolean, and refuses to answer when
//! the evidence would force a lie. This crate implements:
//! - bounded confidence scalars and three-state belief distributions
//! - append-only evidence sets with age decay and conflict widening
//! - a witness registry with trust dynamics and a trust-weighted aggregator
//! - a partition detector that classifies split realities
//! - a finality engine whose death declarations are irreversible
//! - the oracle façade composing all of the above
//!
//! Only logical (Lamport) time is trusted; no code path in this crate reads
//! a wall clock.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod aggregator;
pub mod belief;
pub mod clock;
pub mod confidence;
pub mod entropy;
pub mod error;
pub mod evidence;
pub mod evidence_set;
pub mod finality;
pub mod jitter;
pub mod node;
pub mod oracle;
pub mod partition;
pub mod prober;
pub mod state;
pub mod witness;

pub use crate::belief::{Belief, BeliefState};
pub use crate::clock::LogicalTimestamp;
pub use crate::confidence::Confidence;
pub use crate::error::{StyxError, StyxResult};
pub use crate::node::NodeId;
pub use crate::oracle::{Oracle, QueryResult, RequiredConfidence};
