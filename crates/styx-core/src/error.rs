// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type StyxResult<T> = Result<T, StyxError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyxError {
    #[error("confidence value cannot be NaN")]
    ConfidenceNaN,

    #[error("confidence value below minimum 0.0: {0}")]
    ConfidenceBelowMinimum(f64),

    #[error("confidence value above maximum 1.0: {0}")]
    ConfidenceAboveMaximum(f64),

    #[error("belief values must sum to 1.0: got {0}")]
    BeliefInvalidSum(f64),

    #[error("node already declared dead")]
    AlreadyDead,

    #[error("insufficient evidence for death declaration")]
    InsufficientEvidence,

    #[error("cannot declare death from silence alone")]
    SilenceOnly,

    #[error("cannot resurrect a dead node")]
    Resurrection,

    #[error("no probe function set")]
    NoProbeFunction,

    #[error("internal error")]
    Internal,
}

impl StyxError {
    /// True for finality failures a caller can retry after gathering more
    /// evidence, as opposed to terminal or policy failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StyxError::InsufficientEvidence)
    }
}
