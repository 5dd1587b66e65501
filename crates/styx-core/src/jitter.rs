// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Local scheduling-jitter tracking.
//!
//! Load is not failure. GC pauses and CPU stalls on the observer inflate
//! its own timeouts; when local jitter is high, timeout evidence must be
//! discounted rather than read as remote death.

use serde::{Deserialize, Serialize};

/// Sliding window of local scheduling delays, expressed as ratios
/// (actual - expected) / expected.
#[derive(Debug, Clone)]
pub struct JitterTracker {
    samples: Vec<f64>,
    window_size: usize,
}

impl JitterTracker {
    pub fn new(window_size: usize) -> Self {
        let window_size = if window_size < 1 { 100 } else { window_size };
        Self {
            samples: Vec::with_capacity(window_size),
            window_size,
        }
    }

    /// Record one observation of how long an operation took against how
    /// long it should have taken. Durations are supplied by the caller.
    pub fn record_sample(&mut self, expected_ms: u64, actual_ms: u64) {
        if expected_ms == 0 {
            return;
        }
        // Faster than expected is not jitter.
        let ratio = (actual_ms.saturating_sub(expected_ms)) as f64 / expected_ms as f64;

        if self.samples.len() >= self.window_size {
            self.samples.remove(0);
        }
        self.samples.push(ratio);
    }

    /// How much to trust timeout evidence, in [0, 1].
    ///
    /// 1.0 means no jitter detected; 0.1 means an extreme jitter event was
    /// observed and timeouts should be nearly ignored.
    pub fn jitter_factor(&self) -> f64 {
        if self.samples.is_empty() {
            return 1.0;
        }

        let mut sum = 0.0;
        let mut max_jitter: f64 = 0.0;
        for s in &self.samples {
            sum += s;
            max_jitter = max_jitter.max(*s);
        }
        let mean = sum / self.samples.len() as f64;

        if max_jitter > 2.0 {
            return 0.1;
        }
        if mean > 0.5 {
            return 0.2;
        }
        if mean > 0.2 {
            return 0.5;
        }
        // Linear decay from 1.0 toward 0.5 as mean approaches 0.2.
        1.0 - mean * 2.5
    }

    pub fn is_jittery(&self) -> bool {
        self.jitter_factor() < 0.8
    }

    pub fn stats(&self) -> JitterStats {
        if self.samples.is_empty() {
            return JitterStats::default();
        }
        let mut sum = 0.0;
        let mut max: f64 = 0.0;
        for s in &self.samples {
            sum += s;
            max = max.max(*s);
        }
        JitterStats {
            sample_count: self.samples.len(),
            mean_jitter: sum / self.samples.len() as f64,
            max_jitter: max,
            jitter_factor: self.jitter_factor(),
        }
    }
}

impl Default for JitterTracker {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JitterStats {
    pub sample_count: usize,
    pub mean_jitter: f64,
    pub max_jitter: f64,
    pub jitter_factor: f64,
}
