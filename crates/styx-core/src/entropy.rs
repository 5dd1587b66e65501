// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

//! Response-consistency tracking.
//!
//! Consistent response latencies raise confidence in liveness evidence;
//! erratic ones degrade it. Measured as a normalized coefficient of
//! variation over a sliding latency window.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ResponseEntropy {
    latencies_ms: Vec<u64>,
    window_size: usize,
}

impl ResponseEntropy {
    pub fn new(window_size: usize) -> Self {
        let window_size = if window_size < 1 { 100 } else { window_size };
        Self {
            latencies_ms: Vec::with_capacity(window_size),
            window_size,
        }
    }

    pub fn add_sample(&mut self, latency_ms: u64) {
        if self.latencies_ms.len() >= self.window_size {
            self.latencies_ms.remove(0);
        }
        self.latencies_ms.push(latency_ms);
    }

    /// Normalized entropy in [0, 1]: 0 is perfectly consistent, 1 is
    /// maximum variance. Neutral 0.5 while under two samples.
    pub fn entropy(&self) -> f64 {
        let n = self.latencies_ms.len();
        if n < 2 {
            return 0.5;
        }

        let sum: f64 = self.latencies_ms.iter().map(|l| *l as f64).sum();
        let mean = sum / n as f64;
        if mean == 0.0 {
            return 0.5;
        }

        let variance = self
            .latencies_ms
            .iter()
            .map(|l| {
                let diff = *l as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n as f64;
        let cv = variance.sqrt() / mean;

        cv.min(1.0)
    }

    /// How much to trust responses, in [0.5, 1.0]. Never zero.
    pub fn confidence_factor(&self) -> f64 {
        1.0 - self.entropy() * 0.5
    }

    pub fn is_erratic(&self) -> bool {
        self.entropy() > 0.5
    }

    pub fn stats(&self) -> EntropyStats {
        let n = self.latencies_ms.len();
        if n == 0 {
            return EntropyStats::default();
        }
        let sum: u64 = self.latencies_ms.iter().sum();
        EntropyStats {
            sample_count: n,
            mean_latency_ms: sum / n as u64,
            min_latency_ms: self.latencies_ms.iter().copied().min().unwrap_or(0),
            max_latency_ms: self.latencies_ms.iter().copied().max().unwrap_or(0),
            entropy: self.entropy(),
        }
    }
}

impl Default for ResponseEntropy {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EntropyStats {
    pub sample_count: usize,
    pub mean_latency_ms: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub entropy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_is_neutral() {
        let mut entropy = ResponseEntropy::new(10);
        assert_eq!(entropy.entropy(), 0.5);
        entropy.add_sample(10);
        assert_eq!(entropy.entropy(), 0.5);
    }

    #[test]
    fn consistent_latencies_have_low_entropy() {
        let mut entropy = ResponseEntropy::new(20);
        for _ in 0..20 {
            entropy.add_sample(50);
        }
        assert_eq!(entropy.entropy(), 0.0);
        assert_eq!(entropy.confidence_factor(), 1.0);
        assert!(!entropy.is_erratic());
    }

    #[test]
    fn erratic_latencies_degrade_confidence() {
        let mut entropy = ResponseEntropy::new(20);
        for i in 0..10 {
            entropy.add_sample(if i % 2 == 0 { 1 } else { 1000 });
        }
        assert!(entropy.is_erratic());
        let factor = entropy.confidence_factor();
        assert!(factor < 0.8);
        assert!(factor >= 0.5);
    }

    #[test]
    fn stats_track_extremes() {
        let mut entropy = ResponseEntropy::new(10);
        entropy.add_sample(5);
        entropy.add_sample(50);
        entropy.add_sample(20);
        let stats = entropy.stats();
        assert_eq!(stats.sample_count, 3);
        assert_eq!(stats.min_latency_ms, 5);
        assert_eq!(stats.max_latency_ms, 50);
    }
}
