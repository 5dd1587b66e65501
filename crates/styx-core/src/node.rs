// Copyright (c) 2026 the STYX Contributors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of a node in the distributed system.
///
/// A `NodeId` pairs a base identifier with a generation counter. Once STYX
/// declares a node dead with finality, any returning process MUST present a
/// new identity with an incremented generation. Identities with equal base
/// but different generation are never equal; this is what prevents zombie
/// nodes and flapping identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub base: u64,
    pub generation: u64,
}

impl NodeId {
    /// A fresh identity at generation 0.
    pub fn new(base: u64) -> Self {
        Self {
            base,
            generation: 0,
        }
    }

    /// An identity at a specific generation, for nodes rejoining after a
    /// death declaration.
    pub fn with_generation(base: u64, generation: u64) -> Self {
        Self { base, generation }
    }

    /// Derive a base identifier from a network address or other stable
    /// string name.
    pub fn from_address(address: &str) -> Self {
        let digest = Sha256::digest(address.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self::new(u64::from_be_bytes(bytes))
    }

    /// The only legal identity for a process that returns after being
    /// declared dead: same base, generation + 1.
    pub fn rebirth(&self) -> Self {
        Self {
            base: self.base,
            generation: self.generation + 1,
        }
    }

    /// True if this identity could be a rebirth of `other`: same base,
    /// strictly higher generation.
    pub fn is_rebirth_of(&self, other: &NodeId) -> bool {
        self.base == other.base && self.generation > other.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}.g{}", self.base, self.generation)
    }
}
