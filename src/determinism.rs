// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic Seed Context.
//!
//! Every nonce- or randomness-dependent operation in the kernel draws its
//! material from a single immutable [`DeterminismContext`], passed
//! explicitly into each component constructor. There is no global seed.
//!
//! Sub-seeds are derived with BLAKE3 in key-derivation mode, one context
//! string per purpose, so the signing key and the lane seed never share
//! material even though both come from the same root seed.

use core::fmt;

use zeroize::Zeroizing;

use crate::config::DEFAULT_SEED;

const SIGNING_KEY_CONTEXT: &str = "triad-kernel 2025 ml-dsa-65 signing key";
const LANE_SEED_CONTEXT: &str = "triad-kernel 2025 lane seed";
const SEED_EXPANSION_CONTEXT: &str = "triad-kernel 2025 u64 seed expansion";

/// Immutable, process-lifetime seed holder. The root seed is zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct DeterminismContext {
    seed: Zeroizing<[u8; 32]>,
}

impl DeterminismContext {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed: Zeroizing::new(seed),
        }
    }

    /// Expands a short numeric seed into a full 32-byte root seed.
    pub fn from_u64(seed: u64) -> Self {
        Self::new(blake3::derive_key(SEED_EXPANSION_CONTEXT, &seed.to_le_bytes()))
    }

    /// Parses a 64-character hex seed.
    pub fn from_hex(hex_seed: &str) -> Option<Self> {
        let bytes = Zeroizing::new(hex::decode(hex_seed).ok()?);
        let seed: [u8; 32] = bytes.as_slice().try_into().ok()?;
        Some(Self::new(seed))
    }

    /// Seed material for the ML-DSA key generator.
    pub fn signing_seed(&self) -> Zeroizing<[u8; 32]> {
        self.derive(SIGNING_KEY_CONTEXT)
    }

    /// Seed handed, identically, to every lane of a run.
    pub fn lane_seed(&self) -> [u8; 32] {
        *self.derive(LANE_SEED_CONTEXT)
    }

    /// Derives a purpose-bound 32-byte sub-seed.
    pub fn derive(&self, purpose: &str) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(blake3::derive_key(purpose, self.seed.as_slice()))
    }

    /// Short public identifier of the seed, safe to log.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.seed.as_slice());
        hex::encode(&hash.as_bytes()[..8])
    }
}

impl Default for DeterminismContext {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl fmt::Debug for DeterminismContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeterminismContext")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
