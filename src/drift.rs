// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Drift Verifier (AVA gate).
//!
//! The gate measures the normalized Hamming distance between two digests
//! (differing bits over total bits) and passes only when that distance is
//! at or below [`DRIFT_THRESHOLD`]. Identical digests yield exactly `0.0`.
//!
//! Malformed input fails closed with the maximal distance `1.0`.

use serde::{Deserialize, Serialize};

use crate::config::{DIGEST_LEN, DRIFT_THRESHOLD};

/// Maximal distance, reported for every fail-closed verdict.
pub const MAX_DISTANCE: f64 = 1.0;

const DIGEST_BITS: u32 = (DIGEST_LEN * 8) as u32;

/// Outcome of one gate evaluation. `passed == (distance <= DRIFT_THRESHOLD)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub distance: f64,
    pub passed: bool,
}

impl VerificationVerdict {
    /// Applies the decision rule to an already computed distance.
    /// Negative or NaN distances are treated as malformed.
    pub fn from_distance(distance: f64) -> Self {
        if distance.is_nan() || distance < 0.0 {
            return Self::fail_closed();
        }
        Self {
            distance,
            passed: distance <= DRIFT_THRESHOLD,
        }
    }

    pub fn fail_closed() -> Self {
        Self {
            distance: MAX_DISTANCE,
            passed: false,
        }
    }
}

/// Normalized bitwise Hamming distance in `[0, 1]`, or `None` when either
/// side is not a well-formed digest.
pub fn normalized_distance(a: &[u8], b: &[u8]) -> Option<f64> {
    if a.len() != DIGEST_LEN || b.len() != DIGEST_LEN {
        return None;
    }
    let differing: u32 = a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum();
    Some(f64::from(differing) / f64::from(DIGEST_BITS))
}

/// Compares an intent digest against an output digest.
pub fn verify(intent_digest: &[u8], output_digest: &[u8]) -> VerificationVerdict {
    match normalized_distance(intent_digest, output_digest) {
        Some(distance) => VerificationVerdict::from_distance(distance),
        None => VerificationVerdict::fail_closed(),
    }
}
