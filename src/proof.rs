//! Deterministic Execution Proofs.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};

use crate::config::KERNEL_VERSION;
use crate::digest::Digest;
use crate::record::ExecutionRecord;

/// A compact receipt for a verified execution.
///
/// Binds the intent digest, the accepted output digest and the signature
/// together under the kernel protocol version. Two kernels with the same
/// seed produce the same proof for the same intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionProof {
    /// The version of the kernel protocol (schema version).
    pub kernel_version: u64,

    /// SHA-384 digest of the intent.
    pub intent_digest: Digest,

    /// SHA-384 digest of the voted output.
    pub output_digest: Digest,

    /// BLAKE3 hash of the encoded signature.
    #[serde(with = "hex_array")]
    pub signature_hash: [u8; 32],
}

impl ExecutionProof {
    /// Builds the proof for a verified record; `None` for failure records.
    pub fn from_record(record: &ExecutionRecord) -> Option<Self> {
        if !record.is_verified() {
            return None;
        }
        let signature = record.signature.as_ref()?;
        Some(Self {
            kernel_version: KERNEL_VERSION,
            intent_digest: record.intent_digest,
            output_digest: record.output_digest?,
            signature_hash: *blake3::hash(signature.as_bytes()).as_bytes(),
        })
    }

    /// BLAKE3 hash over the canonical encoding:
    /// `version (u64 LE) | intent_digest | output_digest | signature_hash`.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.kernel_version.to_le_bytes());
        hasher.update(self.intent_digest.as_bytes());
        hasher.update(self.output_digest.as_bytes());
        hasher.update(&self.signature_hash);
        *hasher.finalize().as_bytes()
    }
}

mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
