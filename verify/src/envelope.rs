// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! On-disk format exchanged between `run` and `check`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use triad_kernel::signer::PublicKey;
use triad_kernel::ExecutionRecord;

/// A record together with everything an offline verifier needs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordEnvelope {
    /// Hex-encoded intent bytes.
    pub intent: String,
    pub public_key: PublicKey,
    pub record: ExecutionRecord,
}

impl RecordEnvelope {
    pub fn new(intent: &[u8], public_key: PublicKey, record: ExecutionRecord) -> Self {
        Self {
            intent: hex::encode(intent),
            public_key,
            record,
        }
    }

    pub fn intent_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.intent).context("Envelope intent is not valid hex")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read record file {}", path.display()))?;
        serde_json::from_slice(&bytes).context("Failed to parse record envelope JSON")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write record file {}", path.display()))
    }
}
