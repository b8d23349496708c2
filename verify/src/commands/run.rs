// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use triad_kernel::determinism::DeterminismContext;
use triad_kernel::{KernelConfig, TriadKernel};

use crate::envelope::RecordEnvelope;

/// Runs `intent` through a freshly constructed kernel and writes the
/// envelope to `out` (or stdout). Gate failures are still written, then
/// reported as errors.
pub fn run(
    intent: &[u8],
    seed_hex: Option<&str>,
    timeout_ms: Option<u64>,
    out: Option<&Path>,
) -> Result<RecordEnvelope> {
    let mut config = KernelConfig::default();
    if let Some(seed_hex) = seed_hex {
        config.context = DeterminismContext::from_hex(seed_hex)
            .context("Seed must be exactly 32 bytes of hex")?;
    }
    if let Some(ms) = timeout_ms {
        config = config.with_lane_timeout(Duration::from_millis(ms));
    }

    let kernel = TriadKernel::new(config).context("Failed to initialize kernel")?;
    let outcome = kernel.run(intent);

    let record = match &outcome {
        Ok(record) => record.clone(),
        Err(e) => match e.record() {
            Some(record) => record.clone(),
            None => return Err(anyhow::anyhow!("Kernel run failed: {e}")),
        },
    };

    let envelope = RecordEnvelope::new(intent, kernel.public_key().clone(), record);
    match out {
        Some(path) => {
            envelope.save(path)?;
            tracing::info!(path = %path.display(), "record written");
        }
        None => println!("{}", serde_json::to_string_pretty(&envelope)?),
    }

    if let Err(e) = outcome {
        anyhow::bail!("Execution rejected: {e}");
    }

    eprintln!("\n✅ VERIFIED\n");
    eprintln!("Intent Digest: {}", envelope.record.intent_digest);
    eprintln!("Public Key:    {}", envelope.public_key.fingerprint());
    Ok(envelope)
}
