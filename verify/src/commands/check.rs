// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anyhow::{Context, Result};
use triad_kernel::digest::digest;
use triad_kernel::drift;
use triad_kernel::proof::ExecutionProof;
use triad_kernel::signer::{self, PublicKey};
use triad_kernel::ExecutionStatus;

use crate::envelope::RecordEnvelope;

/// Independently re-verifies an exported record.
///
/// When `public_key_hex` is given it is the trust anchor; otherwise the
/// key embedded in the envelope is used, which only proves internal
/// consistency.
pub fn run(path: &Path, public_key_hex: Option<&str>) -> Result<ExecutionProof> {
    let envelope = RecordEnvelope::load(path)?;
    let record = &envelope.record;

    let public_key = match public_key_hex {
        Some(hex_key) => PublicKey::from_hex(hex_key).context("Invalid public key hex")?,
        None => {
            tracing::warn!("no trusted public key given; using the key embedded in the record");
            envelope.public_key.clone()
        }
    };

    if record.status != ExecutionStatus::Verified {
        anyhow::bail!("Record status is {:?}, not Verified", record.status);
    }

    // 1. Intent digest
    let intent = envelope.intent_bytes()?;
    let intent_digest = digest(&intent);
    if intent_digest != record.intent_digest {
        anyhow::bail!(
            "Intent digest mismatch: record {}, computed {}",
            record.intent_digest,
            intent_digest
        );
    }

    // 2. Output digest
    let output = record.voted_output.as_deref().context("Record has no voted output")?;
    let output_digest = digest(output);
    if Some(output_digest) != record.output_digest {
        anyhow::bail!("Output digest mismatch: computed {}", output_digest);
    }

    // 3. Drift gate
    let verdict = drift::verify(intent_digest.as_bytes(), output_digest.as_bytes());
    if !verdict.passed {
        anyhow::bail!("Drift gate fails on re-check: distance {:e}", verdict.distance);
    }
    if verdict.distance != record.distance {
        anyhow::bail!(
            "Recorded distance {:e} does not match recomputed {:e}",
            record.distance,
            verdict.distance
        );
    }

    // 4. Signature
    let signature = record.signature.as_ref().context("Record is not signed")?;
    if !signer::verify(output, signature, &public_key) {
        eprintln!("\n❌ SIGNATURE INVALID\n");
        anyhow::bail!("Signature verification failed");
    }

    let proof = ExecutionProof::from_record(record).context("Record cannot produce a proof")?;
    eprintln!("\n✅ VERIFIED\n");
    eprintln!("Proof Hash:    {}", hex::encode(proof.hash()));
    eprintln!("Public Key:    {}", public_key.fingerprint());
    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(proof)
}
