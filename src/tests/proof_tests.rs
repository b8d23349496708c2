// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use crate::config::{KernelConfig, KERNEL_VERSION};
use crate::digest::digest;
use crate::kernel::TriadKernel;
use crate::lane::{FnComputation, LaneFault, LaneId};
use crate::determinism::DeterminismContext;
use crate::proof::ExecutionProof;

#[test]
fn test_proof_for_verified_record() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let record = kernel.run(b"hello").unwrap();

    let proof = ExecutionProof::from_record(&record).unwrap();
    assert_eq!(proof.kernel_version, KERNEL_VERSION);
    assert_eq!(proof.intent_digest, digest(b"hello"));
    assert_eq!(proof.output_digest, digest(b"hello"));

    let signature = record.signature.as_ref().unwrap();
    assert_eq!(proof.signature_hash, *blake3::hash(signature.as_bytes()).as_bytes());
}

#[test]
fn test_proof_hash_is_stable_and_binding() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let a = ExecutionProof::from_record(&kernel.run(b"hello").unwrap()).unwrap();
    let b = ExecutionProof::from_record(&kernel.run(b"hello").unwrap()).unwrap();
    assert_eq!(a.hash(), b.hash());

    let c = ExecutionProof::from_record(&kernel.run(b"world").unwrap()).unwrap();
    assert_ne!(a.hash(), c.hash());

    let mut tampered = a.clone();
    tampered.kernel_version += 1;
    assert_ne!(a.hash(), tampered.hash());
}

#[test]
fn test_no_proof_for_failure_record() {
    let kernel = TriadKernel::with_computation(
        KernelConfig::default(),
        Arc::new(FnComputation(
            |lane: LaneId, _: &[u8], _: &DeterminismContext| -> Result<Vec<u8>, LaneFault> {
                Ok(vec![lane.0])
            },
        )),
    )
    .unwrap();
    let err = kernel.run(b"hello").unwrap_err();
    assert!(ExecutionProof::from_record(err.record().unwrap()).is_none());
}

#[test]
fn test_proof_json_roundtrip() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let proof = ExecutionProof::from_record(&kernel.run(b"hello").unwrap()).unwrap();
    let json = serde_json::to_string(&proof).unwrap();
    let back: ExecutionProof = serde_json::from_str(&json).unwrap();
    assert_eq!(back, proof);
}
