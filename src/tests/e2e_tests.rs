// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;
use std::time::Duration;

use crate::config::{KernelConfig, DRIFT_THRESHOLD};
use crate::determinism::DeterminismContext;
use crate::digest::digest;
use crate::drift::MAX_DISTANCE;
use crate::error::{ErrorKind, KernelError};
use crate::kernel::TriadKernel;
use crate::lane::{FnComputation, LaneFault, LaneId};
use crate::record::{
    ExecutionStatus, DIAG_DRIFT_DISTANCE, DIAG_LANES_AGREEING, DIAG_LANES_FAULTED, DIAG_LANES_OK,
};
use crate::signer;

type Outcome = Result<Vec<u8>, LaneFault>;

fn kernel_with<F>(f: F) -> TriadKernel
where
    F: Fn(LaneId, &[u8], &DeterminismContext) -> Outcome + Send + Sync + 'static,
{
    TriadKernel::with_computation(KernelConfig::default(), Arc::new(FnComputation(f))).unwrap()
}

#[test]
fn test_scenario_echo_verified() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let record = kernel.run(b"hello").unwrap();

    assert_eq!(record.status, ExecutionStatus::Verified);
    assert_eq!(record.voted_output.as_deref(), Some(&b"hello"[..]));
    assert_eq!(record.distance, 0.0);
    assert_eq!(record.intent_digest, digest(b"hello"));
    assert_eq!(record.output_digest, Some(digest(b"hello")));
    assert_eq!(record.diagnostics[DIAG_LANES_OK], 3.0);
    assert_eq!(record.diagnostics[DIAG_LANES_AGREEING], 3.0);
    assert_eq!(record.diagnostics[DIAG_DRIFT_DISTANCE], 0.0);

    let signature = record.signature.as_ref().expect("verified record is signed");
    assert!(signer::verify(b"hello", signature, kernel.public_key()));
}

#[test]
fn test_scenario_one_lane_faults_still_verified() {
    let kernel = kernel_with(|lane, intent, _| {
        if lane == LaneId(0) {
            panic!("lane 0 hardware fault");
        }
        Ok(intent.to_vec())
    });
    let record = kernel.run(b"hello").unwrap();

    assert_eq!(record.status, ExecutionStatus::Verified);
    assert_eq!(record.voted_output.as_deref(), Some(&b"hello"[..]));
    assert_eq!(record.diagnostics[DIAG_LANES_FAULTED], 1.0);
    assert_eq!(record.diagnostics[DIAG_LANES_AGREEING], 2.0);
    assert!(!record.lanes[0].ok);
    assert!(record.lanes[0].fault.as_deref().unwrap().contains("lane 0 hardware fault"));
    assert!(record.signature.is_some());
}

#[test]
fn test_scenario_disagreement_is_quorum_failure() {
    let kernel = kernel_with(|lane, intent, _| {
        let mut out = intent.to_vec();
        out.push(lane.0);
        Ok(out)
    });
    let err = kernel.run(b"hello").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QuorumFailure);
    match &err {
        KernelError::QuorumFailure { agreeing, faulted, record } => {
            assert_eq!(*agreeing, 1);
            assert_eq!(*faulted, 0);
            assert_eq!(record.status, ExecutionStatus::QuorumFailure);
            assert!(record.signature.is_none());
            assert!(record.voted_output.is_none());
            assert_eq!(record.distance, MAX_DISTANCE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_two_faulted_lanes_is_quorum_failure() {
    let kernel = kernel_with(|lane, intent, _| {
        if lane == LaneId(0) {
            Ok(intent.to_vec())
        } else {
            Err(LaneFault::Failed("injected".into()))
        }
    });
    let err = kernel.run(b"hello").unwrap_err();
    let record = err.record().unwrap();
    assert_eq!(record.status, ExecutionStatus::QuorumFailure);
    assert_eq!(record.diagnostics[DIAG_LANES_FAULTED], 2.0);
    assert!(err.to_string().contains("1 of 3 lanes agreed"));
}

#[test]
fn test_transforming_computation_is_semantic_drift() {
    let kernel = kernel_with(|_, intent, _| Ok(intent.to_ascii_uppercase()));
    let err = kernel.run(b"hello").unwrap_err();

    match &err {
        KernelError::SemanticDrift { distance, record } => {
            assert!(*distance > DRIFT_THRESHOLD);
            assert_eq!(record.distance, *distance);
            assert_eq!(record.status, ExecutionStatus::SemanticDrift);
            assert_eq!(record.voted_output.as_deref(), Some(&b"HELLO"[..]));
            assert!(record.signature.is_none());
            assert_eq!(record.diagnostics[DIAG_DRIFT_DISTANCE], *distance);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_straggler_lane_excluded() {
    let config = KernelConfig::default().with_lane_timeout(Duration::from_millis(200));
    let kernel = TriadKernel::with_computation(
        config,
        Arc::new(FnComputation(|lane: LaneId, intent: &[u8], _: &DeterminismContext| -> Outcome {
            if lane == LaneId(1) {
                std::thread::sleep(Duration::from_millis(1500));
            }
            Ok(intent.to_vec())
        })),
    )
    .unwrap();

    let record = kernel.run(b"hello").unwrap();
    assert_eq!(record.status, ExecutionStatus::Verified);
    assert_eq!(
        record.lanes[1].fault.as_deref(),
        Some("lane did not report before the deadline")
    );
}

#[test]
fn test_safety_metrics_are_plumbed_through() {
    let config = KernelConfig::default()
        .with_safety_metric("safety.pfh_du", 1.2e-9)
        .with_safety_metric("safety.diagnostic_coverage", 0.99);
    let kernel = TriadKernel::new(config).unwrap();

    let record = kernel.run(b"hello").unwrap();
    assert_eq!(record.diagnostics["safety.pfh_du"], 1.2e-9);
    assert_eq!(record.diagnostics["safety.diagnostic_coverage"], 0.99);

    let kernel = kernel_with(|lane, _, _| Ok(vec![lane.0]));
    let err = kernel.run(b"hello").unwrap_err();
    assert!(!err.record().unwrap().diagnostics.contains_key("safety.pfh_du"));
}

#[test]
fn test_empty_intent_verifies() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let record = kernel.run(b"").unwrap();
    assert!(record.is_verified());
    assert_eq!(record.voted_output.as_deref(), Some(&b""[..]));
}

#[test]
fn test_invalid_config_rejected() {
    let config = KernelConfig::default().with_lane_timeout(Duration::ZERO);
    let err = TriadKernel::new(config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_key_material_fault_blocks_signing() {
    let mut kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    kernel.signer_mut().corrupt_fingerprint();

    let err = kernel.run(b"hello").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyMaterialFault);
    assert!(matches!(err, KernelError::KeyMaterialFault(_)));
    assert!(err.record().is_none(), "no record, so no signature, escapes a key fault");
}
