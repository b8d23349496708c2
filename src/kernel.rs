// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Kernel Orchestrator.
//!
//! Composes the digest engine, the triple-lane executor, the voter, the
//! drift gate and the signer into the `run` protocol:
//!
//! ```text
//! intent ─► digest ─► 3 lanes ─► vote ─► digest(output) ─► drift gate ─► sign ─► record
//!                                  │                           │
//!                                  └─ NoQuorum: QuorumFailure  └─ fail: SemanticDrift
//! ```
//!
//! Gate failures are never retried: lanes are deterministic, so a retry
//! would reproduce the same disagreement.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::{KernelConfig, DRIFT_THRESHOLD};
use crate::determinism::DeterminismContext;
use crate::digest::digest;
use crate::drift;
use crate::error::{KernelError, KernelResult};
use crate::lane::{EchoComputation, LaneComputation, LaneExecutor};
use crate::record::{
    lane_diagnostics, ExecutionRecord, ExecutionStatus, LaneReport, DIAG_DRIFT_DISTANCE,
    DIAG_DRIFT_THRESHOLD,
};
use crate::signer::{PqSigner, PublicKey};
use crate::voter::{vote, VotedOutput};

/// The execution kernel. Construct once and share by reference; `run`
/// takes `&self` and may be called from many threads at once.
#[derive(Debug)]
pub struct TriadKernel {
    config: KernelConfig,
    executor: LaneExecutor,
    signer: PqSigner,
}

impl TriadKernel {
    /// Kernel running the self-check [`EchoComputation`] on every lane.
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        Self::with_computation(config, Arc::new(EchoComputation))
    }

    pub fn with_computation(
        config: KernelConfig,
        computation: Arc<dyn LaneComputation>,
    ) -> KernelResult<Self> {
        config.validate()?;
        let signer = PqSigner::new(&config.context)?;
        let executor = LaneExecutor::new(computation, config.context.clone(), config.lane_timeout);

        info!(
            seed = %config.context.fingerprint(),
            lane_timeout_ms = config.lane_timeout.as_millis() as u64,
            "triad kernel initialized"
        );

        Ok(Self {
            config,
            executor,
            signer,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        self.signer.public_key()
    }

    pub fn context(&self) -> &DeterminismContext {
        &self.config.context
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn signer_mut(&mut self) -> &mut PqSigner {
        &mut self.signer
    }

    /// Executes `intent` through three lanes, gates the voted output and
    /// signs it.
    #[instrument(skip(self, intent), fields(intent_len = intent.len()))]
    pub fn run(&self, intent: &[u8]) -> KernelResult<ExecutionRecord> {
        let started = Instant::now();
        metrics::counter!("triad_runs_total", 1);

        let result = self.run_inner(intent);

        metrics::histogram!("triad_run_duration_seconds", started.elapsed().as_secs_f64());
        match &result {
            Ok(_) => {
                metrics::counter!("triad_runs_verified_total", 1);
            }
            Err(KernelError::QuorumFailure { .. }) => {
                metrics::counter!("triad_quorum_failures_total", 1);
            }
            Err(KernelError::SemanticDrift { .. }) => {
                metrics::counter!("triad_semantic_drift_total", 1);
            }
            Err(_) => {}
        }
        result
    }

    fn run_inner(&self, intent: &[u8]) -> KernelResult<ExecutionRecord> {
        // 1. Intent digest
        let intent_digest = digest(intent);

        // 2. Lanes + vote
        let lanes = self.executor.execute(intent);
        let faults = lanes.iter().filter(|r| !r.is_ok()).count();
        if faults > 0 {
            metrics::counter!("triad_lane_faults_total", faults as u64);
        }
        let voted = vote(&lanes);
        let mut diagnostics = lane_diagnostics(&self.config.safety_metrics, &lanes, &voted);
        diagnostics.insert(DIAG_DRIFT_THRESHOLD.into(), DRIFT_THRESHOLD);

        // 3. Quorum gate
        let (output, output_digest) = match voted {
            VotedOutput::Quorum { output, digest, .. } => (output, digest),
            VotedOutput::NoQuorum { agreeing, faulted } => {
                warn!(agreeing, faulted, intent = %intent_digest, "no quorum");
                let record = ExecutionRecord::quorum_failure(intent_digest, &lanes, diagnostics);
                return Err(KernelError::QuorumFailure {
                    agreeing,
                    faulted,
                    record: Box::new(record),
                });
            }
        };

        // 4-5. Drift gate
        let verdict = drift::verify(intent_digest.as_bytes(), output_digest.as_bytes());
        diagnostics.insert(DIAG_DRIFT_DISTANCE.into(), verdict.distance);
        let lane_reports: Vec<LaneReport> = lanes.iter().map(LaneReport::from).collect();

        // 6. Drift failure
        if !verdict.passed {
            warn!(distance = verdict.distance, intent = %intent_digest, output = %output_digest, "semantic drift");
            let record = ExecutionRecord {
                status: ExecutionStatus::SemanticDrift,
                voted_output: Some(output),
                distance: verdict.distance,
                signature: None,
                diagnostics,
                intent_digest,
                output_digest: Some(output_digest),
                lanes: lane_reports,
            };
            return Err(KernelError::SemanticDrift {
                distance: verdict.distance,
                record: Box::new(record),
            });
        }

        // 7. Sign
        let signature = self.signer.sign(&output)?;
        info!(intent = %intent_digest, distance = verdict.distance, "execution verified");

        Ok(ExecutionRecord {
            status: ExecutionStatus::Verified,
            voted_output: Some(output),
            distance: verdict.distance,
            signature: Some(signature),
            diagnostics,
            intent_digest,
            output_digest: Some(output_digest),
            lanes: lane_reports,
        })
    }
}
