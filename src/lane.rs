// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Triple-Lane Executor.
//!
//! A run spawns exactly [`LANE_COUNT`] isolated lanes. Each lane gets the
//! same intent, the same [`DeterminismContext`] and the same read-only
//! [`LaneComputation`]; nothing mutable is shared. A lane reports exactly
//! once over a channel, and the executor waits for reports until a shared
//! deadline.
//!
//! Lane faults are contained at the lane boundary:
//! - a panic inside the computation is caught and reported as `Panicked`,
//! - an error returned by the computation is reported as `Failed`,
//! - a lane that misses the deadline is recorded as `TimedOut` and its
//!   thread is detached (never joined, never killed).

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LANE_COUNT;
use crate::determinism::DeterminismContext;
use crate::digest::{digest, Digest};

/// Index of a lane within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LaneId(pub u8);

impl LaneId {
    pub const ALL: [LaneId; LANE_COUNT] = [LaneId(0), LaneId(1), LaneId(2)];

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Why a lane was excluded from the vote.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaneFault {
    #[error("lane panicked: {0}")]
    Panicked(String),
    #[error("lane computation failed: {0}")]
    Failed(String),
    #[error("lane did not report before the deadline")]
    TimedOut,
    #[error("lane exited without reporting")]
    Disconnected,
}

/// The deterministic function every lane executes.
pub trait LaneComputation: Send + Sync {
    fn execute(
        &self,
        lane: LaneId,
        intent: &[u8],
        ctx: &DeterminismContext,
    ) -> Result<Vec<u8>, LaneFault>;
}

/// Self-check computation: the output is a faithful copy of the intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoComputation;

impl LaneComputation for EchoComputation {
    fn execute(
        &self,
        _lane: LaneId,
        intent: &[u8],
        _ctx: &DeterminismContext,
    ) -> Result<Vec<u8>, LaneFault> {
        Ok(intent.to_vec())
    }
}

/// Adapts a closure into a [`LaneComputation`].
pub struct FnComputation<F>(pub F);

impl<F> LaneComputation for FnComputation<F>
where
    F: Fn(LaneId, &[u8], &DeterminismContext) -> Result<Vec<u8>, LaneFault> + Send + Sync,
{
    fn execute(
        &self,
        lane: LaneId,
        intent: &[u8],
        ctx: &DeterminismContext,
    ) -> Result<Vec<u8>, LaneFault> {
        (self.0)(lane, intent, ctx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneStatus {
    Ok,
    Faulted(LaneFault),
}

/// One lane's report. `output` and `output_digest` are present iff the lane is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneResult {
    pub lane: LaneId,
    pub output: Option<Vec<u8>>,
    pub output_digest: Option<Digest>,
    pub status: LaneStatus,
}

impl LaneResult {
    pub fn ok(lane: LaneId, output: Vec<u8>) -> Self {
        let output_digest = Some(digest(&output));
        Self {
            lane,
            output: Some(output),
            output_digest,
            status: LaneStatus::Ok,
        }
    }

    pub fn faulted(lane: LaneId, fault: LaneFault) -> Self {
        Self {
            lane,
            output: None,
            output_digest: None,
            status: LaneStatus::Faulted(fault),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == LaneStatus::Ok
    }

    pub fn fault(&self) -> Option<&LaneFault> {
        match &self.status {
            LaneStatus::Ok => None,
            LaneStatus::Faulted(fault) => Some(fault),
        }
    }

    fn from_outcome(lane: LaneId, outcome: Result<Vec<u8>, LaneFault>) -> Self {
        match outcome {
            Ok(output) => Self::ok(lane, output),
            Err(fault) => Self::faulted(lane, fault),
        }
    }
}

/// Runs one computation across three isolated lanes.
pub struct LaneExecutor {
    computation: Arc<dyn LaneComputation>,
    ctx: DeterminismContext,
    timeout: Duration,
}

impl fmt::Debug for LaneExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneExecutor")
            .field("ctx", &self.ctx)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LaneExecutor {
    pub fn new(
        computation: Arc<dyn LaneComputation>,
        ctx: DeterminismContext,
        timeout: Duration,
    ) -> Self {
        Self {
            computation,
            ctx,
            timeout,
        }
    }

    /// Executes the intent on every lane and returns one result per lane,
    /// ordered by lane id.
    pub fn execute(&self, intent: &[u8]) -> Vec<LaneResult> {
        let intent: Arc<[u8]> = Arc::from(intent);
        let (tx, rx) = mpsc::channel::<(LaneId, Result<Vec<u8>, LaneFault>)>();
        let mut slots: Vec<Option<LaneResult>> = vec![None; LANE_COUNT];

        for lane in LaneId::ALL {
            let tx = tx.clone();
            let intent = Arc::clone(&intent);
            let computation = Arc::clone(&self.computation);
            let ctx = self.ctx.clone();

            let spawned = thread::Builder::new()
                .name(format!("triad-lane-{}", lane.0))
                .spawn(move || {
                    let outcome = run_isolated(lane, computation.as_ref(), &intent, &ctx);
                    // The receiver is gone once the deadline has passed.
                    let _ = tx.send((lane, outcome));
                });

            if let Err(e) = spawned {
                warn!(lane = lane.0, error = %e, "failed to spawn lane");
                slots[lane.index()] = Some(LaneResult::faulted(
                    lane,
                    LaneFault::Failed(format!("spawn failed: {e}")),
                ));
            }
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut missing = LaneFault::TimedOut;
        while slots.iter().any(Option::is_none) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((lane, outcome)) => {
                    debug!(lane = lane.0, ok = outcome.is_ok(), "lane reported");
                    slots[lane.index()] = Some(LaneResult::from_outcome(lane, outcome));
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    missing = LaneFault::Disconnected;
                    break;
                }
            }
        }

        LaneId::ALL
            .iter()
            .map(|&lane| {
                slots[lane.index()].take().unwrap_or_else(|| {
                    warn!(lane = lane.0, fault = %missing, "lane excluded from vote");
                    LaneResult::faulted(lane, missing.clone())
                })
            })
            .collect()
    }
}

/// Runs the computation with panic containment. Never unwinds.
fn run_isolated(
    lane: LaneId,
    computation: &dyn LaneComputation,
    intent: &[u8],
    ctx: &DeterminismContext,
) -> Result<Vec<u8>, LaneFault> {
    match panic::catch_unwind(AssertUnwindSafe(|| computation.execute(lane, intent, ctx))) {
        Ok(outcome) => outcome,
        Err(payload) => Err(LaneFault::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
