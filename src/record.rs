// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Execution records.
//!
//! One immutable [`ExecutionRecord`] is produced per `run`, whether the
//! run was verified or stopped at a gate. Failure records never carry a
//! signature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::drift::MAX_DISTANCE;
use crate::error::{KernelError, KernelResult};
use crate::lane::{LaneId, LaneResult};
use crate::signer::Signature;
use crate::voter::VotedOutput;

/// Named metrics attached to a record, ordered by name.
pub type Diagnostics = BTreeMap<String, f64>;

pub const DIAG_LANES_OK: &str = "lanes.ok";
pub const DIAG_LANES_FAULTED: &str = "lanes.faulted";
pub const DIAG_LANES_AGREEING: &str = "lanes.agreeing";
pub const DIAG_DRIFT_DISTANCE: &str = "drift.distance";
pub const DIAG_DRIFT_THRESHOLD: &str = "drift.threshold";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Verified,
    QuorumFailure,
    SemanticDrift,
}

/// Audit summary of one lane. Outputs themselves are not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneReport {
    pub lane: LaneId,
    pub ok: bool,
    pub output_digest: Option<Digest>,
    pub fault: Option<String>,
}

impl From<&LaneResult> for LaneReport {
    fn from(result: &LaneResult) -> Self {
        Self {
            lane: result.lane,
            ok: result.is_ok(),
            output_digest: result.output_digest,
            fault: result.fault().map(|f| f.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: ExecutionStatus,
    #[serde(with = "hex_opt")]
    pub voted_output: Option<Vec<u8>>,
    /// Drift distance; [`MAX_DISTANCE`] when the gate was never reached.
    pub distance: f64,
    pub signature: Option<Signature>,
    pub diagnostics: Diagnostics,
    pub intent_digest: Digest,
    pub output_digest: Option<Digest>,
    pub lanes: Vec<LaneReport>,
}

impl ExecutionRecord {
    pub(crate) fn quorum_failure(
        intent_digest: Digest,
        lanes: &[LaneResult],
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            status: ExecutionStatus::QuorumFailure,
            voted_output: None,
            distance: MAX_DISTANCE,
            signature: None,
            diagnostics,
            intent_digest,
            output_digest: None,
            lanes: lanes.iter().map(LaneReport::from).collect(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status == ExecutionStatus::Verified && self.signature.is_some()
    }

    /// Compact binary encoding.
    pub fn to_bytes(&self) -> KernelResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| KernelError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> KernelResult<Self> {
        let (record, read) =
            bincode::serde::decode_from_slice::<Self, _>(bytes, bincode::config::standard())
                .map_err(|e| KernelError::Encoding(e.to_string()))?;
        if read != bytes.len() {
            return Err(KernelError::Encoding(format!(
                "{} trailing bytes after record",
                bytes.len() - read
            )));
        }
        Ok(record)
    }
}

/// Builds the lane counters shared by every record of a run.
pub(crate) fn lane_diagnostics(
    base: &Diagnostics,
    lanes: &[LaneResult],
    voted: &VotedOutput,
) -> Diagnostics {
    let mut diagnostics = base.clone();
    let ok = lanes.iter().filter(|r| r.is_ok()).count();
    diagnostics.insert(DIAG_LANES_OK.into(), ok as f64);
    diagnostics.insert(DIAG_LANES_FAULTED.into(), voted.faulted() as f64);
    diagnostics.insert(DIAG_LANES_AGREEING.into(), voted.agreeing() as f64);
    diagnostics
}

mod hex_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
