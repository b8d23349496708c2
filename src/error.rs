// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

use crate::config::{DRIFT_THRESHOLD, LANE_COUNT};
use crate::record::ExecutionRecord;

/// Failures surfaced to the caller of the kernel. Lane faults never
/// appear here; they are absorbed by the executor and only counted.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Fewer than two lanes agreed. Carries the unsigned failure record.
    #[error("quorum failure: {agreeing} of {} lanes agreed, {faulted} faulted", LANE_COUNT)]
    QuorumFailure {
        agreeing: usize,
        faulted: usize,
        record: Box<ExecutionRecord>,
    },

    /// The voted output drifted from the intent. Carries the unsigned failure record.
    #[error("semantic drift: distance {distance:e} exceeds threshold {:e}", DRIFT_THRESHOLD)]
    SemanticDrift {
        distance: f64,
        record: Box<ExecutionRecord>,
    },

    /// Key material is absent or corrupted. The kernel will not sign.
    #[error("key material fault: {0}")]
    KeyMaterialFault(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("record encoding error: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    QuorumFailure,
    SemanticDrift,
    KeyMaterialFault,
    InvalidConfig,
    Encoding,
}

impl KernelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KernelError::QuorumFailure { .. } => ErrorKind::QuorumFailure,
            KernelError::SemanticDrift { .. } => ErrorKind::SemanticDrift,
            KernelError::KeyMaterialFault(_) => ErrorKind::KeyMaterialFault,
            KernelError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            KernelError::Encoding(_) => ErrorKind::Encoding,
        }
    }

    /// The failure record for gate failures, if any.
    pub fn record(&self) -> Option<&ExecutionRecord> {
        match self {
            KernelError::QuorumFailure { record, .. } | KernelError::SemanticDrift { record, .. } => {
                Some(record.as_ref())
            }
            _ => None,
        }
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
