// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants and kernel configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::determinism::DeterminismContext;
use crate::error::{KernelError, KernelResult};

/// Protocol version stamped into every execution proof.
pub const KERNEL_VERSION: u64 = 1;

/// Length in bytes of a digest (SHA-384).
pub const DIGEST_LEN: usize = 48;

/// Maximum normalized digest distance accepted by the drift gate.
pub const DRIFT_THRESHOLD: f64 = 1e-10;

/// Number of redundant lanes per run.
pub const LANE_COUNT: usize = 3;

/// Minimum number of agreeing `Ok` lanes for a quorum.
pub const QUORUM: usize = 2;

/// How long the orchestrator waits for straggling lanes.
pub const DEFAULT_LANE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed process seed used when the caller does not supply one.
pub const DEFAULT_SEED: [u8; 32] = *b"triad-kernel-deterministic-seed!";

/// ML-DSA context string bound into every signature.
pub const SIGNING_CONTEXT: &[u8] = b"triad-kernel/v1";

/// Runtime configuration for a [`crate::kernel::TriadKernel`].
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub context: DeterminismContext,
    pub lane_timeout: Duration,
    /// Externally computed safety metrics, copied verbatim into every record.
    pub safety_metrics: BTreeMap<String, f64>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            context: DeterminismContext::default(),
            lane_timeout: DEFAULT_LANE_TIMEOUT,
            safety_metrics: BTreeMap::new(),
        }
    }
}

impl KernelConfig {
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            context: DeterminismContext::new(seed),
            ..Self::default()
        }
    }

    pub fn with_lane_timeout(mut self, timeout: Duration) -> Self {
        self.lane_timeout = timeout;
        self
    }

    pub fn with_safety_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.safety_metrics.insert(name.into(), value);
        self
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.lane_timeout.is_zero() {
            return Err(KernelError::InvalidConfig("lane timeout must be non-zero".into()));
        }
        if let Some((name, value)) = self.safety_metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(KernelError::InvalidConfig(format!(
                "safety metric {name} is not finite: {value}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let cfg = KernelConfig::default().with_lane_timeout(Duration::ZERO);
        assert!(matches!(cfg.validate(), Err(KernelError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_finite_metric() {
        let cfg = KernelConfig::default().with_safety_metric("safety.pfh_du", f64::NAN);
        assert!(cfg.validate().is_err());
    }
}
