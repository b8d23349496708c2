// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! triad-kernel: a deterministic, triple-redundant execution kernel with a
//! digest drift gate and post-quantum signed results.

pub mod config;
pub mod error;
pub mod determinism;
pub mod digest;
pub mod drift;
pub mod lane;
pub mod voter;
pub mod signer;
pub mod record;
pub mod proof;
pub mod kernel;

pub use config::KernelConfig;
pub use error::{ErrorKind, KernelError, KernelResult};
pub use kernel::TriadKernel;
pub use record::{ExecutionRecord, ExecutionStatus};

#[cfg(test)]
pub mod tests;
