// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use crate::config::KernelConfig;
use crate::determinism::DeterminismContext;
use crate::kernel::TriadKernel;
use crate::lane::{FnComputation, LaneFault, LaneId};

/// A simple deterministic RNG for tests.
struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    fn new(seed: u64) -> Self {
        Self { state: seed, inc: 1 }
    }

    fn next_u32(&mut self) -> u32 {
        let oldstate = self.state;
        self.state = oldstate.wrapping_mul(6364136223846793005).wrapping_add(self.inc);
        let xorshifted = (((oldstate >> 18) ^ oldstate) >> 27) as u32;
        let rot = (oldstate >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

fn random_intent(rng: &mut Pcg32) -> Vec<u8> {
    let len = (rng.next_u32() % 64) as usize;
    (0..len).map(|_| rng.next_u32() as u8).collect()
}

#[test]
fn test_repeated_runs_are_identical() {
    let kernel = TriadKernel::new(KernelConfig::default()).unwrap();
    let mut rng = Pcg32::new(42);

    for _ in 0..8 {
        let intent = random_intent(&mut rng);
        let first = kernel.run(&intent).unwrap();
        let second = kernel.run(&intent).unwrap();
        assert_eq!(first.voted_output, second.voted_output);
        assert_eq!(first.distance, second.distance);
        assert_eq!(first.signature, second.signature);
        assert_eq!(first, second);
    }
}

#[test]
fn test_independent_kernels_with_same_seed_agree() {
    let a = TriadKernel::new(KernelConfig::with_seed([9; 32])).unwrap();
    let b = TriadKernel::new(KernelConfig::with_seed([9; 32])).unwrap();
    assert_eq!(a.public_key(), b.public_key());
    assert_eq!(a.run(b"hello").unwrap(), b.run(b"hello").unwrap());
}

#[test]
fn test_different_seed_changes_signature_only() {
    let a = TriadKernel::new(KernelConfig::with_seed([1; 32])).unwrap();
    let b = TriadKernel::new(KernelConfig::with_seed([2; 32])).unwrap();
    let ra = a.run(b"hello").unwrap();
    let rb = b.run(b"hello").unwrap();
    assert_eq!(ra.voted_output, rb.voted_output);
    assert_eq!(ra.distance, rb.distance);
    assert_ne!(ra.signature, rb.signature);
}

#[test]
fn test_seeded_lane_computation_is_reproducible() {
    // Lanes mix the shared lane seed into their output; all three agree
    // because they receive the same context.
    let computation = |_: LaneId, intent: &[u8], ctx: &DeterminismContext| -> Result<Vec<u8>, LaneFault> {
        let seed = ctx.lane_seed();
        let mut rng = Pcg32::new(u64::from_le_bytes(seed[..8].try_into().unwrap_or_default()));
        Ok(intent.iter().map(|b| b ^ (rng.next_u32() as u8)).collect())
    };

    let kernel =
        TriadKernel::with_computation(KernelConfig::default(), Arc::new(FnComputation(computation)))
            .unwrap();
    let first = kernel.run(b"hello").unwrap_err();
    let second = kernel.run(b"hello").unwrap_err();

    // The masked output passes the vote but drifts from the intent.
    let (a, b) = (first.record().unwrap(), second.record().unwrap());
    assert_eq!(a.diagnostics, b.diagnostics);
    assert_eq!(a.voted_output, b.voted_output);
    assert_eq!(a.lanes.iter().filter(|l| l.ok).count(), 3);
}
