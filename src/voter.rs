// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! 2-of-3 Voter.

use rustc_hash::FxHashMap;

use crate::config::QUORUM;
use crate::digest::{digest, Digest};
use crate::lane::LaneResult;

/// Result of reconciling the lane reports of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VotedOutput {
    Quorum {
        output: Vec<u8>,
        digest: Digest,
        agreeing: usize,
        faulted: usize,
    },
    NoQuorum {
        /// Size of the largest group of byte-identical `Ok` outputs.
        agreeing: usize,
        faulted: usize,
    },
}

impl VotedOutput {
    pub fn is_quorum(&self) -> bool {
        matches!(self, VotedOutput::Quorum { .. })
    }

    pub fn agreeing(&self) -> usize {
        match self {
            VotedOutput::Quorum { agreeing, .. } | VotedOutput::NoQuorum { agreeing, .. } => {
                *agreeing
            }
        }
    }

    pub fn faulted(&self) -> usize {
        match self {
            VotedOutput::Quorum { faulted, .. } | VotedOutput::NoQuorum { faulted, .. } => {
                *faulted
            }
        }
    }
}

/// Reconciles lane results. Faulted lanes are excluded; a quorum needs at
/// least [`QUORUM`] `Ok` lanes with byte-identical output.
pub fn vote(results: &[LaneResult]) -> VotedOutput {
    let faulted = results.iter().filter(|r| !r.is_ok()).count();

    // Group by output bytes, remembering the first lane of each group so
    // the winner is chosen in lane order.
    let mut tally: FxHashMap<&[u8], (usize, usize)> = FxHashMap::default();
    for (position, result) in results.iter().enumerate() {
        if let (true, Some(output)) = (result.is_ok(), result.output.as_deref()) {
            tally.entry(output).or_insert((0, position)).0 += 1;
        }
    }

    let best = tally
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        });

    match best {
        Some((output, (agreeing, _))) if agreeing >= QUORUM => {
            let output = output.to_vec();
            VotedOutput::Quorum {
                digest: digest(&output),
                output,
                agreeing,
                faulted,
            }
        }
        Some((_, (agreeing, _))) => VotedOutput::NoQuorum { agreeing, faulted },
        None => VotedOutput::NoQuorum {
            agreeing: 0,
            faulted,
        },
    }
}
