// Shared benchmark helpers
// Functions here are used across different benchmark files
#![allow(dead_code)]

use evalsect::model::{CommitHash, EvaluationRecord, EvaluationSnapshot};
use evalsect::repository::CommitGraph;

pub fn commit(n: u32) -> CommitHash {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&n.wrapping_mul(2654435761).to_be_bytes());
    bytes[16..].copy_from_slice(&n.to_be_bytes());
    CommitHash::from_bytes(&bytes).unwrap()
}

/// Mainline history where every `merge_every`-th commit also merges an
/// older mainline commit
pub fn generate_graph(num_commits: u32, merge_every: u32) -> CommitGraph {
    CommitGraph::from_commits((0..num_commits).map(|i| {
        let parents = match i {
            0 => vec![],
            i if i >= merge_every && i % merge_every == 0 => {
                vec![commit(i - 1), commit(i - merge_every / 2)]
            }
            i => vec![commit(i - 1)],
        };
        (commit(i), parents)
    }))
}

/// Every `stride`-th commit evaluated
pub fn generate_snapshot(num_commits: u32, stride: u32) -> EvaluationSnapshot {
    (0..num_commits)
        .step_by(stride as usize)
        .map(|i| EvaluationRecord::new(commit(i), Some(i as u64)))
        .collect()
}
