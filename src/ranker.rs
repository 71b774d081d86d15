//! Candidate ranking
//!
//! Orders evaluated commits inside the bisection range by their distance to
//! the reference commit.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use crate::model::{CommitHash, EvaluationSnapshot};
use crate::repository::CommitGraph;

/// How a candidate is reached from the reference commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Reference,
    Ancestor,
    Descendant,
    /// Only reachable by crossing a merge (neither ancestor nor descendant
    /// at the shortest distance)
    Mixed,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Reference => "reference",
            Relation::Ancestor => "ancestor",
            Relation::Descendant => "descendant",
            Relation::Mixed => "mixed",
        })
    }
}

/// An evaluated commit in the interval, with its distance to the reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub commit: CommitHash,
    pub distance: usize,
    pub relation: Relation,
}

/// Rank evaluated commits in `interval` by closeness to `reference`
///
/// Returns commits ordered by distance, ties broken by hash.
pub fn rank(
    interval: &BTreeSet<CommitHash>,
    reference: &CommitHash,
    evaluated: &EvaluationSnapshot,
    graph: &CommitGraph,
) -> Vec<CommitHash> {
    rank_candidates(interval, reference, evaluated, graph)
        .into_iter()
        .map(|c| c.commit)
        .collect()
}

/// Like [`rank`], but keeps distances and relations
pub fn rank_candidates(
    interval: &BTreeSet<CommitHash>,
    reference: &CommitHash,
    evaluated: &EvaluationSnapshot,
    graph: &CommitGraph,
) -> Vec<Candidate> {
    let targets: Vec<&CommitHash> = interval.iter().filter(|c| evaluated.contains(c)).collect();
    if targets.is_empty() {
        return Vec::new();
    }

    let distances = graph.distances_from(reference);
    let ancestors = graph.ancestor_distances(reference);
    let descendants = graph.descendant_distances(reference);

    let mut candidates: Vec<Candidate> = targets
        .into_iter()
        .filter_map(|commit| {
            let Some(&distance) = distances.get(commit) else {
                debug!("{} is not connected to the reference", commit.short());
                return None;
            };
            // Equal-length ancestor and descendant paths classify as ancestor
            let relation = if distance == 0 {
                Relation::Reference
            } else if ancestors.get(commit) == Some(&distance) {
                Relation::Ancestor
            } else if descendants.get(commit) == Some(&distance) {
                Relation::Descendant
            } else {
                Relation::Mixed
            };
            Some(Candidate {
                commit: commit.clone(),
                distance,
                relation,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.commit.cmp(&b.commit)));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u8) -> CommitHash {
        CommitHash::from_bytes(&[n; 20]).unwrap()
    }

    fn chain(len: u8) -> CommitGraph {
        CommitGraph::from_commits((0..len).map(|i| {
            let parents = if i == 0 { vec![] } else { vec![h(i - 1)] };
            (h(i), parents)
        }))
    }

    #[test]
    fn test_relations() {
        let graph = chain(6);
        let interval: BTreeSet<_> = (0..6).map(h).collect();
        let evaluated: EvaluationSnapshot = [h(1), h(3), h(5)].into_iter().collect();

        let ranked = rank_candidates(&interval, &h(3), &evaluated, &graph);
        assert_eq!(ranked[0].relation, Relation::Reference);
        assert_eq!(ranked[1].commit, h(1));
        assert_eq!(ranked[1].relation, Relation::Ancestor);
        assert_eq!(ranked[2].commit, h(5));
        assert_eq!(ranked[2].relation, Relation::Descendant);
    }

    #[test]
    fn test_mixed_relation_across_merge() {
        // 0 <- 1 <- 3, 0 <- 2 <- 3: 1 and 2 are siblings
        let graph = CommitGraph::from_commits([
            (h(0), vec![]),
            (h(1), vec![h(0)]),
            (h(2), vec![h(0)]),
            (h(3), vec![h(1), h(2)]),
        ]);
        let interval: BTreeSet<_> = [h(1), h(2), h(3)].into_iter().collect();
        let evaluated: EvaluationSnapshot = [h(2)].into_iter().collect();

        let ranked = rank_candidates(&interval, &h(1), &evaluated, &graph);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distance, 2);
        assert_eq!(ranked[0].relation, Relation::Mixed);
    }

    #[test]
    fn test_disconnected_dropped() {
        let graph = CommitGraph::from_commits([(h(0), vec![]), (h(1), vec![])]);
        let interval: BTreeSet<_> = [h(0), h(1)].into_iter().collect();
        let evaluated: EvaluationSnapshot = [h(1)].into_iter().collect();
        assert!(rank(&interval, &h(0), &evaluated, &graph).is_empty());
    }

    #[test]
    fn test_relation_display() {
        assert_eq!(Relation::Ancestor.to_string(), "ancestor");
        assert_eq!(Relation::Mixed.to_string(), "mixed");
    }
}
