//! Commit graph restricted to a set of commits
//!
//! Edges to commits outside the set are dropped, so walks never leave it.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::CommitHash;

#[derive(Debug, Default, Clone)]
struct Node {
    parents: Vec<CommitHash>,
    children: Vec<CommitHash>,
}

/// Parent/child adjacency for a bounded region of history
#[derive(Debug, Default, Clone)]
pub struct CommitGraph {
    nodes: FxHashMap<CommitHash, Node>,
}

impl CommitGraph {
    /// Build from `(commit, parents)` pairs
    pub fn from_commits<I>(commits: I) -> Self
    where
        I: IntoIterator<Item = (CommitHash, Vec<CommitHash>)>,
    {
        let dag: Vec<_> = commits.into_iter().collect();
        let members: FxHashSet<&CommitHash> = dag.iter().map(|(oid, _)| oid).collect();

        let mut nodes: FxHashMap<CommitHash, Node> = FxHashMap::default();
        for (oid, parents) in &dag {
            let parents: Vec<_> = parents
                .iter()
                .filter(|p| members.contains(p))
                .cloned()
                .collect();
            for parent in &parents {
                nodes
                    .entry(parent.clone())
                    .or_default()
                    .children
                    .push(oid.clone());
            }
            nodes.entry(oid.clone()).or_default().parents = parents;
        }

        Self { nodes }
    }

    pub fn contains(&self, commit: &CommitHash) -> bool {
        self.nodes.contains_key(commit)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parents(&self, commit: &CommitHash) -> &[CommitHash] {
        self.nodes.get(commit).map_or(&[], |n| n.parents.as_slice())
    }

    pub fn children(&self, commit: &CommitHash) -> &[CommitHash] {
        self.nodes.get(commit).map_or(&[], |n| n.children.as_slice())
    }

    pub fn commits(&self) -> impl Iterator<Item = &CommitHash> {
        self.nodes.keys()
    }

    /// Edge count of the shortest path to every reachable commit, moving
    /// freely between parents and children
    pub fn distances_from(&self, start: &CommitHash) -> FxHashMap<CommitHash, usize> {
        self.walk(start, |n| n.parents.iter().chain(n.children.iter()))
    }

    /// Distances to ancestors of `start`, following parent edges only
    pub fn ancestor_distances(&self, start: &CommitHash) -> FxHashMap<CommitHash, usize> {
        self.walk(start, |n| n.parents.iter())
    }

    /// Distances to descendants of `start`, following child edges only
    pub fn descendant_distances(&self, start: &CommitHash) -> FxHashMap<CommitHash, usize> {
        self.walk(start, |n| n.children.iter())
    }

    fn walk<'a, F, It>(&'a self, start: &CommitHash, neighbours: F) -> FxHashMap<CommitHash, usize>
    where
        F: Fn(&'a Node) -> It,
        It: Iterator<Item = &'a CommitHash>,
    {
        let mut dist = FxHashMap::default();
        if !self.contains(start) {
            return dist;
        }
        dist.insert(start.clone(), 0);

        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let d = dist[current];
            for next in neighbours(&self.nodes[current]) {
                if !dist.contains_key(next) {
                    dist.insert(next.clone(), d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }
}
