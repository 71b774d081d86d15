//! Search pipeline: bisection range, stored history, ranking
//!
//! The phases mirror what a user would do by hand:
//! 1. Resolve the interval from `refs/bisect/*`
//! 2. Load the evaluated commits
//! 3. Warn if the history looks too old for this bisection
//! 4. Rank the evaluated commits inside the interval

use std::time::{Duration, SystemTime};

use git2::Repository;
use tracing::{debug, info, warn};

use crate::config::STALE_AFTER;
use crate::error::{Error, Result};
use crate::model::{CommitHash, EvaluationSnapshot};
use crate::ranker::{rank_candidates, Candidate};
use crate::repository::{BisectRangeResolver, EvaluationStore};

pub struct Searcher<'r> {
    resolver: BisectRangeResolver<'r>,
    stale_after: Duration,
    limit: Option<usize>,
}

impl<'r> Searcher<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self {
            resolver: BisectRangeResolver::new(repo),
            stale_after: STALE_AFTER,
            limit: None,
        }
    }

    pub fn stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Keep at most `limit` candidates
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Evaluated commits in the bisection range, closest to HEAD first
    ///
    /// An empty result is reported as [`Error::NoCandidateFound`].
    pub fn search(&self, store: &impl EvaluationStore) -> Result<Vec<Candidate>> {
        let interval = self.resolver.resolve()?;

        let snapshot = store.load()?;
        if snapshot.is_empty() {
            warn!("No evaluation history; run `evalsect scrape` first");
        } else if self.is_stale(store, &snapshot, &interval.bad) {
            warn!("Evaluation history may be out of date; run `evalsect scrape` to refresh it");
        }

        let mut candidates =
            rank_candidates(&interval.commits, &interval.reference, &snapshot, &interval.graph);
        info!(
            "{} of {} untested commits have been evaluated",
            candidates.len(),
            interval.len()
        );
        if let Some(limit) = self.limit {
            candidates.truncate(limit);
        }

        if candidates.is_empty() {
            return Err(Error::NoCandidateFound);
        }
        Ok(candidates)
    }

    /// Whether the history is old and predates the bad commit
    ///
    /// Fresh history is never stale. Old history is stale unless the bad
    /// commit is an ancestor of the newest evaluated commit.
    pub fn is_stale(
        &self,
        store: &impl EvaluationStore,
        snapshot: &EvaluationSnapshot,
        bad: &CommitHash,
    ) -> bool {
        let age = match store.modified() {
            Ok(Some(modified)) => SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
            Ok(None) => return false,
            Err(e) => {
                debug!("Cannot read history age: {}", e);
                return false;
            }
        };
        if age <= self.stale_after {
            return false;
        }
        let Some(latest) = snapshot.latest() else {
            return false;
        };
        match self.resolver.is_ancestor(bad, &latest.commit) {
            Ok(covered) => !covered,
            Err(e) => {
                debug!("Cannot compare {} with newest evaluation: {}", bad.short(), e);
                false
            }
        }
    }
}
