//! Bisection range resolution
//!
//! Reads git's bisection refs and computes the commits still worth testing.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;

use git2::{ErrorCode, Oid, Repository, Sort};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::CommitHash;

use super::graph::CommitGraph;

/// Names git uses for the two bisection boundaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BisectTerms {
    pub bad: String,
    pub good: String,
}

impl Default for BisectTerms {
    fn default() -> Self {
        Self {
            bad: "bad".to_string(),
            good: "good".to_string(),
        }
    }
}

/// The remaining search interval of an in-progress bisection
#[derive(Debug, Clone)]
pub struct BisectInterval {
    /// Untested commits between the good and bad boundaries
    pub commits: BTreeSet<CommitHash>,
    /// Commit distances are measured from (HEAD)
    pub reference: CommitHash,
    /// Graph over the `bad ^good` walk, its boundary parents and the reference
    pub graph: CommitGraph,
    pub bad: CommitHash,
}

impl BisectInterval {
    pub fn contains(&self, commit: &CommitHash) -> bool {
        self.commits.contains(commit)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

struct Boundaries {
    bad: Oid,
    good: Vec<Oid>,
    skipped: FxHashSet<Oid>,
}

/// Resolves the current bisection state of a repository
pub struct BisectRangeResolver<'r> {
    repo: &'r Repository,
}

impl<'r> BisectRangeResolver<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    /// Terms from `BISECT_TERMS`, falling back to good/bad
    pub fn terms(&self) -> Result<BisectTerms> {
        let path = self.repo.path().join("BISECT_TERMS");
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BisectTerms::default()),
            Err(e) => return Err(e.into()),
        };
        let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());
        match (lines.next(), lines.next()) {
            (Some(bad), Some(good)) => Ok(BisectTerms {
                bad: bad.to_string(),
                good: good.to_string(),
            }),
            _ => {
                warn!("Ignoring malformed {}", path.display());
                Ok(BisectTerms::default())
            }
        }
    }

    /// Compute the interval and the reference commit
    ///
    /// The interval holds the ancestors of the bad commit that descend from
    /// a good commit, without the bad commit itself and without skipped
    /// commits.
    pub fn resolve(&self) -> Result<BisectInterval> {
        let bounds = self.boundaries()?;
        let reference = self.repo.head()?.peel_to_commit()?.id();

        let goods: FxHashSet<Oid> = bounds.good.iter().copied().collect();
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        walk.push(bounds.bad)?;
        for good in &bounds.good {
            walk.hide(*good)?;
        }

        // Parents come before children, so one pass decides descent from good
        let mut descends_from_good: FxHashSet<Oid> = FxHashSet::default();
        let mut walked: Vec<(Oid, Vec<Oid>)> = Vec::new();
        for oid in walk {
            let oid = oid?;
            let parents: Vec<Oid> = self.repo.find_commit(oid)?.parent_ids().collect();
            if parents
                .iter()
                .any(|p| goods.contains(p) || descends_from_good.contains(p))
            {
                descends_from_good.insert(oid);
            }
            walked.push((oid, parents));
        }

        let commits: BTreeSet<CommitHash> = walked
            .iter()
            .map(|(oid, _)| *oid)
            .filter(|oid| descends_from_good.contains(oid))
            .filter(|oid| *oid != bounds.bad && !bounds.skipped.contains(oid))
            .map(CommitHash::from)
            .collect();

        if !descends_from_good.contains(&reference) {
            warn!(
                "HEAD ({}) is outside the bisection range",
                CommitHash::from(reference).short()
            );
        }

        // Graph covers the whole `bad ^good` walk, including side branches
        // that never meet a good commit, plus the boundary parents and HEAD
        let mut members: FxHashSet<Oid> = walked.iter().map(|(oid, _)| *oid).collect();
        if members.insert(reference) {
            let parents = self.repo.find_commit(reference)?.parent_ids().collect();
            walked.push((reference, parents));
        }
        let boundary: Vec<Oid> = walked
            .iter()
            .flat_map(|(_, parents)| parents.iter().copied())
            .filter(|p| members.insert(*p))
            .collect();
        walked.extend(boundary.into_iter().map(|oid| (oid, Vec::new())));

        let graph = CommitGraph::from_commits(walked.into_iter().map(|(oid, parents)| {
            (
                CommitHash::from(oid),
                parents.into_iter().map(CommitHash::from).collect(),
            )
        }));

        debug!(
            "Bisection range: {} untested commits, {} in graph",
            commits.len(),
            graph.len()
        );

        Ok(BisectInterval {
            commits,
            reference: reference.into(),
            graph,
            bad: bounds.bad.into(),
        })
    }

    /// Whether `ancestor` is `commit` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: &CommitHash, commit: &CommitHash) -> Result<bool> {
        if ancestor == commit {
            return Ok(true);
        }
        let (ancestor, commit) = (ancestor.to_oid()?, commit.to_oid()?);
        match self.repo.graph_descendant_of(commit, ancestor) {
            Ok(is) => Ok(is),
            // Commits unknown to this clone cannot be related
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn boundaries(&self) -> Result<Boundaries> {
        let terms = self.terms()?;

        let bad = self
            .bisect_ref(&format!("refs/bisect/{}", terms.bad))?
            .ok_or_else(|| Error::NotBisecting(format!("no {} commit marked", terms.bad)))?;
        let good = self.bisect_refs(&format!("refs/bisect/{}-*", terms.good))?;
        if good.is_empty() {
            return Err(Error::NotBisecting(format!(
                "no {} commit marked",
                terms.good
            )));
        }
        let skipped = self.bisect_refs("refs/bisect/skip-*")?.into_iter().collect();

        Ok(Boundaries { bad, good, skipped })
    }

    fn bisect_ref(&self, name: &str) -> Result<Option<Oid>> {
        match self.repo.refname_to_id(name) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn bisect_refs(&self, glob: &str) -> Result<Vec<Oid>> {
        let mut oids = Vec::new();
        for reference in self.repo.references_glob(glob)? {
            if let Some(oid) = reference?.target() {
                oids.push(oid);
            }
        }
        Ok(oids)
    }
}
