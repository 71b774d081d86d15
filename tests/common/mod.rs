// Shared test fixtures for integration tests
// Functions here are used across different test files
#![allow(dead_code)]

use std::cell::Cell;
use std::path::PathBuf;

use evalsect::error::{Error, Result};
use evalsect::model::{CommitHash, EvaluationRecord, EvaluationSnapshot};
use evalsect::scrape::{EvalListing, Page};
use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

/// Create a temporary git repository
pub fn create_test_repo() -> (TempDir, PathBuf, Repository) {
    let dir = TempDir::new().unwrap();
    let repo_path = dir.path().to_path_buf();
    let repo = Repository::init(&repo_path).unwrap();

    // Configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (dir, repo_path, repo)
}

/// Create an empty-tree commit with the given parents, without moving any ref
pub fn add_commit(repo: &Repository, parents: &[Oid], message: &str) -> Oid {
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<git2::Commit> = parents
        .iter()
        .map(|oid| repo.find_commit(*oid).unwrap())
        .collect();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

/// Linear history c0 <- c1 <- ... <- c{len-1}, returned in order
pub fn add_chain(repo: &Repository, len: usize) -> Vec<Oid> {
    let mut commits: Vec<Oid> = Vec::with_capacity(len);
    for i in 0..len {
        let parents: Vec<Oid> = commits.last().copied().into_iter().collect();
        commits.push(add_commit(repo, &parents, &format!("c{}", i)));
    }
    commits
}

pub fn checkout(repo: &Repository, oid: Oid) {
    repo.set_head_detached(oid).unwrap();
}

pub fn mark(repo: &Repository, refname: &str, oid: Oid) {
    repo.reference(refname, oid, true, "bisect").unwrap();
}

/// Start a bisection: `bad`, one or more good commits, HEAD at `head`
pub fn start_bisect(repo: &Repository, bad: Oid, good: &[Oid], head: Oid) {
    mark(repo, "refs/bisect/bad", bad);
    for oid in good {
        mark(repo, &format!("refs/bisect/good-{}", oid), *oid);
    }
    checkout(repo, head);
}

pub fn hash(oid: Oid) -> CommitHash {
    CommitHash::from(oid)
}

/// Snapshot of `commits`, with evaluation ids counting up from 1
pub fn snapshot_of(commits: &[Oid]) -> EvaluationSnapshot {
    commits
        .iter()
        .enumerate()
        .map(|(i, oid)| EvaluationRecord::new(hash(*oid), Some(i as u64 + 1)))
        .collect()
}

/// Deterministic fake commit hash
pub fn fake_hash(n: u32) -> CommitHash {
    let mut bytes = [0u8; 20];
    bytes[..4].copy_from_slice(&n.to_be_bytes());
    bytes[19] = 0xaa;
    CommitHash::from_bytes(&bytes).unwrap()
}

/// Page `index` (1-based) of `total`, each holding `per_page` evaluations
pub fn fake_page(index: u32, total: u32, per_page: u32) -> Page {
    let records = (0..per_page)
        .map(|i| {
            let id = (total - index) * per_page + (per_page - i);
            EvaluationRecord::new(fake_hash(id), Some(id as u64))
        })
        .collect();
    Page {
        records,
        next: (index < total).then(|| format!("?page={}", index + 1)),
        last_page: Some(total),
    }
}

/// Listing serving prebuilt pages, optionally failing on one of them
pub struct CannedListing {
    pages: Vec<Page>,
    fail_on: Option<u32>,
    requests: Cell<usize>,
}

impl CannedListing {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            fail_on: None,
            requests: Cell::new(0),
        }
    }

    /// Fail with a transport error when page `page` (1-based) is requested
    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on = Some(page);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl EvalListing for CannedListing {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        self.requests.set(self.requests.get() + 1);
        let number = match cursor {
            None => 1,
            Some(c) => evalsect::scrape::parse_page_number(c)
                .ok_or_else(|| Error::Transport(format!("bad cursor {:?}", c)))?,
        };
        if self.fail_on == Some(number) {
            return Err(Error::Transport(format!("page {} timed out", number)));
        }
        self.pages
            .get(number as usize - 1)
            .cloned()
            .ok_or_else(|| Error::Transport(format!("HTTP 404 for page {}", number)))
    }
}
