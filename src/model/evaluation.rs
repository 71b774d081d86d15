use std::collections::BTreeMap;

use super::CommitHash;

/// One upstream evaluation of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRecord {
    pub commit: CommitHash,
    /// Upstream evaluation ordinal (informational only)
    pub eval_id: Option<u64>,
}

impl EvaluationRecord {
    pub fn new(commit: CommitHash, eval_id: Option<u64>) -> Self {
        Self { commit, eval_id }
    }
}

/// The set of commits known to have been evaluated upstream
///
/// Each commit maps to the highest evaluation id seen for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationSnapshot {
    records: BTreeMap<CommitHash, Option<u64>>,
}

impl EvaluationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: EvaluationRecord) {
        let slot = self.records.entry(record.commit).or_insert(None);
        *slot = (*slot).max(record.eval_id);
    }

    pub fn contains(&self, commit: &CommitHash) -> bool {
        self.records.contains_key(commit)
    }

    pub fn eval_id(&self, commit: &CommitHash) -> Option<u64> {
        self.records.get(commit).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in commit hash order
    pub fn iter(&self) -> impl Iterator<Item = EvaluationRecord> + '_ {
        self.records
            .iter()
            .map(|(commit, eval_id)| EvaluationRecord::new(commit.clone(), *eval_id))
    }

    pub fn commits(&self) -> impl Iterator<Item = &CommitHash> {
        self.records.keys()
    }

    /// The most recently evaluated commit, by evaluation id
    pub fn latest(&self) -> Option<EvaluationRecord> {
        self.records
            .iter()
            .filter_map(|(commit, eval_id)| eval_id.map(|id| (id, commit)))
            .max_by_key(|(id, _)| *id)
            .map(|(id, commit)| EvaluationRecord::new(commit.clone(), Some(id)))
    }
}

impl FromIterator<EvaluationRecord> for EvaluationSnapshot {
    fn from_iter<I: IntoIterator<Item = EvaluationRecord>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

impl FromIterator<CommitHash> for EvaluationSnapshot {
    fn from_iter<I: IntoIterator<Item = CommitHash>>(iter: I) -> Self {
        iter.into_iter()
            .map(|commit| EvaluationRecord::new(commit, None))
            .collect()
    }
}
