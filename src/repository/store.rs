//! Evaluation store trait for persistence abstraction
//!
//! Decouples the scraper and ranker from the on-disk history file.

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::error::Result;
use crate::model::EvaluationSnapshot;

/// Persistence layer for the evaluated-commit snapshot
///
/// Implementations must make `replace` atomic: a concurrent `load` sees
/// either the whole previous snapshot or the whole new one.
pub trait EvaluationStore {
    /// Read the current snapshot; an absent store reads as empty
    fn load(&self) -> Result<EvaluationSnapshot>;

    /// Publish a complete new snapshot in place of the current one
    fn replace(&self, snapshot: &EvaluationSnapshot) -> Result<()>;

    /// When the current snapshot was published, if known
    fn modified(&self) -> Result<Option<SystemTime>> {
        Ok(None)
    }
}

impl<S: EvaluationStore + ?Sized> EvaluationStore for &S {
    fn load(&self) -> Result<EvaluationSnapshot> {
        (**self).load()
    }

    fn replace(&self, snapshot: &EvaluationSnapshot) -> Result<()> {
        (**self).replace(snapshot)
    }

    fn modified(&self) -> Result<Option<SystemTime>> {
        (**self).modified()
    }
}

/// In-memory store, used by tests and benchmarks
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<EvaluationSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: EvaluationSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl EvaluationStore for MemoryStore {
    fn load(&self) -> Result<EvaluationSnapshot> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn replace(&self, snapshot: &EvaluationSnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        Ok(())
    }
}
