//! Evaluation listing pages
//!
//! Wire types for Hydra's `/jobset/<project>/<jobset>/evals` JSON and the
//! source-independent `Page` the scraper consumes.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CommitHash, EvaluationRecord};

/// One page of upstream evaluations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<EvaluationRecord>,
    /// Cursor for the following page; `None` on the last page
    pub next: Option<String>,
    /// Number of the last page, when the source reports it
    pub last_page: Option<u32>,
}

/// Hydra evaluation list page
#[derive(Debug, Deserialize)]
pub struct EvalPage {
    pub evals: Vec<Eval>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub last: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Eval {
    pub id: u64,
    #[serde(default)]
    pub jobsetevalinputs: HashMap<String, EvalInput>,
}

#[derive(Debug, Deserialize)]
pub struct EvalInput {
    #[serde(default)]
    pub revision: Option<String>,
}

impl EvalPage {
    /// Extract the revision of `input` from every evaluation
    pub fn into_page(self, input: &str) -> Result<Page> {
        let mut records = Vec::with_capacity(self.evals.len());
        for eval in self.evals {
            let Some(revision) = eval
                .jobsetevalinputs
                .get(input)
                .and_then(|i| i.revision.as_deref())
            else {
                debug!("Evaluation {} has no {:?} revision, skipping", eval.id, input);
                continue;
            };
            let commit = CommitHash::parse(revision).map_err(|e| {
                Error::Transport(format!("evaluation {}: {}", eval.id, e))
            })?;
            records.push(EvaluationRecord::new(commit, Some(eval.id)));
        }

        Ok(Page {
            records,
            last_page: self.last.as_deref().and_then(parse_page_number),
            next: self.next,
        })
    }
}

/// Page number from a `?page=N` suffix
pub fn parse_page_number(suffix: &str) -> Option<u32> {
    suffix
        .split_once('=')
        .and_then(|(_, number)| number.parse().ok())
}
