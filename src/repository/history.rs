//! On-disk evaluation history
//!
//! One line per evaluated commit, `<hex> <eval id>`, sorted by hash so that
//! publishing the same snapshot twice produces identical bytes.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{CommitHash, EvaluationRecord, EvaluationSnapshot};

use super::atomic;
use super::store::EvaluationStore;

/// Evaluation history persisted as a line-delimited file
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl EvaluationStore for HistoryFile {
    fn load(&self) -> Result<EvaluationSnapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history at {}, starting empty", self.path.display());
                return Ok(EvaluationSnapshot::new());
            }
            Err(e) => return Err(e.into()),
        };
        let snapshot = decode(&bytes).map_err(|(line, reason)| Error::CorruptHistory {
            path: self.path.clone(),
            line,
            reason,
        })?;
        debug!(
            "Loaded {} evaluated commits from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(snapshot)
    }

    fn replace(&self, snapshot: &EvaluationSnapshot) -> Result<()> {
        atomic::publish(&self.path, &encode(snapshot)).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("publishing {}: {}", self.path.display(), e),
            ))
        })?;
        debug!(
            "Published {} evaluated commits to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn modified(&self) -> Result<Option<SystemTime>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serialize a snapshot in hash order
pub fn encode(snapshot: &EvaluationSnapshot) -> Vec<u8> {
    let mut out = Vec::with_capacity(snapshot.len() * 50);
    for record in snapshot.iter() {
        out.extend_from_slice(record.commit.to_hex().as_bytes());
        if let Some(id) = record.eval_id {
            out.push(b' ');
            out.extend_from_slice(id.to_string().as_bytes());
        }
        out.push(b'\n');
    }
    out
}

/// Parse a history file; errors carry the 1-based line number
pub fn decode(bytes: &[u8]) -> std::result::Result<EvaluationSnapshot, (usize, String)> {
    if bytes.is_empty() {
        return Ok(EvaluationSnapshot::new());
    }
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let line = bytes[..e.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
        (line, "not valid UTF-8".to_string())
    })?;
    let Some(body) = text.strip_suffix('\n') else {
        let line = text.lines().count();
        return Err((line, "missing trailing newline (truncated write?)".to_string()));
    };

    body.split('\n')
        .enumerate()
        .map(|(i, line)| parse_line(line).map_err(|reason| (i + 1, reason)))
        .collect()
}

fn parse_line(line: &str) -> std::result::Result<EvaluationRecord, String> {
    let mut fields = line.split_ascii_whitespace();
    let hash = fields.next().ok_or_else(|| "empty line".to_string())?;
    let commit = CommitHash::parse(hash).map_err(|e| e.to_string())?;
    let eval_id = fields
        .next()
        .map(|id| {
            id.parse::<u64>()
                .map_err(|_| format!("invalid evaluation id {:?}", id))
        })
        .transpose()?;
    if let Some(extra) = fields.next() {
        return Err(format!("unexpected field {:?}", extra));
    }
    Ok(EvaluationRecord::new(commit, eval_id))
}
