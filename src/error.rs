//! Error types for evalsect

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for "no cached shortcut available"
pub const NO_CANDIDATE_EXIT: u8 = 3;

/// Errors surfaced by the store, scraper, resolver and ranker
#[derive(Error, Debug)]
pub enum Error {
    /// No bisection session in progress
    #[error("not bisecting: {0} (start one with `git bisect start`)")]
    NotBisecting(String),

    /// Fetching the evaluation listing failed; the stored history is untouched
    #[error("fetching evaluations failed: {0}")]
    Transport(String),

    /// The persisted history could not be parsed
    #[error("corrupt history file {}:{}: {} (run `evalsect scrape` to rebuild it)", .path.display(), .line, .reason)]
    CorruptHistory {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Ranking produced no candidate; callers fall back to git's own pick
    #[error("no evaluated commit left in the bisection range")]
    NoCandidateFound,

    #[error("invalid commit hash {input:?}: {reason}")]
    InvalidHash { input: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Soft errors are legitimate outcomes, not failures
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::NoCandidateFound)
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_soft() { NO_CANDIDATE_EXIT } else { 1 }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
