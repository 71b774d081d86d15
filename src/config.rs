//! Runtime settings
//!
//! Defaults, overridden by environment variables and command-line flags
//! (both collected by the CLI into [`Overrides`]).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_HYDRA_URL: &str = "https://hydra.nixos.org";
pub const DEFAULT_PROJECT: &str = "nixos";
pub const DEFAULT_JOBSET: &str = "unstable-small";
pub const DEFAULT_INPUT: &str = "nixpkgs";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// History older than this is checked for freshness before a search
pub const STALE_AFTER: Duration = Duration::from_secs(15 * 60);

const HISTORY_DIR: &str = "evalsect";
const HISTORY_FILE: &str = "hydra-eval-history";

/// Where to scrape evaluations from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydraSettings {
    pub base_url: String,
    pub project: String,
    pub jobset: String,
    /// Jobset input whose revision identifies the evaluated commit
    pub input: String,
    pub timeout: Duration,
}

impl Default for HydraSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HYDRA_URL.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            jobset: DEFAULT_JOBSET.to_string(),
            input: DEFAULT_INPUT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Values supplied by the user; `None` keeps the default
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub history_file: Option<PathBuf>,
    pub hydra_url: Option<String>,
    pub project: Option<String>,
    pub jobset: Option<String>,
    pub input: Option<String>,
    pub timeout_secs: Option<u64>,
    pub repo: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub history_path: PathBuf,
    pub hydra: HydraSettings,
    pub stale_after: Duration,
    pub repo_path: PathBuf,
}

impl Settings {
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let history_path = match overrides.history_file {
            Some(path) => path,
            None => default_history_path()?,
        };

        let defaults = HydraSettings::default();
        let hydra = HydraSettings {
            base_url: overrides
                .hydra_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            project: overrides.project.unwrap_or(defaults.project),
            jobset: overrides.jobset.unwrap_or(defaults.jobset),
            input: overrides.input.unwrap_or(defaults.input),
            timeout: overrides
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };
        if hydra.base_url.is_empty() {
            return Err(Error::Config("Hydra URL is empty".to_string()));
        }

        Ok(Self {
            history_path,
            hydra,
            stale_after: STALE_AFTER,
            repo_path: overrides.repo.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

/// `<cache dir>/evalsect/hydra-eval-history`
pub fn default_history_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| {
        Error::Config(
            "could not determine cache directory (set XDG_CACHE_HOME or HOME)".to_string(),
        )
    })?;
    Ok(cache_dir.join(HISTORY_DIR).join(HISTORY_FILE))
}
