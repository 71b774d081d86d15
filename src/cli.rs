use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(
    name = "evalsect",
    version,
    about = "Steer git bisect towards commits Hydra has already evaluated"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Evaluation history file
    #[arg(long, global = true, env = "EVALSECT_HISTORY")]
    pub history_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild the evaluation history from Hydra
    Scrape(ScrapeArgs),
    /// Print evaluated commits in the bisection range, closest to HEAD first
    Search(SearchArgs),
    /// Show what the evaluation history contains
    Status,
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Hydra instance
    #[arg(long, env = "EVALSECT_HYDRA_URL")]
    pub hydra_url: Option<String>,

    #[arg(long, env = "EVALSECT_PROJECT")]
    pub project: Option<String>,

    #[arg(long, env = "EVALSECT_JOBSET")]
    pub jobset: Option<String>,

    /// Jobset input holding the evaluated revision
    #[arg(long, env = "EVALSECT_INPUT")]
    pub input: Option<String>,

    /// Per-request timeout
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Git repository being bisected
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Print at most N commits
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Also print each commit's distance and relation to HEAD
    #[arg(long)]
    pub distances: bool,
}

impl Cli {
    /// Collect everything that overrides a default setting
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            history_file: self.history_file.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Scrape(args) => {
                overrides.hydra_url = args.hydra_url.clone();
                overrides.project = args.project.clone();
                overrides.jobset = args.jobset.clone();
                overrides.input = args.input.clone();
                overrides.timeout_secs = args.timeout_secs;
            }
            Command::Search(args) => overrides.repo = Some(args.repo.clone()),
            Command::Status => {}
        }
        overrides
    }
}
