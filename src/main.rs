use std::io::{self, Write};
use std::process::ExitCode;
use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Parser;
use git2::Repository;
use tracing::info;

use evalsect::cli::{Cli, Command, SearchArgs};
use evalsect::config::Settings;
use evalsect::error::Error;
use evalsect::logging::{init_tracing, level_for};
use evalsect::model::EvaluationRecord;
use evalsect::repository::{EvaluationStore, HistoryFile};
use evalsect::scrape::{HydraClient, Scraper};
use evalsect::search::Searcher;
use evalsect::util::{format_age, format_timestamp};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(level_for(cli.verbose, cli.quiet));

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<Error>() {
            Some(e) if e.is_soft() => {
                info!("{}", e);
                ExitCode::from(e.exit_code())
            }
            Some(e) => {
                eprintln!("evalsect: {:#}", err);
                ExitCode::from(e.exit_code())
            }
            None => {
                eprintln!("evalsect: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::resolve(cli.overrides())?;
    let history = HistoryFile::new(&settings.history_path);

    match &cli.command {
        Command::Scrape(_) => scrape(&settings, &history, cli.quiet).await,
        Command::Search(args) => search(&settings, &history, args),
        Command::Status => status(&history),
    }
}

async fn scrape(settings: &Settings, history: &HistoryFile, quiet: bool) -> Result<()> {
    let client = HydraClient::new(settings.hydra.clone())?;
    info!(
        "Scraping {}/jobset/{}/{}",
        settings.hydra.base_url, settings.hydra.project, settings.hydra.jobset
    );

    let scraper = if quiet {
        Scraper::quiet(client)
    } else {
        Scraper::new(client)
    };
    let report = scraper.scrape(history).await?;

    eprintln!(
        "Recorded {} evaluated commits from {} evaluations ({} pages) in {}",
        report.commits,
        report.evaluations,
        report.pages,
        history.path().display()
    );
    Ok(())
}

fn search(settings: &Settings, history: &HistoryFile, args: &SearchArgs) -> Result<()> {
    let repo = Repository::discover(&settings.repo_path).with_context(|| {
        format!(
            "Could not open git repository at {}",
            settings.repo_path.display()
        )
    })?;

    let candidates = Searcher::new(&repo)
        .stale_after(settings.stale_after)
        .limit(args.limit)
        .search(history)?;

    let mut out = io::stdout().lock();
    for candidate in &candidates {
        if args.distances {
            writeln!(
                out,
                "{} {} {}",
                candidate.commit, candidate.distance, candidate.relation
            )?;
        } else {
            writeln!(out, "{}", candidate.commit)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn status(history: &HistoryFile) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "history: {}", history.path().display())?;

    let Some(modified) = history.modified()? else {
        writeln!(out, "status: missing (run `evalsect scrape`)")?;
        return Ok(());
    };
    let snapshot = history.load()?;
    writeln!(out, "evaluated commits: {}", snapshot.len())?;
    if let Some(EvaluationRecord {
        commit,
        eval_id: Some(id),
    }) = snapshot.latest()
    {
        writeln!(out, "newest evaluation: {} ({})", id, commit)?;
    }
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default();
    writeln!(
        out,
        "last scraped: {} ({} ago)",
        format_timestamp(modified),
        format_age(age)
    )?;
    Ok(())
}
