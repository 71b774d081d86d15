//! Evaluation history scraper
//!
//! Fetches every page of an upstream evaluation listing and publishes the
//! collected commits as a new snapshot.
//!
//! # Architecture
//!
//! - **page**: Wire types and the source-independent `Page`
//! - **hydra**: HTTP listing for a Hydra jobset
//! - **progress**: Progress reporting abstraction
//! - **Scraper**: Walks pages from the first one and publishes all-or-nothing

mod hydra;
mod page;
mod progress;

pub use hydra::HydraClient;
pub use page::{parse_page_number, Eval, EvalInput, EvalPage, Page};
pub use progress::{NoopProgress, ProgressHandle, ProgressReporter, VerboseProgress};

use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::EvaluationSnapshot;
use crate::repository::EvaluationStore;

/// A paginated listing of upstream evaluations
///
/// Pages are requested one at a time by cursor; `None` asks for the first
/// page and each page names the cursor of the next.
#[allow(async_fn_in_trait)]
pub trait EvalListing {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page>;
}

impl<L: EvalListing + ?Sized> EvalListing for &L {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        (**self).fetch(cursor).await
    }
}

/// Summary of a completed scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeReport {
    pub pages: usize,
    pub evaluations: usize,
    pub commits: usize,
}

/// Rebuilds the evaluation history from a listing
pub struct Scraper<L> {
    listing: L,
    verbose: bool,
}

impl<L: EvalListing> Scraper<L> {
    pub fn new(listing: L) -> Self {
        Self {
            listing,
            verbose: true,
        }
    }

    /// Create a quiet scraper (no progress bar)
    pub fn quiet(listing: L) -> Self {
        Self {
            listing,
            verbose: false,
        }
    }

    /// Fetch the full listing and atomically replace the store's snapshot
    ///
    /// A failure on any page leaves the store untouched.
    pub async fn scrape(&self, store: &impl EvaluationStore) -> Result<ScrapeReport> {
        let started = Instant::now();
        let (snapshot, mut report) = self.fetch_all().await?;
        report.commits = snapshot.len();

        info!("Replacing old history with {} evaluated commits", snapshot.len());
        store.replace(&snapshot)?;

        debug!("Scrape finished in {:?}", started.elapsed());
        Ok(report)
    }

    /// Walk every page from the first and collect the evaluated commits
    pub async fn fetch_all(&self) -> Result<(EvaluationSnapshot, ScrapeReport)> {
        let progress = VerboseProgress::new(self.verbose);
        let pb = progress.start("Scraping evaluations");

        let mut snapshot = EvaluationSnapshot::new();
        let mut report = ScrapeReport {
            pages: 0,
            evaluations: 0,
            commits: 0,
        };
        let mut cursor: Option<String> = None;
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut length_known = false;

        loop {
            let position = cursor.as_deref().and_then(parse_page_number).unwrap_or(1);
            pb.set_position(position.into());

            let page = match self.listing.fetch(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    pb.finish();
                    return Err(e);
                }
            };
            report.pages += 1;
            report.evaluations += page.records.len();

            if !length_known {
                if let Some(last) = page.last_page {
                    pb.set_length(last.into());
                    length_known = true;
                }
            }

            debug!("Page {}: {} evaluations", position, page.records.len());
            for record in page.records {
                snapshot.insert(record);
            }

            match page.next {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!("Listing links back to {}, stopping", next);
                    break;
                }
                None => break,
            }
        }

        pb.finish();
        Ok((snapshot, report))
    }
}
