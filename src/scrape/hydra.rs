//! Hydra HTTP evaluation listing

use reqwest::header::ACCEPT;
use tracing::debug;

use crate::config::HydraSettings;
use crate::error::{Error, Result};

use super::page::{EvalPage, Page};
use super::EvalListing;

/// Client for a Hydra jobset's evaluation list
pub struct HydraClient {
    settings: HydraSettings,
    http: reqwest::Client,
}

impl HydraClient {
    pub fn new(settings: HydraSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("evalsect/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Config(format!("building HTTP client: {}", e)))?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &HydraSettings {
        &self.settings
    }

    /// URL of the page at `cursor` (a `?page=N` suffix), or the first page
    pub fn page_url(&self, cursor: Option<&str>) -> String {
        format!(
            "{}/jobset/{}/{}/evals{}",
            self.settings.base_url,
            self.settings.project,
            self.settings.jobset,
            cursor.unwrap_or("")
        )
    }
}

impl EvalListing for HydraClient {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page> {
        let url = self.page_url(cursor);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        let page: EvalPage = serde_json::from_slice(&body)
            .map_err(|e| Error::Transport(format!("decoding {}: {}", url, e)))?;
        page.into_page(&self.settings.input)
    }
}
