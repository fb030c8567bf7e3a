use crate::config::{self, WatcherConfig};
use crate::error::FetchError;
use crate::models::ChainSnapshot;
use anyhow::{Context, Result};
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client};
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Source of option-chain snapshots.
///
/// Read timeouts must come back as `FetchError::Timeout` so the caller's
/// retry policy can single them out.
pub trait DataSource {
    fn fetch_snapshot(&self, symbol: &str) -> impl Future<Output = Result<ChainSnapshot, FetchError>>;
}

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct NSEClient {
    client: Client,
    warmed_up: RwLock<bool>,
}

impl NSEClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(connect_timeout, read_timeout)?,
            warmed_up: RwLock::new(false),
        })
    }

    pub fn from_config(cfg: &WatcherConfig) -> Result<Self> {
        Self::new(cfg.connect_timeout, cfg.read_timeout)
    }

    /// Warmup NSE session (only once per client). The home page hands out
    /// the cookies the API insists on.
    async fn warmup_if_needed(&self) -> Result<(), FetchError> {
        if *self.warmed_up.read().await {
            return Ok(());
        }

        let mut warmed = self.warmed_up.write().await;
        if !*warmed {
            self.client
                .get(config::NSE_BASE_URL)
                .header(header::ACCEPT, config::HEADER_ACCEPT_HTML)
                .send()
                .await?;

            tokio::time::sleep(Duration::from_millis(config::WARMUP_DELAY_MS)).await;
            *warmed = true;
            debug!("NSE session warmed up");
        }

        Ok(())
    }

    /// Single GET returning the body once it looks like JSON
    async fn fetch_json(&self, url: &str) -> Result<String, FetchError> {
        self.warmup_if_needed().await?;

        let res = self
            .client
            .get(url)
            .header(header::ACCEPT, config::HEADER_ACCEPT_JSON)
            .header(header::REFERER, config::HEADER_REFERER)
            .header("X-Requested-With", config::HEADER_X_REQUESTED_WITH)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();

            // A rejected session needs fresh cookies on the next attempt
            if status.is_client_error() {
                *self.warmed_up.write().await = false;
            }
            return Err(FetchError::Status { status, preview });
        }

        let text = res.text().await?;
        let trimmed = text.trim();
        if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            let preview: String = text.chars().take(200).collect();
            return Err(FetchError::NonJsonResponse(preview));
        }

        Ok(text)
    }
}

impl DataSource for NSEClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<ChainSnapshot, FetchError> {
        let url = config::nse_option_chain_indices_url(symbol);
        let text = self.fetch_json(&url).await?;
        let snapshot: ChainSnapshot = serde_json::from_str(&text)?;
        Ok(snapshot)
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_str(lang)?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .user_agent(config::USER_AGENT)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()
        .context("Failed to build HTTP client")
}
