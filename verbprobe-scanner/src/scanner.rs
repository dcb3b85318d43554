use crate::classify::{Classification, classify};
use crate::error::{Result, ScanError};
use crate::method::HttpMethod;
use crate::probe::Prober;
use crate::result::{MethodResult, ScanOutcome};
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Knobs for a scanner instance
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Deadline for each individual probe
    pub timeout: Duration,
    /// Maximum number of probes in flight at once
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: format!("verbprobe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Probes every method of the fixed set against a URL.
///
/// A scanner owns the HTTP connection pool and the probe limiter for one
/// batch. Clones share both.
#[derive(Clone)]
pub struct Scanner {
    prober: Prober,
    config: ScanConfig,
}

impl Scanner {
    pub fn new() -> Self {
        let config = ScanConfig::default();
        Self::try_new(config.clone()).unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Self::from_parts(Client::new(), config)
        })
    }

    pub fn try_new(config: ScanConfig) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self::from_parts(client, config))
    }

    fn from_parts(client: Client, config: ScanConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            prober: Prober::new(client, limiter, config.timeout),
            config,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self> {
        Self::try_new(ScanConfig { timeout, ..self.config })
    }

    pub fn with_concurrency(self, concurrency: usize) -> Result<Self> {
        Self::try_new(ScanConfig {
            concurrency,
            ..self.config
        })
    }

    /// Probe all methods concurrently and wait for every one of them.
    pub async fn scan(&self, url: &Url) -> ScanOutcome {
        debug!("Scanning {} with {} methods", url, HttpMethod::ALL.len());

        let probes = HttpMethod::ALL
            .into_iter()
            .map(|method| self.prober.probe(url, method));
        let results: Vec<MethodResult> = join_all(probes).await;

        let outcome = ScanOutcome::from_results(results);
        match &outcome {
            ScanOutcome::Methods(report) => {
                debug!("{} accepts {} method(s)", url, report.len())
            }
            ScanOutcome::Unreachable => warn!("No methods available for {}", url),
        }
        outcome
    }

    /// Classify `raw` and scan it if it is an http(s) URL.
    pub async fn scan_str(&self, raw: &str) -> Result<ScanOutcome> {
        match classify(raw) {
            Classification::Eligible(url) => Ok(self.scan(&url).await),
            Classification::UnsupportedScheme(url) => Err(ScanError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                raw
            ))),
            Classification::Invalid => Err(ScanError::InvalidUrl(raw.to_string())),
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
