use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use verbprobe_scanner::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS};
use verbprobe_scanner::{Classification, ScanConfig, ScanError, ScanOutcome, Scanner, classify};

/// Options for configuring a batch run
pub struct BatchOptions {
    pub urls: Vec<String>,
    /// Deadline for each probe
    pub timeout: Duration,
    /// Maximum number of probes in flight across the whole batch
    pub concurrency: usize,
    pub show_progress_bars: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting batch progress
pub type BatchProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback invoked as each URL scan finishes
pub type ScanResultCallback = Arc<dyn Fn(&str, &ScanOutcome) + Send + Sync>;

/// Terminal state of one raw input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Disposition {
    Invalid,
    UnsupportedScheme,
    Scanned(ScanOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub input: String,
    pub disposition: Disposition,
}

impl BatchEntry {
    /// Human readable message for inputs that were not scanned
    pub fn diagnostic(&self) -> Option<String> {
        match self.disposition {
            Disposition::Invalid => Some(format!("String \"{}\" is not a link.", self.input)),
            Disposition::UnsupportedScheme => Some(format!(
                "Link \"{}\" is not an HTTP/HTTPS link.",
                self.input
            )),
            Disposition::Scanned(_) => None,
        }
    }

    pub fn outcome(&self) -> Option<&ScanOutcome> {
        match &self.disposition {
            Disposition::Scanned(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Everything a batch produced, one entry per input in input order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic messages in input order. Repeated inputs repeat.
    pub fn diagnostics(&self) -> Vec<String> {
        self.entries.iter().filter_map(BatchEntry::diagnostic).collect()
    }

    /// Scan outcomes keyed by the raw URL string. When the same URL was
    /// given more than once, the later entry wins.
    pub fn merged(&self) -> BTreeMap<String, ScanOutcome> {
        let mut merged = BTreeMap::new();
        for entry in &self.entries {
            if let Some(outcome) = entry.outcome() {
                merged.insert(entry.input.clone(), outcome.clone());
            }
        }
        merged
    }

    pub fn scanned_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome().is_some()).count()
    }

    pub fn unreachable_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome().is_some_and(ScanOutcome::is_unreachable))
            .count()
    }
}

/// Classify every input and scan the eligible ones concurrently.
///
/// Returns once every scan finished. Never fails: bad inputs become
/// diagnostic entries and network trouble becomes part of the outcome.
pub async fn run_batch(scanner: &Scanner, inputs: &[String]) -> BatchResult {
    run_batch_with_callback(scanner, inputs, None).await
}

pub async fn run_batch_with_callback(
    scanner: &Scanner,
    inputs: &[String],
    result_callback: Option<ScanResultCallback>,
) -> BatchResult {
    let classified: Vec<Classification> = inputs.iter().map(|raw| classify(raw)).collect();

    let eligible = classified.iter().filter(|c| c.is_eligible()).count();
    info!(
        "Batch of {} input(s): {} eligible, {} rejected",
        inputs.len(),
        eligible,
        inputs.len() - eligible
    );

    let scans = classified
        .iter()
        .enumerate()
        .filter_map(|(idx, classification)| match classification {
            Classification::Eligible(url) => Some(scan_one(
                scanner,
                idx,
                &inputs[idx],
                url,
                result_callback.as_ref(),
            )),
            _ => None,
        });
    let mut outcomes: HashMap<usize, ScanOutcome> = join_all(scans).await.into_iter().collect();

    let entries: Vec<BatchEntry> = inputs
        .iter()
        .zip(classified)
        .enumerate()
        .map(|(idx, (input, classification))| {
            let disposition = match classification {
                Classification::Invalid => Disposition::Invalid,
                Classification::UnsupportedScheme(_) => Disposition::UnsupportedScheme,
                Classification::Eligible(_) => Disposition::Scanned(
                    outcomes.remove(&idx).unwrap_or(ScanOutcome::Unreachable),
                ),
            };
            BatchEntry {
                input: input.clone(),
                disposition,
            }
        })
        .collect();

    let result = BatchResult::new(entries);
    info!(
        "Batch complete: {} scanned, {} unreachable",
        result.scanned_count(),
        result.unreachable_count()
    );
    result
}

async fn scan_one(
    scanner: &Scanner,
    idx: usize,
    input: &str,
    url: &Url,
    result_callback: Option<&ScanResultCallback>,
) -> (usize, ScanOutcome) {
    let outcome = scanner.scan(url).await;
    debug!("Finished {} (input #{})", input, idx);
    if let Some(callback) = result_callback {
        callback(input, &outcome);
    }
    (idx, outcome)
}

/// Run a batch with a scanner built from `options`.
///
/// The scanner (connection pool and probe limiter) lives only for this
/// call. Fails only if the HTTP client cannot be built or the options are
/// unusable.
pub async fn execute_batch(
    options: BatchOptions,
    progress_callback: Option<BatchProgressCallback>,
) -> Result<BatchResult, ScanError> {
    let BatchOptions {
        urls,
        timeout,
        concurrency,
        show_progress_bars,
    } = options;

    let scanner = Scanner::try_new(ScanConfig {
        timeout,
        concurrency,
        ..ScanConfig::default()
    })?;

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Probing {} input(s) with up to {} concurrent request(s)",
            urls.len(),
            concurrency
        ));
    }

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting probes...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let scanned = Arc::new(AtomicUsize::new(0));
    let pb_clone = progress_bar.clone();
    let progress_clone = progress_callback.clone();
    let scanned_clone = scanned.clone();
    let result_callback: ScanResultCallback = Arc::new(move |input: &str, outcome: &ScanOutcome| {
        let count = scanned_clone.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref pb) = pb_clone {
            pb.set_message(format!("Probing... {} URL(s) done", count));
        }
        if let Some(ref callback) = progress_clone {
            let summary = match outcome.report() {
                Some(report) => format!("{} method(s) accepted", report.len()),
                None => "unreachable".to_string(),
            };
            callback(format!("Scanned {}: {}", input, summary));
        }
    });

    let result = run_batch_with_callback(&scanner, &urls, Some(result_callback)).await;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    Ok(result)
}
