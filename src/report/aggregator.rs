use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::audit::{AuditClient, AuditError, NormalizedAuditResult, Strategy};

/// Desktop and mobile results for one analyzed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub url: String,
    pub desktop: NormalizedAuditResult,
    pub mobile: NormalizedAuditResult,
}

/// Records in submission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    records: Vec<AnalysisRecord>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AnalysisRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<AnalysisRecord>> for Batch {
    fn from(records: Vec<AnalysisRecord>) -> Self {
        Self { records }
    }
}

/// A URL that could not be analyzed, and why
#[derive(Debug)]
pub struct UrlFailure {
    pub url: String,
    pub error: AuditError,
}

/// What a batch run produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub batch: Batch,
    /// Per-URL failures, in submission order
    pub failures: Vec<UrlFailure>,
    /// Credential failure that stopped the run; its URL is not in `failures`
    pub fatal: Option<UrlFailure>,
    /// URLs never attempted because the run stopped early
    pub skipped: Vec<String>,
    pub aborted: bool,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.fatal.is_none() && !self.aborted
    }
}

/// Cloneable flag that stops a running batch between URLs
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs every URL through the audit client, one at a time
pub struct Aggregator<'a> {
    client: &'a AuditClient,
    parallel_strategies: bool,
    abort: AbortHandle,
}

impl<'a> Aggregator<'a> {
    pub fn new(client: &'a AuditClient) -> Self {
        Self {
            client,
            parallel_strategies: false,
            abort: AbortHandle::new(),
        }
    }

    /// Fetch desktop and mobile concurrently instead of back to back
    pub fn with_parallel_strategies(mut self, parallel: bool) -> Self {
        self.parallel_strategies = parallel;
        self
    }

    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Analyzes a single URL under both strategies
    ///
    /// # Returns
    /// * `Result<AnalysisRecord, AuditError>` - Both results, or the first failure
    #[instrument(skip(self))]
    pub async fn analyze_url(&self, url: &str) -> Result<AnalysisRecord, AuditError> {
        let (desktop, mobile) = if self.parallel_strategies {
            let (desktop, mobile) = tokio::join!(
                self.client.get_metrics(url, Strategy::Desktop),
                self.client.get_metrics(url, Strategy::Mobile),
            );
            (desktop?, mobile?)
        } else {
            let desktop = self.client.get_metrics(url, Strategy::Desktop).await?;
            let mobile = self.client.get_metrics(url, Strategy::Mobile).await?;
            (desktop, mobile)
        };

        Ok(AnalysisRecord {
            url: url.to_string(),
            desktop,
            mobile,
        })
    }

    /// Analyzes `urls` in order.
    ///
    /// A per-URL failure is recorded and the run continues; a credential
    /// failure stops the run since every later request would fail the same way.
    pub async fn run<S: AsRef<str>>(&self, urls: &[S]) -> BatchOutcome {
        let total = urls.len();
        let mut outcome = BatchOutcome::default();

        for (i, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            if self.abort.is_aborted() {
                warn!("Batch aborted after {} of {} URLs", i, total);
                outcome.aborted = true;
                outcome.skipped = remaining(urls, i);
                break;
            }

            info!("[{}/{}] Analyzing {}", i + 1, total, url);
            match self.analyze_url(url).await {
                Ok(record) => outcome.batch.push(record),
                Err(e) if e.is_fatal_for_batch() => {
                    error!("Stopping batch at {}: {}", url, e);
                    outcome.fatal = Some(UrlFailure {
                        url: url.to_string(),
                        error: e,
                    });
                    outcome.skipped = remaining(urls, i + 1);
                    break;
                }
                Err(e) => {
                    warn!("Error analyzing {}: {}", url, e);
                    outcome.failures.push(UrlFailure {
                        url: url.to_string(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "Analysis completed for {} of {} URLs",
            outcome.batch.len(),
            total
        );
        outcome
    }
}

fn remaining<S: AsRef<str>>(urls: &[S], from: usize) -> Vec<String> {
    urls[from..].iter().map(|u| u.as_ref().to_string()).collect()
}
