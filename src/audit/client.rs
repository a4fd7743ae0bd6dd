use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::cache::{CacheKey, TtlCache};
use super::error::{AuditError, FetchFailure, INVALID_KEY_MARKER};
use super::model::{Category, NormalizedAuditResult, Strategy};
use super::normalizer;
use crate::config::AuditConfig;

/// Memo of normalized results shared between clients
pub type ResultCache = TtlCache<CacheKey, NormalizedAuditResult>;

/// PageSpeed Insights client.
///
/// Issues one GET per (url, strategy) and hands the payload to the
/// normalizer. Successful results are memoized in the injected cache.
pub struct AuditClient {
    http: Client,
    endpoint: String,
    api_key: String,
    cache: Arc<ResultCache>,
}

impl AuditClient {
    /// Creates a client with its own cache sized from `config`
    ///
    /// # Arguments
    /// * `api_key` - PageSpeed Insights credential; blank keys are rejected
    /// * `config` - Endpoint, user agent, timeout and cache window
    ///
    /// # Returns
    /// * `Result<AuditClient, AuditError>` - `Configuration` when the key is missing
    pub fn new(api_key: Option<&str>, config: &AuditConfig) -> Result<Self, AuditError> {
        let cache = Arc::new(ResultCache::new(config.cache_ttl()));
        Self::with_cache(api_key, config, cache)
    }

    /// Creates a client that memoizes into `cache`
    pub fn with_cache(
        api_key: Option<&str>,
        config: &AuditConfig,
        cache: Arc<ResultCache>,
    ) -> Result<Self, AuditError> {
        let api_key = match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                error!("Audit client constructed without an API key");
                return Err(AuditError::Configuration);
            }
        };

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&config.user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(e) => warn!("Ignoring unusable user agent {:?}: {}", config.user_agent, e),
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuditError::Fetch(FetchFailure::Transport(e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Fetches and normalizes the audit of `url` under `strategy`
    ///
    /// # Returns
    /// * `Result<NormalizedAuditResult, AuditError>` - Normalized scores, or the
    ///   classified upstream failure
    #[instrument(skip(self))]
    pub async fn get_metrics(
        &self,
        url: &str,
        strategy: Strategy,
    ) -> Result<NormalizedAuditResult, AuditError> {
        let key = CacheKey::new(url, strategy, &self.api_key);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Serving {} ({}) from cache", url, strategy);
            return Ok(cached);
        }

        info!("Requesting {} audit for {}", strategy, url);
        let raw = self.fetch(url, strategy).await?;

        let normalization = normalizer::normalize(&raw)?;
        if normalization.degraded {
            warn!("Score error for {}, recorded default scores", url);
        }

        let result = normalization.result;
        self.cache.purge_expired();
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    async fn fetch(&self, url: &str, strategy: Strategy) -> Result<Value, AuditError> {
        let mut query: Vec<(&str, &str)> = vec![("url", url), ("strategy", strategy.as_str())];
        query.extend(Category::ALL.iter().map(|c| ("category", c.as_str())));
        query.push(("key", self.api_key.as_str()));

        let response = self
            .http
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                error!("Request for {} failed: {}", url, e);
                FetchFailure::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Could not read {} error body for {}: {}", status, url, e);
                    String::new()
                }
            };
            return Err(classify_status(status, &body));
        }

        let body = response.text().await.map_err(FetchFailure::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Response for {} is not JSON: {}", url, e);
            AuditError::InvalidResponse(format!("response body is not JSON: {}", e))
        })
    }
}

/// Maps a non-2xx upstream answer onto the error taxonomy
pub fn classify_status(status: StatusCode, body: &str) -> AuditError {
    let detail = error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    });

    match status {
        StatusCode::BAD_REQUEST if detail.contains(INVALID_KEY_MARKER) => {
            error!("Upstream rejected the API key: {}", detail);
            AuditError::InvalidCredential(detail)
        }
        StatusCode::FORBIDDEN => {
            error!("Upstream refused access: {}", detail);
            AuditError::Permission
        }
        _ => {
            warn!("Upstream answered {}: {}", status, detail);
            AuditError::Fetch(FetchFailure::Status {
                status: status.as_u16(),
                detail,
            })
        }
    }
}

/// `error.message` of a Google API error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
