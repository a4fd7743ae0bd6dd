use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// PageSpeed Insights v5 endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Desktop Chrome identification sent with every request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "site_audit.toml";

/// Prefix of environment overrides, e.g. `SITE_AUDIT_CACHE_TTL_SECS`
pub const ENV_PREFIX: &str = "SITE_AUDIT";

/// Runtime settings for the auditor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Upstream audit endpoint
    pub endpoint: String,

    /// User agent header sent upstream
    pub user_agent: String,

    /// Timeout for a single upstream request, in seconds
    pub request_timeout_secs: u64,

    /// How long identical requests are served from the cache, in seconds
    pub cache_ttl_secs: u64,

    /// Issue the desktop and mobile requests for a URL concurrently
    pub parallel_strategies: bool,

    /// Worksheet name used by spreadsheet exports
    pub sheet_name: String,

    /// Directory for log files
    pub log_dir: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 60,
            cache_ttl_secs: 3600,
            parallel_strategies: false,
            sheet_name: "Analysis Results".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}

impl AuditConfig {
    /// Loads defaults, then the config file (if present), then `SITE_AUDIT_*` variables
    ///
    /// # Arguments
    /// * `path` - Explicit config file; must exist when given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;

        let config: AuditConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
