use thiserror::Error;

/// Marker the upstream puts in its 400 message when the key is rejected
pub const INVALID_KEY_MARKER: &str = "API key not valid";

/// Failures surfaced by the audit client
#[derive(Debug, Error)]
pub enum AuditError {
    /// No credential was supplied; nothing was requested
    #[error("API key not provided. Please provide a valid PageSpeed Insights API key")]
    Configuration,

    /// Upstream rejected the credential
    #[error("invalid API key: {0}")]
    InvalidCredential(String),

    /// Credential is valid but lacks the required scope
    #[error("access forbidden: the API key lacks the necessary permissions")]
    Permission,

    /// Network error or unexpected HTTP status
    #[error("failed to fetch metrics: {0}")]
    Fetch(#[from] FetchFailure),

    /// Upstream answered with something other than an audit document
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// Underlying cause of an [`AuditError::Fetch`]
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
}

impl AuditError {
    /// Whether every following request would fail the same way
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(
            self,
            AuditError::Configuration | AuditError::InvalidCredential(_) | AuditError::Permission
        )
    }

    /// Short user-facing heading for this kind of failure
    pub fn category(&self) -> &'static str {
        match self {
            AuditError::Configuration => "Configuration Error",
            AuditError::InvalidCredential(_) => "Invalid API Key",
            AuditError::Permission => "Permission Denied",
            AuditError::Fetch(_) => "Network Error",
            AuditError::InvalidResponse(_) => "API Error",
        }
    }
}
