//! Error types for website-audit

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during website audit operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid URL provided
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// HTTP response error status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// Remote service answered with a body we could not decode
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No auditor registered under the requested name
    #[error("`{0}` is an invalid auditor name")]
    UnknownAuditor(String),

    /// Auditor is valid but declined to produce results for the target
    #[error("`{0}` auditor source is valid but the scan returns non essential audit results")]
    AuditorDeclined(String),

    /// Audit completed without a usable payload
    #[error("audit returns empty results")]
    EmptyAudit,

    /// Invalid output format specified
    #[error("invalid output format: '{0}' (valid: human, json, none)")]
    InvalidOutputFormat(String),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    SerializationFailed(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code used in response envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "ews_invalid_url",
            Self::HttpClient(_) => "ews_http_client",
            Self::HttpRequest(_) | Self::HttpStatus(_) => "ews_transport_error",
            Self::InvalidResponse(_) => "ews_invalid_response",
            Self::UnknownAuditor(_) => "ews_invalid_auditor_name",
            Self::AuditorDeclined(_) => "ews_auditor_results_invalid",
            Self::EmptyAudit => "ews_empty_audit",
            Self::InvalidOutputFormat(_) | Self::OutputFailed(_) => "ews_output_failed",
            Self::SerializationFailed(_) => "ews_invalid_response",
        }
    }
}
