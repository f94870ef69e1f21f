//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with full request context, and `FetchFailure` for the underlying cause
//! of a failed network attempt.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Coordinates of a fetch request, carried by every fetch-side error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Jurisdiction id (e.g., "us-oh").
    pub jurisdiction: String,

    /// Code identifier, if the request concerned one.
    pub code: Option<String>,

    /// Section identifier, if the request concerned one.
    pub section: Option<String>,
}

impl RequestTarget {
    /// Target for a whole jurisdiction.
    #[must_use]
    pub fn jurisdiction(jurisdiction: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            code: None,
            section: None,
        }
    }

    /// Target for a code within a jurisdiction.
    #[must_use]
    pub fn code(jurisdiction: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            code: Some(code.into()),
            section: None,
        }
    }

    /// Target for a single section.
    #[must_use]
    pub fn section(
        jurisdiction: impl Into<String>,
        code: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            code: Some(code.into()),
            section: Some(section.into()),
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.jurisdiction)?;
        if let Some(code) = &self.code {
            write!(f, " code {code}")?;
        }
        if let Some(section) = &self.section {
            write!(f, " section {section}")?;
        }
        Ok(())
    }
}

/// Underlying cause of a single failed fetch attempt.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// Connection, timeout or body read failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a retryable status.
    #[error("server responded with status {0}")]
    Status(u16),

    /// Server rejected the request because of its own rate limit.
    #[error("rate limited by remote server{}", .retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },
}

impl FetchFailure {
    /// True when the same request may succeed later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_body(),
            Self::Status(status) => *status >= 500 || *status == 408,
            Self::RateLimited { .. } => true,
        }
    }
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// No configuration exists for the jurisdiction.
    #[error("No source configured for jurisdiction '{jurisdiction}'")]
    ConfigNotFound { jurisdiction: String },

    /// Known jurisdiction, unknown code or section.
    #[error("Not found: {target}")]
    NotFound { target: RequestTarget },

    /// Missing or rejected credential.
    #[error("Authentication failed for {target}: {message}")]
    Auth {
        target: RequestTarget,
        message: String,
    },

    /// Retries exhausted on a transient failure.
    #[error("Fetch failed for {target} after {attempts} attempt(s): {source}")]
    Fetch {
        target: RequestTarget,
        attempts: u32,
        #[source]
        source: FetchFailure,
    },

    /// Document could not be structurally interpreted at all.
    #[error("Failed to parse document for {target}: {message}")]
    Parse {
        target: RequestTarget,
        message: String,
    },

    /// The jurisdiction's configuration does not support the operation.
    #[error("Unsupported for {jurisdiction}: {message}")]
    Unsupported {
        jurisdiction: String,
        message: String,
    },

    /// The caller abandoned the request at a retry boundary.
    #[error("Fetch cancelled for {target}")]
    Cancelled { target: RequestTarget },

    /// A source configuration failed validation.
    #[error("Invalid source configuration for '{jurisdiction}': {message}")]
    InvalidConfig {
        jurisdiction: String,
        message: String,
    },

    /// HTTP client error outside the retry loop (e.g. client construction).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarvesterError {
    /// True for "does not exist" outcomes that are pointless to retry.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ConfigNotFound { .. })
    }

    /// True when retrying later at a higher level may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { source, .. } if source.is_transient())
    }

    /// The request coordinates, when the error has them.
    #[must_use]
    pub fn target(&self) -> Option<&RequestTarget> {
        match self {
            Self::NotFound { target }
            | Self::Auth { target, .. }
            | Self::Fetch { target, .. }
            | Self::Parse { target, .. }
            | Self::Cancelled { target } => Some(target),
            _ => None,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_request_target_display() {
        assert_eq!(RequestTarget::jurisdiction("us").to_string(), "us");
        assert_eq!(RequestTarget::code("us-oh", "57").to_string(), "us-oh code 57");
        assert_eq!(
            RequestTarget::section("us-oh", "57", "5747.01").to_string(),
            "us-oh code 57 section 5747.01"
        );
    }

    #[test]
    fn test_not_found_display_identifies_target() {
        let err = HarvesterError::NotFound {
            target: RequestTarget::section("us-nc", "105", "105-130.3"),
        };
        let msg = err.to_string();
        assert!(msg.contains("us-nc"));
        assert!(msg.contains("105-130.3"));
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_fetch_error_wraps_last_cause() {
        let err = HarvesterError::Fetch {
            target: RequestTarget::code("us", "26"),
            attempts: 4,
            source: FetchFailure::Status(503),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("after 4 attempt(s)"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("server responded with status 503"));
    }

    #[test]
    fn test_rate_limited_display() {
        let failure = FetchFailure::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(
            failure.to_string(),
            "rate limited by remote server (retry after 7s)"
        );
        let failure = FetchFailure::RateLimited { retry_after: None };
        assert_eq!(failure.to_string(), "rate limited by remote server");
    }

    #[test]
    fn test_target_accessor() {
        let err = HarvesterError::ConfigNotFound {
            jurisdiction: "xx".to_string(),
        };
        assert!(err.target().is_none());
        assert!(err.to_string().contains("'xx'"));
    }
}
