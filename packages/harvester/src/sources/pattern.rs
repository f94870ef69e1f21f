//! URL-pattern fetch core shared by the USLM, HTML and generic API adapters.

use std::sync::Arc;

use reqwest::blocking::Client;

use crate::config::{expand_pattern, join_url, validate_section_id};
use crate::error::{HarvesterError, RequestTarget, Result};
use crate::http::{create_client, get_once, Fetched};
use crate::policy::{CancelFlag, RateLimiter, RetryPolicy};
use crate::types::{RawDocument, SourceConfig};

/// Fetches documents by expanding a jurisdiction's URL patterns.
///
/// Owns the adapter's HTTP client, rate limiter and retry policy; every
/// request it makes goes through [`RetryPolicy::run`].
pub struct PatternFetcher {
    config: Arc<SourceConfig>,
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    headers: Vec<(&'static str, String)>,
    default_section_pattern: Option<&'static str>,
    default_toc_pattern: Option<&'static str>,
}

impl PatternFetcher {
    /// Create a fetcher with the configuration's rate limit and retry cap.
    pub fn new(config: Arc<SourceConfig>) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            limiter: RateLimiter::from_secs(config.rate_limit),
            retry: RetryPolicy::new(config.max_retries),
            config,
            headers: Vec::new(),
            default_section_pattern: None,
            default_toc_pattern: None,
        })
    }

    /// Replace the retry policy.
    ///
    /// A cancellation flag already attached is kept unless `retry` has its own.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        let attached = self.retry.cancel_flag().cloned();
        self.retry = match attached {
            Some(flag) if retry.cancel_flag().is_none() => retry.with_cancel_flag(flag),
            _ => retry,
        };
        self
    }

    /// Attach a cancellation flag to the current retry policy.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.retry = self.retry.with_cancel_flag(flag);
        self
    }

    /// Send an extra header with every request.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Patterns used when the configuration has none.
    #[must_use]
    pub fn with_default_patterns(mut self, section: &'static str, toc: &'static str) -> Self {
        self.default_section_pattern = Some(section);
        self.default_toc_pattern = Some(toc);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Resolve the URL of one section, validating code and section first.
    pub fn section_url(&self, code: &str, section_id: &str) -> Result<String> {
        let jurisdiction = &self.config.jurisdiction;
        self.config.ensure_code(code)?;
        validate_section_id(
            &RequestTarget::section(jurisdiction, code, section_id),
            section_id,
        )?;

        let pattern = self
            .config
            .section_url_pattern
            .as_deref()
            .or(self.default_section_pattern)
            .ok_or_else(|| HarvesterError::Unsupported {
                jurisdiction: jurisdiction.clone(),
                message: "no section_url_pattern configured".to_string(),
            })?;

        let path = expand_pattern(
            jurisdiction,
            pattern,
            &[
                ("code", code),
                ("section", section_id),
                ("jurisdiction", jurisdiction),
            ],
        )?;
        Ok(join_url(&self.config.base_url, &path))
    }

    /// Resolve the URL of a code's table of contents.
    pub fn toc_url(&self, code: &str) -> Result<String> {
        let jurisdiction = &self.config.jurisdiction;
        self.config.ensure_code(code)?;

        let pattern = self
            .config
            .toc_url_pattern
            .as_deref()
            .or(self.default_toc_pattern)
            .ok_or_else(|| HarvesterError::Unsupported {
                jurisdiction: jurisdiction.clone(),
                message: "no toc_url_pattern configured".to_string(),
            })?;

        let path = expand_pattern(
            jurisdiction,
            pattern,
            &[("code", code), ("jurisdiction", jurisdiction)],
        )?;
        Ok(join_url(&self.config.base_url, &path))
    }

    /// GET a URL through the rate limiter and retry policy.
    pub fn get(&self, url: &str, target: &RequestTarget) -> Result<Fetched> {
        self.retry.run(&self.limiter, target, |attempt| {
            tracing::debug!(request = %target, attempt, "Sending request");
            get_once(&self.client, url, &self.headers)
        })
    }

    /// Fetch one section document.
    ///
    /// A successful response with an empty body is treated as "not found".
    pub fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument> {
        let url = self.section_url(code, section_id)?;
        let target = RequestTarget::section(&self.config.jurisdiction, code, section_id);
        tracing::debug!(request = %target, url = %url, "Fetching section");

        let fetched = self.get(&url, &target)?;
        if fetched.body.iter().all(u8::is_ascii_whitespace) {
            return Err(HarvesterError::NotFound { target });
        }

        Ok(RawDocument {
            target,
            url: fetched.url,
            content_type: fetched.content_type,
            body: fetched.body,
        })
    }

    /// Fetch a code's table-of-contents document.
    pub fn fetch_toc(&self, code: &str) -> Result<(RequestTarget, Fetched)> {
        let url = self.toc_url(code)?;
        let target = RequestTarget::code(&self.config.jurisdiction, code);
        tracing::debug!(request = %target, url = %url, "Fetching table of contents");

        let fetched = self.get(&url, &target)?;
        Ok((target, fetched))
    }
}
