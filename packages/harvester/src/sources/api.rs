//! Adapter for generic JSON statute APIs.

use std::sync::Arc;

use super::{PatternFetcher, StatuteSource};
use crate::error::Result;
use crate::http::bytes_to_string;
use crate::parser::toc::json_section_ids;
use crate::policy::{CancelFlag, RetryPolicy};
use crate::types::{RawDocument, SourceConfig};

const DEFAULT_SECTION_PATTERN: &str = "/codes/{code}/sections/{section}";
const DEFAULT_TOC_PATTERN: &str = "/codes/{code}/sections";

/// Fetches JSON documents from a REST API.
///
/// URL patterns default to `/codes/{code}/sections[/{section}]` under the
/// base URL. A configured API key is sent as a bearer token.
pub struct ApiSource {
    fetcher: PatternFetcher,
}

impl ApiSource {
    pub fn new(config: Arc<SourceConfig>) -> Result<Self> {
        let api_key = config.api_key.clone();
        let mut fetcher = PatternFetcher::new(config)?
            .with_default_patterns(DEFAULT_SECTION_PATTERN, DEFAULT_TOC_PATTERN)
            .with_header("Accept", "application/json");
        if let Some(key) = api_key {
            fetcher = fetcher.with_header("Authorization", format!("Bearer {key}"));
        }
        Ok(Self { fetcher })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.fetcher = self.fetcher.with_retry_policy(retry);
        self
    }

    #[must_use]
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.fetcher = self.fetcher.with_cancel_flag(flag);
        self
    }
}

impl StatuteSource for ApiSource {
    fn config(&self) -> &SourceConfig {
        self.fetcher.config()
    }

    fn adapter_name(&self) -> &'static str {
        "api"
    }

    fn fetch_table_of_contents(&self, code: &str) -> Result<Vec<String>> {
        let (target, fetched) = self.fetcher.fetch_toc(code)?;
        let raw = bytes_to_string(&fetched.body, &fetched.url);
        json_section_ids(&raw, &target)
    }

    fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument> {
        self.fetcher.fetch_section(code, section_id)
    }
}
