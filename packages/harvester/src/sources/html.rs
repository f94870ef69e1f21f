//! Adapter for jurisdictions publishing plain HTML pages.

use std::sync::Arc;

use super::{PatternFetcher, StatuteSource};
use crate::error::{HarvesterError, Result};
use crate::http::bytes_to_string;
use crate::parser::toc::html_section_ids;
use crate::policy::{CancelFlag, RetryPolicy};
use crate::types::{RawDocument, SourceConfig};

/// Fetches HTML pages by URL pattern.
///
/// Locating statute text inside a page is left to the parser; this adapter
/// returns the page as fetched.
pub struct HtmlSource {
    fetcher: PatternFetcher,
}

impl HtmlSource {
    pub fn new(config: Arc<SourceConfig>) -> Result<Self> {
        Ok(Self {
            fetcher: PatternFetcher::new(config)?,
        })
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

impl StatuteSource for HtmlSource {
    fn config(&self) -> &SourceConfig {
        self.fetcher.config()
    }

    fn adapter_name(&self) -> &'static str {
        "html"
    }

    /// Sections linked from the code's index page, recognized by the
    /// section URL pattern.
    fn fetch_table_of_contents(&self, code: &str) -> Result<Vec<String>> {
        let config = self.fetcher.config();
        let pattern = config.section_url_pattern.as_deref().ok_or_else(|| {
            HarvesterError::Unsupported {
                jurisdiction: config.jurisdiction.clone(),
                message: "no section_url_pattern configured".to_string(),
            }
        })?;

        let (target, fetched) = self.fetcher.fetch_toc(code)?;
        let raw = bytes_to_string(&fetched.body, &fetched.url);
        html_section_ids(&raw, pattern, code, &target)
    }

    fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument> {
        self.fetcher.fetch_section(code, section_id)
    }
}
