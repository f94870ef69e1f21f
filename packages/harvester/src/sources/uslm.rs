//! Adapter for USLM XML sources (the United States Code on govinfo).

use std::sync::Arc;

use super::{PatternFetcher, StatuteSource};
use crate::error::Result;
use crate::http::bytes_to_string;
use crate::parser::toc::uslm_section_ids;
use crate::policy::{CancelFlag, RetryPolicy};
use crate::types::{RawDocument, SourceConfig};

/// Fetches USLM documents by URL pattern.
pub struct UslmSource {
    fetcher: PatternFetcher,
}

impl UslmSource {
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

impl StatuteSource for UslmSource {
    fn config(&self) -> &SourceConfig {
        self.fetcher.config()
    }

    fn adapter_name(&self) -> &'static str {
        "uslm"
    }

    /// Section numbers of every top-level `<section>` in the title document.
    fn fetch_table_of_contents(&self, code: &str) -> Result<Vec<String>> {
        let (target, fetched) = self.fetcher.fetch_toc(code)?;
        let raw = bytes_to_string(&fetched.body, &fetched.url);
        uslm_section_ids(&raw, &target)
    }

    fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument> {
        self.fetcher.fetch_section(code, section_id)
    }
}
