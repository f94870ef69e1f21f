//! Dedicated client for the New York Senate Open Legislation API.
//!
//! Same fetch contract as every other adapter, with New York's own
//! authentication (an API key sent as the `key` query parameter), law-tree
//! table of contents and paged law listing.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::{PatternFetcher, StatuteSource};
use crate::config::{validate_section_id, NY_API_KEY_ENV};
use crate::error::{HarvesterError, RequestTarget, Result};
use crate::http::Fetched;
use crate::policy::{CancelFlag, RetryPolicy};
use crate::registry::NY_API_BASE_URL;
use crate::types::{RawDocument, SourceConfig};

/// Laws requested per page by [`NyLegislationSource::list_remote_laws`].
const LAW_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LawListPage {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<LawList>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    offset_end: u64,
}

#[derive(Debug, Deserialize)]
struct LawList {
    #[serde(default)]
    items: Vec<LawInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LawInfo {
    law_id: String,
    #[serde(default)]
    name: String,
}

/// Client for `legislation.nysenate.gov`.
pub struct NyLegislationSource {
    fetcher: PatternFetcher,
    api_key: Option<String>,
}

impl NyLegislationSource {
    /// Create a client; the key comes from the configuration or
    /// `NY_LEGISLATION_API_KEY`.
    ///
    /// A missing key is not an error here: every fetch fails with `Auth`
    /// before touching the network instead.
    pub fn new(config: Arc<SourceConfig>) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(NY_API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            fetcher: PatternFetcher::new(config)?.with_header("Accept", "application/json"),
            api_key,
        })
    }

    /// Override the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
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

    fn base_url(&self) -> &str {
        let base = self.fetcher.config().base_url.as_str();
        if base.is_empty() {
            NY_API_BASE_URL
        } else {
            base
        }
    }

    /// Build an API URL. Returns the URL to request and the same URL
    /// without the key, for logging and `RawDocument::url`.
    fn api_url(
        &self,
        target: &RequestTarget,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<(String, String)> {
        let api_key = self.api_key.as_deref().ok_or_else(|| HarvesterError::Auth {
            target: target.clone(),
            message: format!("no API key configured; set api_key or {NY_API_KEY_ENV}"),
        })?;

        let invalid = |message: String| HarvesterError::InvalidConfig {
            jurisdiction: target.jurisdiction.clone(),
            message,
        };

        let mut url = Url::parse(self.base_url())
            .map_err(|e| invalid(format!("invalid base_url '{}': {e}", self.base_url())))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("base_url '{}' cannot have a path", self.base_url())))?
            .pop_if_empty()
            .extend(segments);
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        let public = url.to_string();

        url.query_pairs_mut().append_pair("key", api_key);
        Ok((url.to_string(), public))
    }

    fn get_json(&self, url: &str, public: &str, target: &RequestTarget) -> Result<(Fetched, Value)> {
        tracing::debug!(request = %target, url = %public, "Calling Open Legislation API");
        let fetched = self.fetcher.get(url, target)?;
        let value: Value = serde_json::from_slice(&fetched.body).map_err(|e| HarvesterError::Parse {
            target: target.clone(),
            message: format!("invalid JSON from Open Legislation API: {e}"),
        })?;

        if value.get("success").and_then(Value::as_bool) == Some(false) {
            let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
            tracing::debug!(request = %target, api_message = message, "API reported failure");
            return Err(HarvesterError::NotFound {
                target: target.clone(),
            });
        }
        Ok((fetched, value))
    }

    /// Every law the API knows about, keyed by law id.
    ///
    /// Pages through `/laws` until the reported total is reached.
    pub fn list_remote_laws(&self) -> Result<BTreeMap<String, String>> {
        let target = RequestTarget::jurisdiction(&self.fetcher.config().jurisdiction);
        let mut laws = BTreeMap::new();
        let mut offset: u64 = 1;

        loop {
            let (url, public) = self.api_url(
                &target,
                &["laws"],
                &[
                    ("limit", LAW_PAGE_SIZE.to_string()),
                    ("offset", offset.to_string()),
                ],
            )?;
            let (_, value) = self.get_json(&url, &public, &target)?;
            let page: LawListPage =
                serde_json::from_value(value).map_err(|e| HarvesterError::Parse {
                    target: target.clone(),
                    message: format!("unexpected law listing: {e}"),
                })?;
            if !page.success {
                return Err(HarvesterError::Parse {
                    target: target.clone(),
                    message: page
                        .message
                        .unwrap_or_else(|| "law listing reported failure".to_string()),
                });
            }

            let items = page.result.map(|r| r.items).unwrap_or_default();
            let count = items.len() as u64;
            for law in items {
                laws.insert(law.law_id, law.name);
            }

            let next = if page.offset_end > 0 {
                page.offset_end + 1
            } else {
                offset + count
            };
            if count == 0 || next > page.total {
                break;
            }
            if next <= offset {
                tracing::warn!(offset, next, "Law listing offset did not advance, stopping");
                break;
            }
            offset = next;
        }

        Ok(laws)
    }
}

/// Location ids of every `SECTION` node in a law tree, in tree order.
fn collect_sections(node: &Value, ids: &mut Vec<String>, seen: &mut HashSet<String>) {
    if node.get("docType").and_then(Value::as_str) == Some("SECTION") {
        if let Some(id) = node.get("locationId").and_then(Value::as_str) {
            if seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }
    }
    if let Some(children) = node.pointer("/documents/items").and_then(Value::as_array) {
        for child in children {
            collect_sections(child, ids, seen);
        }
    }
}

impl StatuteSource for NyLegislationSource {
    fn config(&self) -> &SourceConfig {
        self.fetcher.config()
    }

    fn adapter_name(&self) -> &'static str {
        "ny-legislation"
    }

    fn fetch_table_of_contents(&self, code: &str) -> Result<Vec<String>> {
        self.fetcher.config().ensure_code(code)?;
        let target = RequestTarget::code(&self.fetcher.config().jurisdiction, code);

        let (url, public) = self.api_url(&target, &["laws", code], &[("full", "false".to_string())])?;
        let (_, value) = self.get_json(&url, &public, &target)?;

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        if let Some(root) = value.pointer("/result/documents") {
            collect_sections(root, &mut ids, &mut seen);
        }
        Ok(ids)
    }

    fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument> {
        let jurisdiction = &self.fetcher.config().jurisdiction;
        self.fetcher.config().ensure_code(code)?;
        let target = RequestTarget::section(jurisdiction, code, section_id);
        validate_section_id(&target, section_id)?;

        let (url, public) = self.api_url(&target, &["laws", code, section_id], &[])?;
        let (fetched, _) = self.get_json(&url, &public, &target)?;

        Ok(RawDocument {
            target,
            url: public,
            content_type: fetched.content_type,
            body: fetched.body,
        })
    }
}
