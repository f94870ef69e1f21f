//! Core data types for the harvester.
//!
//! `SourceConfig` describes how to reach one jurisdiction's law; `Section`
//! is the normalized unit produced by the parsers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{
    validate_jurisdiction_id, DEFAULT_MAX_RETRIES, DEFAULT_RATE_LIMIT_SECS, MAX_RATE_LIMIT_SECS,
};
use crate::error::{HarvesterError, RequestTarget, Result};

/// How a jurisdiction publishes its law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// United States Legislative Markup XML.
    Uslm,

    /// Plain HTML pages.
    #[default]
    Html,

    /// JSON REST API.
    Api,
}

impl SourceType {
    /// Get the lowercase identifier used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uslm => "uslm",
            Self::Html => "html",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_rate_limit() -> f64 {
    DEFAULT_RATE_LIMIT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// Configuration describing how to reach one jurisdiction's law.
///
/// Built once when the registry loads and shared read-only afterwards
/// (adapters hold it behind an `Arc`). Overlay YAML files deserialize
/// straight into this type; every field except `jurisdiction` has a default.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable lowercase identifier, e.g. "us" or "us-ca".
    #[serde(default)]
    pub jurisdiction: String,

    /// Human-readable jurisdiction name.
    #[serde(default)]
    pub name: String,

    /// Selects the adapter variant and parser family.
    #[serde(default)]
    pub source_type: SourceType,

    /// Root URL that relative patterns are joined onto.
    #[serde(default)]
    pub base_url: String,

    /// Pattern for a single section, with `{code}` and `{section}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_url_pattern: Option<String>,

    /// Pattern for a code's table of contents, with a `{code}` placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc_url_pattern: Option<String>,

    /// CSS selector list locating the content block of an HTML page.
    #[serde(default, alias = "content_selector", skip_serializing_if = "Option::is_none")]
    pub content_locator: Option<String>,

    /// CSS selector list locating the page title.
    #[serde(default, alias = "title_selector", skip_serializing_if = "Option::is_none")]
    pub title_locator: Option<String>,

    /// CSS selector list locating amendment history.
    #[serde(default, alias = "history_selector", skip_serializing_if = "Option::is_none")]
    pub history_locator: Option<String>,

    /// Code identifier to human-readable code name.
    #[serde(default)]
    pub codes: BTreeMap<String, String>,

    /// Codes to fetch first, in order. Always a subset of `codes`.
    #[serde(default)]
    pub priority_codes: Vec<String>,

    /// Minimum seconds between successive requests.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: f64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Credential for API sources. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Parser id overriding the source-type default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_parser: Option<String>,
}

impl SourceConfig {
    /// Create a configuration with defaults for everything but the identity fields.
    #[must_use]
    pub fn new(
        jurisdiction: impl Into<String>,
        name: impl Into<String>,
        source_type: SourceType,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            name: name.into(),
            source_type,
            base_url: base_url.into(),
            section_url_pattern: None,
            toc_url_pattern: None,
            content_locator: None,
            title_locator: None,
            history_locator: None,
            codes: BTreeMap::new(),
            priority_codes: Vec::new(),
            rate_limit: DEFAULT_RATE_LIMIT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            api_key: None,
            custom_parser: None,
        }
    }

    /// Set the section and table-of-contents URL patterns.
    #[must_use]
    pub fn with_patterns(mut self, section: impl Into<String>, toc: impl Into<String>) -> Self {
        self.section_url_pattern = Some(section.into());
        self.toc_url_pattern = Some(toc.into());
        self
    }

    /// Set the HTML content and title locators.
    #[must_use]
    pub fn with_locators(mut self, content: impl Into<String>, title: impl Into<String>) -> Self {
        self.content_locator = Some(content.into());
        self.title_locator = Some(title.into());
        self
    }

    /// Set the HTML history locator.
    #[must_use]
    pub fn with_history_locator(mut self, history: impl Into<String>) -> Self {
        self.history_locator = Some(history.into());
        self
    }

    /// Set the code table.
    #[must_use]
    pub fn with_codes<K, V>(mut self, codes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.codes = codes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set the priority codes.
    #[must_use]
    pub fn with_priority_codes(mut self, codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.priority_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the minimum delay between requests, in seconds.
    #[must_use]
    pub fn with_rate_limit(mut self, seconds: f64) -> Self {
        self.rate_limit = seconds;
        self
    }

    /// Set the retry cap.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the API credential.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Select a non-default parser.
    #[must_use]
    pub fn with_custom_parser(mut self, parser: impl Into<String>) -> Self {
        self.custom_parser = Some(parser.into());
        self
    }

    /// Human-readable name of a code, if the code is known.
    #[must_use]
    pub fn code_name(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    /// Code ids in fetch order: priority codes first, then the rest sorted.
    pub fn codes_by_priority(&self) -> impl Iterator<Item = &str> {
        let rest = self
            .codes
            .keys()
            .filter(|code| !self.priority_codes.contains(*code));
        self.priority_codes
            .iter()
            .chain(rest)
            .map(String::as_str)
    }

    /// Check that a code belongs to this jurisdiction.
    ///
    /// A configuration without a code table accepts any code, since there is
    /// nothing to validate against.
    pub fn ensure_code(&self, code: &str) -> Result<()> {
        if self.codes.is_empty() || self.codes.contains_key(code) {
            Ok(())
        } else {
            Err(HarvesterError::NotFound {
                target: RequestTarget::code(&self.jurisdiction, code),
            })
        }
    }

    /// Check the invariants a configuration must satisfy before registration.
    pub fn validate(&self) -> Result<()> {
        validate_jurisdiction_id(&self.jurisdiction)?;

        let invalid = |message: String| HarvesterError::InvalidConfig {
            jurisdiction: self.jurisdiction.clone(),
            message,
        };

        if !(0.0..=MAX_RATE_LIMIT_SECS).contains(&self.rate_limit) {
            return Err(invalid(format!(
                "rate_limit must be between 0 and {MAX_RATE_LIMIT_SECS} seconds, got {}",
                self.rate_limit
            )));
        }

        if let Some(code) = self
            .priority_codes
            .iter()
            .find(|code| !self.codes.contains_key(*code))
        {
            return Err(invalid(format!(
                "priority code '{code}' is not listed in codes"
            )));
        }

        if matches!(self.source_type, SourceType::Uslm | SourceType::Html)
            && self.section_url_pattern.is_none()
        {
            return Err(invalid(format!(
                "{} sources need a section_url_pattern",
                self.source_type
            )));
        }

        if self.source_type != SourceType::Api && self.base_url.is_empty() {
            let absolute = self
                .section_url_pattern
                .as_deref()
                .is_some_and(|p| p.starts_with("http://") || p.starts_with("https://"));
            if !absolute {
                return Err(invalid("base_url is required for relative URL patterns".to_string()));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("jurisdiction", &self.jurisdiction)
            .field("name", &self.name)
            .field("source_type", &self.source_type)
            .field("base_url", &self.base_url)
            .field("section_url_pattern", &self.section_url_pattern)
            .field("toc_url_pattern", &self.toc_url_pattern)
            .field("content_locator", &self.content_locator)
            .field("title_locator", &self.title_locator)
            .field("history_locator", &self.history_locator)
            .field("codes", &self.codes)
            .field("priority_codes", &self.priority_codes)
            .field("rate_limit", &self.rate_limit)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("custom_parser", &self.custom_parser)
            .finish()
    }
}

/// Discovery record returned by `list_jurisdictions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionSummary {
    pub jurisdiction: String,
    pub name: String,
    pub source_type: SourceType,
    pub codes: Vec<String>,
}

impl From<&SourceConfig> for JurisdictionSummary {
    fn from(config: &SourceConfig) -> Self {
        Self {
            jurisdiction: config.jurisdiction.clone(),
            name: config.name.clone(),
            source_type: config.source_type,
            codes: config.codes.keys().cloned().collect(),
        }
    }
}

/// Raw bytes of a fetched document, before parsing.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// What was requested.
    pub target: RequestTarget,

    /// URL the document was fetched from.
    pub url: String,

    /// Value of the Content-Type header, if any.
    pub content_type: Option<String>,

    /// Response body.
    pub body: Vec<u8>,
}

impl RawDocument {
    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        crate::http::bytes_to_string(&self.body, &self.url)
    }
}

/// A nested subdivision of a section: subsection, paragraph, clause, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    /// Label as printed, without punctuation (e.g. "a", "1", "A", "i").
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Text directly under this subdivision, excluding children.
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Subsection>,
}

/// Smallest addressable unit of statutory text.
///
/// Created fresh per parse and owned by the caller; it holds no reference
/// back into the adapter or parser that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Jurisdiction-specific citation (e.g. "26 U.S.C. § 1", "R.C. 5747.01").
    pub citation: String,

    /// Bare section number (e.g. "1", "5747.01").
    pub section_number: String,

    /// Code the section belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Normalized plain text of the substantive content.
    pub body_text: String,

    /// Ancestor unit identifiers from the root down; `None` where a level is missing.
    #[serde(default)]
    pub hierarchy_path: Vec<Option<String>>,

    /// Amendment and effective-date annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,

    /// Jurisdiction id that produced this section.
    pub source_jurisdiction: String,
}

impl Section {
    /// Create a section with only the required fields set.
    #[must_use]
    pub fn new(
        source_jurisdiction: impl Into<String>,
        citation: impl Into<String>,
        section_number: impl Into<String>,
        body_text: impl Into<String>,
    ) -> Self {
        Self {
            citation: citation.into(),
            section_number: section_number.into(),
            code: None,
            heading: None,
            body_text: body_text.into(),
            hierarchy_path: Vec::new(),
            history: None,
            subsections: Vec::new(),
            effective_date: None,
            source_jurisdiction: source_jurisdiction.into(),
        }
    }

    /// Hierarchy path rendered for display, with "-" for missing levels.
    #[must_use]
    pub fn hierarchy_display(&self) -> String {
        self.hierarchy_path
            .iter()
            .map(|level| level.as_deref().unwrap_or("-"))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ohio() -> SourceConfig {
        SourceConfig::new("us-oh", "Ohio", SourceType::Html, "https://codes.ohio.gov")
            .with_patterns("/section-{section}", "/title-{code}")
            .with_codes([("57", "Taxation"), ("51", "Public Welfare")])
            .with_priority_codes(["57"])
    }

    #[test]
    fn test_source_type_serialization() {
        assert_eq!(serde_json::to_string(&SourceType::Uslm).unwrap(), "\"uslm\"");
        let parsed: SourceType = serde_json::from_str("\"api\"").unwrap();
        assert_eq!(parsed, SourceType::Api);
        assert_eq!(SourceType::default(), SourceType::Html);
    }

    #[test]
    fn test_config_validate_ok() {
        assert!(ohio().validate().is_ok());
    }

    #[test]
    fn test_config_validate_priority_not_in_codes() {
        let config = ohio().with_priority_codes(["99"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'99'"));
    }

    #[test]
    fn test_config_validate_rate_limit() {
        assert!(ohio().with_rate_limit(-1.0).validate().is_err());
        assert!(ohio().with_rate_limit(f64::NAN).validate().is_err());
        assert!(ohio().with_rate_limit(1.0e30).validate().is_err());
        assert!(ohio().with_rate_limit(f64::INFINITY).validate().is_err());
        assert!(ohio().with_rate_limit(0.0).validate().is_ok());
        assert!(ohio().with_rate_limit(3600.0).validate().is_ok());
    }

    #[test]
    fn test_config_validate_html_needs_pattern() {
        let config = SourceConfig::new("us-xx", "X", SourceType::Html, "https://x.gov");
        assert!(config.validate().is_err());

        let api = SourceConfig::new("us-xx", "X", SourceType::Api, "");
        assert!(api.validate().is_ok());
    }

    #[test]
    fn test_ensure_code() {
        let config = ohio();
        assert!(config.ensure_code("57").is_ok());
        let err = config.ensure_code("99").unwrap_err();
        assert!(err.is_not_found());

        let open = SourceConfig::new("us-xx", "X", SourceType::Api, "https://x.gov");
        assert!(open.ensure_code("anything").is_ok());
    }

    #[test]
    fn test_codes_by_priority() {
        let config = ohio().with_codes([("51", "a"), ("57", "b"), ("03", "c")]);
        let order: Vec<&str> = config.codes_by_priority().collect();
        assert_eq!(order, vec!["57", "03", "51"]);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = SourceConfig::new("us-ny", "New York", SourceType::Api, "https://x")
            .with_api_key("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = SourceConfig::new("us-ny", "New York", SourceType::Api, "https://x")
            .with_api_key("super-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_deserialize_legacy_selector_names() {
        let yaml = r#"
jurisdiction: us-ca
name: California
source_type: html
base_url: https://leginfo.legislature.ca.gov
section_url_pattern: /section?law={code}&num={section}
content_selector: "div#codeLawSectionNoHead"
title_selector: h1
codes:
  "RTC": Revenue and Taxation Code
"#;
        let config: SourceConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.content_locator.as_deref(), Some("div#codeLawSectionNoHead"));
        assert_eq!(config.title_locator.as_deref(), Some("h1"));
        assert_eq!(config.rate_limit, DEFAULT_RATE_LIMIT_SECS);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.code_name("RTC"), Some("Revenue and Taxation Code"));
    }

    #[test]
    fn test_summary_from_config() {
        let summary = JurisdictionSummary::from(&ohio());
        assert_eq!(summary.jurisdiction, "us-oh");
        assert_eq!(summary.source_type, SourceType::Html);
        assert_eq!(summary.codes, vec!["51".to_string(), "57".to_string()]);
    }

    #[test]
    fn test_section_hierarchy_display() {
        let mut section = Section::new("us", "26 U.S.C. § 1", "1", "text");
        section.hierarchy_path = vec![Some("26".to_string()), None, Some("1".to_string())];
        assert_eq!(section.hierarchy_display(), "26 > - > 1");
    }
}
