//! Configuration constants and validation functions for the harvester.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{HarvesterError, RequestTarget, Result};

/// HTTP timeout in seconds.
///
/// Set to 30 seconds to accommodate full-title XML documents and slow state sites.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default minimum delay between two requests to the same source, in seconds.
pub const DEFAULT_RATE_LIMIT_SECS: f64 = 0.5;

/// Largest accepted `rate_limit`, in seconds.
pub const MAX_RATE_LIMIT_SECS: f64 = 3600.0;

/// Default number of retries after the first attempt for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound on a single backoff wait (milliseconds).
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Overlay directory used when `SOURCES_DIR_ENV` is not set.
pub const DEFAULT_SOURCES_DIR: &str = "sources";

/// Environment variable pointing at the overlay configuration directory.
pub const SOURCES_DIR_ENV: &str = "STATUTE_SOURCES_DIR";

/// Environment variable holding the NY Open Legislation API key.
pub const NY_API_KEY_ENV: &str = "NY_LEGISLATION_API_KEY";

/// Jurisdiction id pattern: lowercase words joined by dashes ("us", "us-ca").
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static JURISDICTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Placeholder in a URL pattern, e.g. `{section}`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

/// Validate a jurisdiction id.
///
/// # Examples
/// ```
/// use statute_harvester::config::validate_jurisdiction_id;
///
/// assert!(validate_jurisdiction_id("us-ca").is_ok());
/// assert!(validate_jurisdiction_id("US CA").is_err());
/// ```
pub fn validate_jurisdiction_id(jurisdiction: &str) -> Result<()> {
    if JURISDICTION_PATTERN.is_match(jurisdiction) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidConfig {
            jurisdiction: jurisdiction.to_string(),
            message: "jurisdiction id must be lowercase words joined by '-'".to_string(),
        })
    }
}

/// Validate a section identifier before it is substituted into a URL.
///
/// Identifiers may contain dots, dashes, slashes and colons (e.g. "105-130.3",
/// "5/201"), but never whitespace or URL delimiters. An unusable identifier
/// cannot name an existing section, so it is reported as `NotFound`.
pub fn validate_section_id(target: &RequestTarget, section_id: &str) -> Result<()> {
    let valid = !section_id.is_empty()
        && section_id
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '?' | '#' | '&' | '='));
    if valid {
        Ok(())
    } else {
        Err(HarvesterError::NotFound {
            target: target.clone(),
        })
    }
}

/// Substitute placeholders in a URL pattern.
///
/// Every `{name}` in the pattern must have a value in `values`; anything left
/// over means this jurisdiction needs identifiers the fetch contract cannot
/// supply, which is reported as `Unsupported`.
///
/// # Examples
/// ```
/// use statute_harvester::config::expand_pattern;
///
/// let url = expand_pattern("us-oh", "/section-{section}", &[("section", "5747.01")]).unwrap();
/// assert_eq!(url, "/section-5747.01");
/// ```
pub fn expand_pattern(jurisdiction: &str, pattern: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut missing: Option<String> = None;
    let expanded = PLACEHOLDER_PATTERN.replace_all(pattern, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => (*value).to_string(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
        }
    });

    match missing {
        Some(name) => Err(HarvesterError::Unsupported {
            jurisdiction: jurisdiction.to_string(),
            message: format!("URL pattern '{pattern}' needs a value for {{{name}}}"),
        }),
        None => Ok(expanded.into_owned()),
    }
}

/// Join a base URL and a (possibly relative) path.
///
/// Absolute paths are returned unchanged.
///
/// # Examples
/// ```
/// use statute_harvester::config::join_url;
///
/// assert_eq!(join_url("https://codes.ohio.gov/", "/x"), "https://codes.ohio.gov/x");
/// assert_eq!(join_url("https://a.gov", "https://b.gov/y"), "https://b.gov/y");
/// ```
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    if path.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
