//! Table-of-contents extraction.
//!
//! Each function turns a fetched table-of-contents document into section
//! identifiers in document order, without duplicates. The identifiers are
//! exactly what `fetch_section` accepts for the same jurisdiction.

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use super::uslm::{parse_document, section_nodes, section_number};
use super::ParseContext;
use crate::error::{HarvesterError, RequestTarget, Result};

/// Section identifiers of a USLM title document.
pub fn uslm_section_ids(raw: &str, target: &RequestTarget) -> Result<Vec<String>> {
    let context = context_for(target);
    let doc = parse_document(raw, &context)?;
    Ok(dedup(section_nodes(&doc).filter_map(section_number)))
}

/// Section identifiers linked from an HTML table-of-contents page.
///
/// Links are recognized by the jurisdiction's section URL pattern: every
/// `href` that fits the pattern for `code` contributes its `{section}` value.
pub fn html_section_ids(
    raw: &str,
    section_url_pattern: &str,
    code: &str,
    target: &RequestTarget,
) -> Result<Vec<String>> {
    let link = link_pattern(section_url_pattern, code).map_err(|e| HarvesterError::Parse {
        target: target.clone(),
        message: format!("cannot match links against '{section_url_pattern}': {e}"),
    })?;

    let document = Html::parse_document(raw);
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Ok(Vec::new());
    };

    let ids = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            link.captures(href)
                .and_then(|caps| caps.name("section"))
                .map(|m| m.as_str().to_string())
        });
    Ok(dedup(ids))
}

/// Section identifiers from a JSON listing.
///
/// Accepts an array of strings or of objects carrying `section_id`,
/// `section` or `id`, optionally wrapped in `sections`, `items` or `result`.
pub fn json_section_ids(raw: &str, target: &RequestTarget) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| HarvesterError::Parse {
        target: target.clone(),
        message: format!("invalid JSON table of contents: {e}"),
    })?;

    let Some(items) = listing(&value) else {
        return Err(HarvesterError::Parse {
            target: target.clone(),
            message: "table of contents is not a list of sections".to_string(),
        });
    };

    let ids = items.iter().filter_map(|item| match item {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => ["section_id", "section", "id"]
            .iter()
            .find_map(|key| match item.get(*key)? {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        _ => None,
    });
    Ok(dedup(ids.filter(|id| !id.is_empty())))
}

fn listing(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["sections", "items", "result"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(listing),
        _ => None,
    }
}

/// Build a regex matching links to sections of `code`.
///
/// Only the path part of an absolute pattern is used, so links may be
/// relative or absolute.
fn link_pattern(section_url_pattern: &str, code: &str) -> std::result::Result<Regex, regex::Error> {
    let path = strip_origin(section_url_pattern);

    let mut pattern = String::new();
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            break;
        };
        pattern.push_str(&regex::escape(&rest[..open]));
        match &rest[open + 1..close] {
            "section" => pattern.push_str(r#"(?P<section>[^&?#"'\s]+?)"#),
            "code" => pattern.push_str(&regex::escape(code)),
            _ => pattern.push_str(r"[^/&?#]+"),
        }
        rest = &rest[close + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push_str(r"(?:$|[&#])");

    Regex::new(&pattern)
}

fn strip_origin(pattern: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = pattern.strip_prefix(scheme) {
            return rest.find('/').map_or("", |idx| &rest[idx..]);
        }
    }
    pattern
}

fn dedup(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.clone())).collect()
}

fn context_for(target: &RequestTarget) -> ParseContext {
    ParseContext {
        jurisdiction: target.jurisdiction.clone(),
        code: target.code.clone(),
        section_id: target.section.clone(),
        ..ParseContext::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target() -> RequestTarget {
        RequestTarget::code("us-nc", "105")
    }

    #[test]
    fn test_html_links_in_order_without_duplicates() {
        let page = r#"<html><body>
            <a href="/EnactedLegislation/Statutes/HTML/BySection/Chapter_105/GS_105-1.html">§ 105-1</a>
            <a href="https://www.ncleg.gov/EnactedLegislation/Statutes/HTML/BySection/Chapter_105/GS_105-130.3.html">§ 105-130.3</a>
            <a href="/EnactedLegislation/Statutes/HTML/BySection/Chapter_105/GS_105-1.html">again</a>
            <a href="/EnactedLegislation/Statutes/HTML/BySection/Chapter_108A/GS_108A-1.html">other chapter</a>
            <a href="/Laws/Home">unrelated</a>
        </body></html>"#;
        let ids = html_section_ids(
            page,
            "/EnactedLegislation/Statutes/HTML/BySection/Chapter_{code}/GS_{section}.html",
            "105",
            &target(),
        )
        .unwrap();
        assert_eq!(ids, vec!["105-1", "105-130.3"]);
    }

    #[test]
    fn test_html_query_string_pattern() {
        let page = r#"<a href="/statutes/consolidated/view-statute?txtType=HTM&amp;ttl=72&amp;sctn=8101">8101</a>
            <a href="/statutes/consolidated/view-statute?txtType=HTM&amp;ttl=72&amp;sctn=8102&amp;subsctn=0">8102</a>"#;
        let ids = html_section_ids(
            page,
            "https://www.palegis.us/statutes/consolidated/view-statute?txtType=HTM&ttl={code}&sctn={section}",
            "72",
            &RequestTarget::code("us-pa", "72"),
        )
        .unwrap();
        assert_eq!(ids, vec!["8101", "8102"]);
    }

    #[test]
    fn test_html_trailing_placeholder() {
        let page = r#"<a href="/ohio-revised-code/section-5747.01">5747.01</a><a href="/ohio-revised-code/chapter-5747">chapter</a>"#;
        let ids = html_section_ids(
            page,
            "/ohio-revised-code/section-{section}",
            "57",
            &RequestTarget::code("us-oh", "57"),
        )
        .unwrap();
        assert_eq!(ids, vec!["5747.01"]);
    }

    #[test]
    fn test_uslm_ids() {
        let xml = r#"<uscDoc><title><chapter>
            <section><num value="1">§ 1.</num></section>
            <section><num>§ 2.</num></section>
            <section><num value="1">§ 1.</num></section>
        </chapter></title></uscDoc>"#;
        let ids = uslm_section_ids(xml, &RequestTarget::code("us", "26")).unwrap();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_uslm_malformed() {
        let err = uslm_section_ids("<uscDoc>", &RequestTarget::code("us", "26")).unwrap_err();
        assert!(matches!(err, HarvesterError::Parse { .. }));
    }

    #[test]
    fn test_json_listings() {
        let target = RequestTarget::code("us-xx", "1");
        assert_eq!(json_section_ids(r#"["1", "2", "1"]"#, &target).unwrap(), vec!["1", "2"]);
        assert_eq!(
            json_section_ids(r#"{"sections": [{"section_id": "a"}, {"id": 7}]}"#, &target).unwrap(),
            vec!["a", "7"]
        );
        assert!(json_section_ids(r#"{"count": 2}"#, &target).is_err());
        assert!(json_section_ids("nope", &target).is_err());
    }
}
