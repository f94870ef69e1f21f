//! JSON API response parsers.
//!
//! `JsonApiParser` reads the loose shape most statute APIs share: one object
//! (or a list of objects) per section with a number, a heading and a text
//! field under one of several common names. `NyLawsParser` reads the New
//! York Open Legislation law document format.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::{ParseContext, ParsedDocument, SectionParser};
use crate::error::Result;
use crate::text::{non_empty, normalize_block};
use crate::types::Section;

const NUMBER_FIELDS: &[&str] = &["section_id", "section", "sectionNumber", "number", "id"];
const HEADING_FIELDS: &[&str] = &["heading", "title", "caption"];
const TEXT_FIELDS: &[&str] = &["text", "body", "content"];
const HISTORY_FIELDS: &[&str] = &["history", "source_credit", "sourceCredit"];
const DATE_FIELDS: &[&str] = &["effective_date", "effectiveDate", "activeDate"];

/// Wrapper keys under which APIs nest their payload.
const WRAPPER_FIELDS: &[&str] = &["sections", "items", "result", "data"];

/// Parser for generic JSON section payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiParser;

impl SectionParser for JsonApiParser {
    fn name(&self) -> &str {
        "json"
    }

    fn parse(&self, raw: &str, context: &ParseContext) -> Result<ParsedDocument> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| context.parse_error(format!("invalid JSON: {e}")))?;

        let mut out = ParsedDocument::new();
        for record in section_records(&value) {
            let Some(number) = first_string(record, NUMBER_FIELDS) else {
                out.warn(context, "skipping record without a section number");
                continue;
            };

            let citation = match &context.code {
                Some(code) => format!("{code} § {number}"),
                None => format!("§ {number}"),
            };
            let body = first_string(record, TEXT_FIELDS).unwrap_or_default();

            let mut section = Section::new(&context.jurisdiction, citation, number, normalize_block(&body));
            section.code.clone_from(&context.code);
            section.heading = first_string(record, HEADING_FIELDS).and_then(|h| non_empty(&h));
            section.history = first_string(record, HISTORY_FIELDS).and_then(|h| non_empty(&h));
            section.effective_date = first_string(record, DATE_FIELDS).and_then(|d| parse_date(&d));
            section.hierarchy_path = context.code.iter().cloned().map(Some).collect();
            out.push(section);
        }

        Ok(out)
    }
}

/// Objects that describe sections, unwrapping common envelopes.
fn section_records(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| v.is_object()).collect(),
        Value::Object(map) => {
            if first_string(value, NUMBER_FIELDS).is_some() {
                return vec![value];
            }
            WRAPPER_FIELDS
                .iter()
                .find_map(|key| map.get(*key))
                .map(section_records)
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// First field present as a string or number.
fn first_string(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match value.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse an ISO date, ignoring any time part.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// New York Open Legislation law document response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<NyLawDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NyLawDocument {
    law_id: String,
    location_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    active_date: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Parser for New York Open Legislation law documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct NyLawsParser;

impl SectionParser for NyLawsParser {
    fn name(&self) -> &str {
        "ny-laws"
    }

    fn parse(&self, raw: &str, context: &ParseContext) -> Result<ParsedDocument> {
        let response: NyResponse = serde_json::from_str(raw)
            .map_err(|e| context.parse_error(format!("unexpected law document: {e}")))?;

        if !response.success {
            return Err(context.parse_error(format!(
                "API reported failure: {}",
                response.message.as_deref().unwrap_or("no message")
            )));
        }

        let mut out = ParsedDocument::new();
        let Some(doc) = response.result else {
            out.warn(context, "response has no law document");
            return Ok(out);
        };

        if let Some(doc_type) = doc.doc_type.as_deref().filter(|t| *t != "SECTION") {
            out.warn(
                context,
                format!("law document {} is a {doc_type}, not a section", doc.location_id),
            );
        }

        let mut section = Section::new(
            &context.jurisdiction,
            format!("N.Y. {} Law § {}", doc.law_id, doc.location_id),
            doc.location_id,
            normalize_block(doc.text.as_deref().unwrap_or_default()),
        );
        section.code = Some(doc.law_id.clone());
        section.heading = doc.title.as_deref().and_then(non_empty);
        section.effective_date = doc.active_date.as_deref().and_then(parse_date);
        section.hierarchy_path = vec![Some(doc.law_id)];
        out.push(section);

        Ok(out)
    }
}
