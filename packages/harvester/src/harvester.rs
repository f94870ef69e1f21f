//! Convenience pipeline tying registry, adapters and parsers together.
//!
//! Requests for one jurisdiction run serially through a single adapter, so
//! its rate limit holds; different jurisdictions run on their own threads.

use std::collections::BTreeMap;
use std::thread;

use crate::error::{HarvesterError, RequestTarget, Result};
use crate::parser::{parser_for, ParseContext, ParsedDocument, SectionParser};
use crate::registry::{self, SourceRegistry};
use crate::sources::StatuteSource;
use crate::types::Section;

/// Fetch and parse one section through the process-wide registry.
pub fn harvest_section(jurisdiction: &str, code: &str, section_id: &str) -> Result<ParsedDocument> {
    harvest_section_with(registry::global(), jurisdiction, code, section_id)
}

/// Fetch and parse one section through the given registry.
pub fn harvest_section_with(
    registry: &SourceRegistry,
    jurisdiction: &str,
    code: &str,
    section_id: &str,
) -> Result<ParsedDocument> {
    let source = registry.get_source(jurisdiction)?;
    let parser = parser_for(source.config())?;
    fetch_and_parse(source.as_ref(), parser, code, section_id)
}

fn fetch_and_parse(
    source: &dyn StatuteSource,
    parser: &dyn SectionParser,
    code: &str,
    section_id: &str,
) -> Result<ParsedDocument> {
    let raw = source.fetch_section(code, section_id)?;
    let context = ParseContext::from_config(source.config())
        .with_code(code)
        .with_section(section_id);
    tracing::debug!(request = %raw.target, parser = parser.name(), "Parsing section");
    parser.parse(&raw.text(), &context)
}

/// Result of harvesting one code.
#[derive(Debug, Default)]
pub struct CodeHarvest {
    pub jurisdiction: String,
    pub code: String,

    /// Parsed sections in table-of-contents order.
    pub sections: Vec<Section>,

    /// Parser diagnostics, prefixed with the section they came from.
    pub warnings: Vec<String>,

    /// Sections that could not be fetched or parsed.
    pub failures: Vec<(String, HarvesterError)>,
}

impl CodeHarvest {
    fn new(jurisdiction: &str, code: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            code: code.to_string(),
            ..Self::default()
        }
    }
}

/// Harvest a code section by section, serially through one adapter.
///
/// `limit` caps the number of sections taken from the table of contents.
/// A failing section is recorded and the walk continues, except for
/// authentication failures and cancellation, which end the walk.
pub fn harvest_code(
    source: &dyn StatuteSource,
    parser: &dyn SectionParser,
    code: &str,
    limit: Option<usize>,
) -> Result<CodeHarvest> {
    let mut toc = source.fetch_table_of_contents(code)?;
    if let Some(limit) = limit {
        toc.truncate(limit);
    }
    tracing::debug!(
        jurisdiction = source.jurisdiction(),
        code,
        sections = toc.len(),
        "Harvesting code"
    );

    let mut harvest = CodeHarvest::new(source.jurisdiction(), code);
    for section_id in toc {
        match fetch_and_parse(source, parser, code, &section_id) {
            Ok(parsed) => {
                let (sections, warnings) = parsed.into_parts();
                harvest
                    .warnings
                    .extend(warnings.into_iter().map(|w| format!("{section_id}: {w}")));
                harvest.sections.extend(sections);
            }
            Err(e @ (HarvesterError::Auth { .. } | HarvesterError::Cancelled { .. })) => {
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(code, section = %section_id, error = %e, "Skipping section");
                harvest.failures.push((section_id, e));
            }
        }
    }

    Ok(harvest)
}

/// One unit of work for [`harvest_jurisdictions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    pub jurisdiction: String,
    pub code: String,
    pub limit: Option<usize>,
}

impl HarvestRequest {
    #[must_use]
    pub fn new(jurisdiction: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            code: code.into(),
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Run many code harvests: one thread per jurisdiction, serial within one.
///
/// Results come back in request order. A jurisdiction whose adapter or
/// parser cannot be built fails every request naming it.
pub fn harvest_jurisdictions(
    registry: &SourceRegistry,
    requests: &[HarvestRequest],
) -> Vec<Result<CodeHarvest>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, request) in requests.iter().enumerate() {
        groups
            .entry(request.jurisdiction.to_lowercase())
            .or_default()
            .push(index);
    }

    let mut results: Vec<Option<Result<CodeHarvest>>> = requests.iter().map(|_| None).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = groups
            .into_iter()
            .map(|(jurisdiction, indices)| {
                scope.spawn(move || {
                    let outcomes = harvest_group(registry, &jurisdiction, &indices, requests);
                    indices.into_iter().zip(outcomes).collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(outcomes) => {
                    for (index, outcome) in outcomes {
                        results[index] = Some(outcome);
                    }
                }
                Err(_) => tracing::error!("Harvest worker panicked"),
            }
        }
    });

    results
        .into_iter()
        .zip(requests)
        .map(|(result, request)| {
            result.unwrap_or_else(|| {
                Err(HarvesterError::Cancelled {
                    target: RequestTarget::code(&request.jurisdiction, &request.code),
                })
            })
        })
        .collect()
}

fn harvest_group(
    registry: &SourceRegistry,
    jurisdiction: &str,
    indices: &[usize],
    requests: &[HarvestRequest],
) -> Vec<Result<CodeHarvest>> {
    let source = match registry.get_source(jurisdiction) {
        Ok(source) => source,
        Err(e) => return indices.iter().map(|_| Err(clone_setup_error(&e))).collect(),
    };
    let parser = match parser_for(source.config()) {
        Ok(parser) => parser,
        Err(e) => return indices.iter().map(|_| Err(clone_setup_error(&e))).collect(),
    };

    indices
        .iter()
        .map(|&index| {
            let request = &requests[index];
            harvest_code(source.as_ref(), parser, &request.code, request.limit)
        })
        .collect()
}

/// Rebuild a setup error for every request sharing it.
///
/// Setup only fails with configuration-level variants, which hold plain data.
fn clone_setup_error(error: &HarvesterError) -> HarvesterError {
    match error {
        HarvesterError::ConfigNotFound { jurisdiction } => HarvesterError::ConfigNotFound {
            jurisdiction: jurisdiction.clone(),
        },
        HarvesterError::Unsupported {
            jurisdiction,
            message,
        } => HarvesterError::Unsupported {
            jurisdiction: jurisdiction.clone(),
            message: message.clone(),
        },
        HarvesterError::InvalidConfig {
            jurisdiction,
            message,
        } => HarvesterError::InvalidConfig {
            jurisdiction: jurisdiction.clone(),
            message: message.clone(),
        },
        other => HarvesterError::InvalidConfig {
            jurisdiction: other
                .target()
                .map(|t| t.jurisdiction.clone())
                .unwrap_or_default(),
            message: other.to_string(),
        },
    }
}
