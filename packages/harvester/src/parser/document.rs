//! Parse context and parse output.

use crate::error::{HarvesterError, RequestTarget};
use crate::types::{Section, SourceConfig};

/// What a parser knows about the document it is given.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    /// Jurisdiction that produced the document.
    pub jurisdiction: String,

    /// Code the document belongs to, when known.
    pub code: Option<String>,

    /// Section that was requested, when known.
    pub section_id: Option<String>,

    /// CSS selector list for the content block (HTML only).
    pub content_locator: Option<String>,

    /// CSS selector list for the page title (HTML only).
    pub title_locator: Option<String>,

    /// CSS selector list for amendment history (HTML only).
    pub history_locator: Option<String>,
}

impl ParseContext {
    /// Create a context carrying only the jurisdiction.
    #[must_use]
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            ..Self::default()
        }
    }

    /// Create a context from a source configuration, copying its locators.
    #[must_use]
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            jurisdiction: config.jurisdiction.clone(),
            code: None,
            section_id: None,
            content_locator: config.content_locator.clone(),
            title_locator: config.title_locator.clone(),
            history_locator: config.history_locator.clone(),
        }
    }

    /// Set the code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the requested section.
    #[must_use]
    pub fn with_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    /// Request coordinates for error reporting.
    #[must_use]
    pub fn target(&self) -> RequestTarget {
        RequestTarget {
            jurisdiction: self.jurisdiction.clone(),
            code: self.code.clone(),
            section: self.section_id.clone(),
        }
    }

    /// Build a `Parse` error for this document.
    #[must_use]
    pub fn parse_error(&self, message: impl Into<String>) -> HarvesterError {
        HarvesterError::Parse {
            target: self.target(),
            message: message.into(),
        }
    }
}

/// Sections parsed from one document plus non-fatal diagnostics.
///
/// Consumed by value: iterating hands the sections to the caller once,
/// in document order.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    sections: Vec<Section>,
    warnings: Vec<String>,
}

impl ParsedDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section.
    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Record a non-fatal diagnostic and log it.
    pub fn warn(&mut self, context: &ParseContext, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(
            jurisdiction = %context.jurisdiction,
            code = context.code.as_deref().unwrap_or("-"),
            "{message}"
        );
        self.warnings.push(message);
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Split into sections and warnings.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Section>, Vec<String>) {
        (self.sections, self.warnings)
    }
}

impl IntoIterator for ParsedDocument {
    type Item = Section;
    type IntoIter = std::vec::IntoIter<Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}
