//! USLM (United States Legislative Markup) parser.
//!
//! Extracts every top-level `<section>` of a USLM document. The structural
//! levels above a section are described by [`LevelSpec`]s; each section's
//! `hierarchy_path` has one slot per level down to the deepest level present,
//! with `None` where a level is missing.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};

use super::{ParseContext, ParsedDocument, SectionParser};
use crate::error::Result;
use crate::text::{non_empty, normalize_inline};
use crate::types::{Section, Subsection};
use crate::xml::{collect_text, element_children, find_ancestor, find_child, get_tag_name, has_tag};

/// Structural number with its printed prefix and trailing punctuation.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBER_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:title|subtitle|chapter|subchapter|part|subpart|division|section|sec\.|§+)?\s*(?P<num>[0-9A-Za-z][0-9A-Za-z.\-–]*?)[\s.—–:\-]*$",
    )
    .expect("valid regex")
});

/// Title number inside a USLM identifier such as `/us/usc/t26/s1`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static IDENTIFIER_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/us/usc/t(?P<title>[0-9]+[A-Za-z]?)(?:/|$)").expect("valid regex"));

/// Subdivisions of a section, outermost first.
const SUBDIVISION_TAGS: &[&str] = &[
    "subsection",
    "paragraph",
    "subparagraph",
    "clause",
    "subclause",
    "item",
    "subitem",
];

/// Section children that are not part of the body text.
const NON_BODY_TAGS: &[&str] = &["num", "heading", "sourceCredit", "notes", "note", "toc"];

/// Note topics that carry amendment history.
const HISTORY_NOTE_TOPICS: &[&str] = &["amendments", "effectiveDateOfAmendment", "effectiveDate"];

/// One structural level above a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpec {
    /// Element name (e.g. "chapter").
    pub tag: &'static str,

    /// Whether a section is expected to sit below this level.
    pub required: bool,
}

impl LevelSpec {
    /// A level every section is expected to have.
    #[must_use]
    pub const fn required(tag: &'static str) -> Self {
        Self { tag, required: true }
    }

    /// A level that may be skipped without comment.
    #[must_use]
    pub const fn optional(tag: &'static str) -> Self {
        Self {
            tag,
            required: false,
        }
    }
}

/// Levels of the United States Code, root first.
pub const USC_LEVELS: [LevelSpec; 5] = [
    LevelSpec::required("title"),
    LevelSpec::optional("subtitle"),
    LevelSpec::required("chapter"),
    LevelSpec::optional("subchapter"),
    LevelSpec::optional("part"),
];

/// Parser for USLM XML.
#[derive(Debug, Clone)]
pub struct UslmParser {
    levels: Vec<LevelSpec>,
}

impl UslmParser {
    /// Create a parser for the United States Code levels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: USC_LEVELS.to_vec(),
        }
    }

    /// Create a parser with a custom level list, root first.
    #[must_use]
    pub fn with_levels(levels: Vec<LevelSpec>) -> Self {
        Self { levels }
    }

    fn parse_section(
        &self,
        node: Node<'_, '_>,
        context: &ParseContext,
        out: &mut ParsedDocument,
    ) -> Option<Section> {
        let Some(number) = section_number(node) else {
            let identifier = node.attribute("identifier").unwrap_or("without identifier");
            out.warn(context, format!("skipping section {identifier}: no section number"));
            return None;
        };

        let hierarchy_path = self.hierarchy_path(node, &number, context, out);
        let title = self
            .levels
            .iter()
            .position(|level| level.tag == "title")
            .and_then(|idx| hierarchy_path.get(idx).cloned().flatten())
            .or_else(|| title_from_identifier(node))
            .or_else(|| context.code.clone());

        let citation = match &title {
            Some(title) => format!("{title} U.S.C. § {number}"),
            None => format!("§ {number}"),
        };

        let mut heading = find_child(node, "heading").and_then(|h| non_empty(&collect_text(h, &[])));
        if let Some(status) = node.attribute("status") {
            heading = Some(match heading {
                Some(heading) => format!("{heading} [{status}]"),
                None => format!("[{status}]"),
            });
        }

        let mut lines = Vec::new();
        render_block(node, &mut lines);

        let mut section = Section::new(&context.jurisdiction, citation, number, lines.join("\n"));
        section.code = title;
        section.heading = heading;
        section.hierarchy_path = hierarchy_path;
        section.history = history(node);
        section.subsections = subdivisions(node);
        Some(section)
    }

    fn hierarchy_path(
        &self,
        node: Node<'_, '_>,
        number: &str,
        context: &ParseContext,
        out: &mut ParsedDocument,
    ) -> Vec<Option<String>> {
        let mut slots: Vec<Option<String>> = vec![None; self.levels.len()];
        let mut present = vec![false; self.levels.len()];

        for ancestor in node.ancestors().skip(1).filter(Node::is_element) {
            let tag = get_tag_name(ancestor);
            let Some(idx) = self.levels.iter().position(|level| level.tag == tag) else {
                continue;
            };
            // Nearest ancestor wins
            if present[idx] {
                continue;
            }
            present[idx] = true;
            slots[idx] = level_number(ancestor);
            if slots[idx].is_none() {
                out.warn(context, format!("{tag} above section {number} has no number"));
            }
        }

        let depth = present.iter().rposition(|p| *p).map_or(0, |idx| idx + 1);
        slots.truncate(depth);

        for (level, _) in self.levels[..depth]
            .iter()
            .zip(&present)
            .filter(|(level, present)| level.required && !**present)
        {
            out.warn(
                context,
                format!("section {number} has no enclosing {}", level.tag),
            );
        }

        slots
    }
}

impl Default for UslmParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionParser for UslmParser {
    fn name(&self) -> &str {
        "uslm"
    }

    fn parse(&self, raw: &str, context: &ParseContext) -> Result<ParsedDocument> {
        let doc = parse_document(raw, context)?;
        let mut out = ParsedDocument::new();

        for node in section_nodes(&doc) {
            if let Some(section) = self.parse_section(node, context, &mut out) {
                out.push(section);
            }
        }

        tracing::debug!(
            jurisdiction = %context.jurisdiction,
            sections = out.len(),
            "Parsed USLM document"
        );
        Ok(out)
    }
}

/// Parse USLM text into a DOM, mapping syntax errors to `Parse`.
pub(crate) fn parse_document<'input>(
    raw: &'input str,
    context: &ParseContext,
) -> Result<Document<'input>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(raw, options)
        .map_err(|e| context.parse_error(format!("malformed XML: {e}")))
}

/// Top-level sections in document order.
///
/// Sections quoted inside amendments or nested in another section are
/// content, not sections of this document.
pub(crate) fn section_nodes<'a, 'input>(
    doc: &'a Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants().filter(|n| {
        has_tag(*n, "section") && find_ancestor(*n, &["section", "quotedContent"]).is_none()
    })
}

/// Section number: `num@value`, then the cleaned `<num>` text, then the identifier.
pub(crate) fn section_number(node: Node<'_, '_>) -> Option<String> {
    level_number(node)
}

fn level_number(node: Node<'_, '_>) -> Option<String> {
    if let Some(num) = find_child(node, "num") {
        if let Some(value) = num.attribute("value").and_then(non_empty) {
            return Some(value);
        }
        if let Some(cleaned) = clean_number(&collect_text(num, &[])) {
            return Some(cleaned);
        }
    }
    node.attribute("identifier")
        .and_then(|id| id.rsplit('/').next())
        .map(|last| last.trim_start_matches(|c: char| c.is_ascii_lowercase()))
        .and_then(non_empty)
}

/// Strip a printed prefix ("Title", "§") and trailing punctuation from a number.
fn clean_number(text: &str) -> Option<String> {
    let text = normalize_inline(text);
    if text.is_empty() {
        return None;
    }
    NUMBER_TEXT
        .captures(&text)
        .and_then(|caps| caps.name("num"))
        .map(|m| m.as_str().to_string())
        .or_else(|| non_empty(text.trim_end_matches(['.', '—', '–', ':', '-'])))
}

/// Subdivision label without parentheses.
fn label(node: Node<'_, '_>) -> String {
    let Some(num) = find_child(node, "num") else {
        return String::new();
    };
    if let Some(value) = num.attribute("value").and_then(non_empty) {
        return value;
    }
    normalize_inline(&collect_text(num, &[]))
        .trim_matches(|c: char| matches!(c, '(' | ')' | '.' | ' '))
        .to_string()
}

fn title_from_identifier(node: Node<'_, '_>) -> Option<String> {
    let identifier = node.attribute("identifier")?;
    IDENTIFIER_TITLE
        .captures(identifier)
        .and_then(|caps| caps.name("title"))
        .map(|m| m.as_str().to_string())
}

/// Render body lines, prefixing each subdivision's first line with its label.
fn render_block(node: Node<'_, '_>, lines: &mut Vec<String>) {
    for child in element_children(node) {
        let tag = get_tag_name(child);
        if NON_BODY_TAGS.contains(&tag) {
            continue;
        }

        if SUBDIVISION_TAGS.contains(&tag) {
            let num = find_child(child, "num")
                .map(|n| normalize_inline(&collect_text(n, &[])))
                .unwrap_or_default();
            let heading = find_child(child, "heading")
                .map(|h| normalize_inline(&collect_text(h, &[])))
                .unwrap_or_default();
            let prefix = normalize_inline(&format!("{num} {heading}"));

            let first = lines.len();
            render_block(child, lines);
            if !prefix.is_empty() {
                if let Some(line) = lines.get_mut(first) {
                    *line = format!("{prefix} {line}");
                } else {
                    lines.push(prefix);
                }
            }
            continue;
        }

        let text = normalize_inline(&collect_text(child, &["sourceCredit", "notes"]));
        if !text.is_empty() {
            lines.push(text);
        }
    }
}

fn subdivisions(node: Node<'_, '_>) -> Vec<Subsection> {
    element_children(node)
        .filter(|child| SUBDIVISION_TAGS.contains(&get_tag_name(*child)))
        .map(|child| {
            let own_text = element_children(child)
                .filter(|c| {
                    let tag = get_tag_name(*c);
                    !NON_BODY_TAGS.contains(&tag) && !SUBDIVISION_TAGS.contains(&tag)
                })
                .map(|c| normalize_inline(&collect_text(c, &[])))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            Subsection {
                label: label(child),
                heading: find_child(child, "heading").and_then(|h| non_empty(&collect_text(h, &[]))),
                text: own_text,
                children: subdivisions(child),
            }
        })
        .collect()
}

/// Source credit plus amendment notes.
fn history(node: Node<'_, '_>) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(credit) = find_child(node, "sourceCredit").and_then(|c| non_empty(&collect_text(c, &[]))) {
        parts.push(credit);
    }

    for note in node.descendants().filter(|n| {
        has_tag(*n, "note")
            && n.attribute("topic")
                .is_some_and(|topic| HISTORY_NOTE_TOPICS.contains(&topic))
    }) {
        if let Some(text) = non_empty(&collect_text(note, &[])) {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
