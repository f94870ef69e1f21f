//! HTML statute page parser.
//!
//! Pages are reduced to block-aware text lines inside the content locator,
//! then segmented wherever a line matches the style's section-opening
//! pattern. Locators are comma-separated CSS selector lists tried in order.

mod styles;

pub use styles::{CitationStyle, STYLES};

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use super::{ParseContext, ParsedDocument, SectionParser};
use crate::error::Result;
use crate::text::{non_empty, normalize_block, normalize_inline};
use crate::types::Section;

/// Lines that belong to a section's history rather than its body.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HISTORY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:History:|Amended by|Added by|Effective(?:\s+date)?[:\s])").expect("valid regex")
});

/// Elements whose content never contributes statute text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer", "form"];

/// Elements that start a new text line.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th", "section",
    "article", "main", "table", "dd", "dt", "blockquote", "pre", "ul", "ol", "hr",
];

/// Parser for one HTML citation style.
#[derive(Debug, Clone, Copy)]
pub struct HtmlParser {
    style: &'static CitationStyle,
}

impl HtmlParser {
    #[must_use]
    pub fn new(style: &'static CitationStyle) -> Self {
        Self { style }
    }
}

/// Section under construction while walking lines.
struct PendingSection {
    number: String,
    heading: Option<String>,
    body: Vec<String>,
    history: Vec<String>,
}

impl SectionParser for HtmlParser {
    fn name(&self) -> &str {
        self.style.id
    }

    fn parse(&self, raw: &str, context: &ParseContext) -> Result<ParsedDocument> {
        let document = Html::parse_document(raw);
        let mut out = ParsedDocument::new();

        let content = match context.content_locator.as_deref() {
            Some(locator) => match select_first(&document, locator, context, &mut out) {
                Some(element) => Some(element),
                None => {
                    out.warn(
                        context,
                        format!("content locator '{locator}' matched nothing, using page body"),
                    );
                    None
                }
            },
            None => None,
        };
        let content = content.unwrap_or_else(|| body_or_root(&document));

        let history_elements = match context.history_locator.as_deref() {
            Some(locator) => select_all(&document, locator, context, &mut out),
            None => Vec::new(),
        };
        let page_history: Vec<String> = history_elements
            .iter()
            .filter_map(|e| non_empty(&e.text().collect::<String>()))
            .collect();

        let page_title = context
            .title_locator
            .as_deref()
            .and_then(|locator| select_first(&document, locator, context, &mut out))
            .and_then(|e| non_empty(&e.text().collect::<String>()));

        let mut lines = Vec::new();
        let mut current = String::new();
        collect_lines(content, &history_elements, &mut current, &mut lines);
        flush_line(&mut current, &mut lines);

        let pending = self.segment(&lines);
        if pending.is_empty() {
            out.warn(context, "no section headings recognized on page");
            return Ok(out);
        }

        let single = pending.len() == 1;
        for section in pending {
            let mut heading = section.heading;
            if heading.is_none() && single {
                heading.clone_from(&page_title);
            }

            let mut history = section.history;
            history.extend(page_history.iter().cloned());

            let citation =
                self.style
                    .citation(&section.number, context.code.as_deref(), &context.jurisdiction);
            let mut parsed = Section::new(
                &context.jurisdiction,
                citation,
                section.number,
                normalize_block(&section.body.join("\n")),
            );
            parsed.code.clone_from(&context.code);
            parsed.heading = heading;
            parsed.hierarchy_path = context.code.iter().cloned().map(Some).collect();
            parsed.history = non_empty_block(&history.join("\n"));
            out.push(parsed);
        }

        tracing::debug!(
            jurisdiction = %context.jurisdiction,
            parser = self.style.id,
            sections = out.len(),
            "Parsed HTML page"
        );
        Ok(out)
    }
}

impl HtmlParser {
    /// Split text lines into sections at each section-opening line.
    ///
    /// Lines before the first opening line are page chrome and dropped.
    fn segment(&self, lines: &[String]) -> Vec<PendingSection> {
        let mut sections: Vec<PendingSection> = Vec::new();

        for line in lines {
            if let Some(caps) = self.style.heading.captures(line) {
                let heading = caps
                    .name("heading")
                    .and_then(|m| non_empty(m.as_str()))
                    .map(|h| h.trim_end_matches('.').to_string());
                let body = caps
                    .name("text")
                    .and_then(|m| non_empty(m.as_str()))
                    .into_iter()
                    .collect();
                sections.push(PendingSection {
                    number: caps["num"].to_string(),
                    heading,
                    body,
                    history: Vec::new(),
                });
                continue;
            }

            let Some(section) = sections.last_mut() else {
                continue;
            };
            if HISTORY_LINE.is_match(line) {
                section.history.push(line.clone());
            } else {
                section.body.push(line.clone());
            }
        }

        sections
    }
}

fn non_empty_block(text: &str) -> Option<String> {
    let normalized = normalize_block(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Parse a comma-separated selector list, skipping invalid entries.
fn parse_selectors(locator: &str, context: &ParseContext, out: &mut ParsedDocument) -> Vec<Selector> {
    locator
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                out.warn(context, format!("invalid CSS selector '{s}': {e}"));
                None
            }
        })
        .collect()
}

/// First element matched by the first selector in the list that matches anything.
fn select_first<'a>(
    document: &'a Html,
    locator: &str,
    context: &ParseContext,
    out: &mut ParsedDocument,
) -> Option<ElementRef<'a>> {
    parse_selectors(locator, context, out)
        .iter()
        .find_map(|selector| document.select(selector).next())
}

/// All elements matched by the first selector in the list that matches anything.
fn select_all<'a>(
    document: &'a Html,
    locator: &str,
    context: &ParseContext,
    out: &mut ParsedDocument,
) -> Vec<ElementRef<'a>> {
    parse_selectors(locator, context, out)
        .iter()
        .map(|selector| document.select(selector).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}

/// Walk an element, emitting one line per block of text.
///
/// Subtrees rooted at any element in `skip` are left out.
fn collect_lines(
    element: ElementRef<'_>,
    skip: &[ElementRef<'_>],
    current: &mut String,
    lines: &mut Vec<String>,
) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.contains(&child_element) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    flush_line(current, lines);
                }
                collect_lines(child_element, skip, current, lines);
                if block {
                    flush_line(current, lines);
                }
            }
            _ => {}
        }
    }
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    let line = normalize_inline(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser_for;
    use crate::types::{SourceConfig, SourceType};
    use pretty_assertions::assert_eq;

    fn style(id: &str) -> HtmlParser {
        HtmlParser::new(STYLES.iter().find(|s| s.id == id).unwrap())
    }

    const OHIO_PAGE: &str = r#"<html><head><title>Section 5747.01 - Ohio Revised Code</title></head>
<body>
  <nav><a href="/">Home</a></nav>
  <main>
    <h1>Section 5747.01 | Definitions.</h1>
    <p>Except as otherwise expressly provided or clearly appearing from the context, any term used in this chapter has the same meaning as when used in a comparable context in the Internal Revenue Code.</p>
    <p>As used in this section and <a href="section-5747.02">section 5747.02</a> of the Revised Code:</p>
    <p>(A) "Adjusted gross income" means federal adjusted gross income.</p>
    <div class="history">Amended by 135th General Assembly File No. TBD, HB 33, §101.01, eff. 10/3/2023.</div>
  </main>
  <footer>Ohio Laws</footer>
</body></html>"#;

    #[test]
    fn test_ohio_single_section() {
        let context = ParseContext::new("us-oh")
            .with_code("57")
            .with_section("5747.01");
        let context = ParseContext {
            content_locator: Some("main".to_string()),
            title_locator: Some("title".to_string()),
            history_locator: Some("div.history".to_string()),
            ..context
        };

        let doc = style("html-oh").parse(OHIO_PAGE, &context).unwrap();
        assert!(doc.warnings().is_empty(), "{:?}", doc.warnings());
        let sections: Vec<Section> = doc.into_iter().collect();
        assert_eq!(sections.len(), 1);

        let section = &sections[0];
        assert_eq!(section.citation, "R.C. 5747.01");
        assert_eq!(section.section_number, "5747.01");
        assert_eq!(section.heading.as_deref(), Some("Definitions"));
        assert_eq!(section.hierarchy_path, vec![Some("57".to_string())]);
        assert!(section.body_text.starts_with("Except as otherwise expressly provided"));
        assert!(section.body_text.contains("As used in this section and section 5747.02 of the Revised Code:"));
        assert!(section.body_text.contains("\n(A) \"Adjusted gross income\""));
        assert!(!section.body_text.contains("Amended by"));
        assert!(!section.body_text.contains("Ohio Laws"));
        assert_eq!(
            section.history.as_deref(),
            Some("Amended by 135th General Assembly File No. TBD, HB 33, §101.01, eff. 10/3/2023.")
        );
    }

    #[test]
    fn test_multiple_sections_on_one_page() {
        let page = r#"<html><body><div id="content">
            <p>Chapter 105. Taxation.</p>
            <p>§ 105-130.1.  Purpose.</p>
            <p>The purpose of this Part is to impose a tax.</p>
            <p>History: 1939, c. 158, s. 310.</p>
            <p>§ 105-130.2.  Definitions.</p>
            <p>The following definitions apply in this Part:</p>
            <p>(1) Code. - The Internal Revenue Code.</p>
        </div></body></html>"#;
        let context = ParseContext {
            content_locator: Some("div.missing, div#content".to_string()),
            ..ParseContext::new("us-nc").with_code("105")
        };

        let doc = style("html-nc").parse(page, &context).unwrap();
        assert!(doc.warnings().is_empty(), "{:?}", doc.warnings());
        let sections: Vec<Section> = doc.into_iter().collect();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].citation, "N.C.G.S. § 105-130.1");
        assert_eq!(sections[0].heading.as_deref(), Some("Purpose"));
        assert_eq!(sections[0].body_text, "The purpose of this Part is to impose a tax.");
        assert_eq!(sections[0].history.as_deref(), Some("History: 1939, c. 158, s. 310."));
        assert_eq!(sections[1].section_number, "105-130.2");
        assert_eq!(
            sections[1].body_text,
            "The following definitions apply in this Part:\n(1) Code. - The Internal Revenue Code."
        );
        assert_eq!(sections[1].history, None);
    }

    #[test]
    fn test_unmatched_content_locator_falls_back_to_body() {
        let page = "<html><body><p>§ 8101. Short title.</p><p>This part may be cited as the Tax Reform Code.</p></body></html>";
        let context = ParseContext {
            content_locator: Some("div.statute-content".to_string()),
            ..ParseContext::new("us-pa").with_code("72")
        };

        let doc = style("html-pa").parse(page, &context).unwrap();
        assert_eq!(doc.warnings().len(), 1);
        assert!(doc.warnings()[0].contains("matched nothing"));
        assert_eq!(doc.sections()[0].citation, "72 Pa.C.S. § 8101");
        assert_eq!(doc.sections()[0].heading.as_deref(), Some("Short title"));
    }

    #[test]
    fn test_page_title_used_when_heading_missing() {
        let page = r#"<html><head><title>RTC 17041</title></head><body>
            <div id="codeLawSectionNoHead"><h6>17041.</h6><p>(a) There shall be imposed for each taxable year a tax.</p></div>
        </body></html>"#;
        let context = ParseContext {
            content_locator: Some("div#codeLawSectionNoHead".to_string()),
            title_locator: Some("title".to_string()),
            ..ParseContext::new("us-ca").with_code("RTC")
        };

        let doc = style("html-ca").parse(page, &context).unwrap();
        let section = doc.into_iter().next().unwrap();
        assert_eq!(section.citation, "Cal. RTC § 17041");
        assert_eq!(section.heading.as_deref(), Some("RTC 17041"));
        assert_eq!(section.body_text, "(a) There shall be imposed for each taxable year a tax.");
    }

    #[test]
    fn test_page_without_sections_is_empty() {
        let page = "<html><body><p>Page not available.</p></body></html>";
        let doc = style("html").parse(page, &ParseContext::new("us-wy")).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.warnings().len(), 1);
    }

    #[test]
    fn test_invalid_selector_is_reported_and_skipped() {
        let page = "<html><body><main><p>§ 48-7-20. Individual tax rates.</p><p>A tax is imposed.</p></main></body></html>";
        let context = ParseContext {
            content_locator: Some("main[, main".to_string()),
            ..ParseContext::new("us-ga").with_code("48")
        };
        let doc = style("html-ga").parse(page, &context).unwrap();
        assert!(doc.warnings().iter().any(|w| w.contains("invalid CSS selector")));
        assert_eq!(doc.sections()[0].citation, "O.C.G.A. § 48-7-20");
    }

    #[test]
    fn test_selected_through_registry() {
        let config = SourceConfig::new("us-oh", "Ohio", SourceType::Html, "https://codes.ohio.gov")
            .with_patterns("/section-{section}", "/title-{code}")
            .with_locators("main", "title");
        let parser = parser_for(&config).unwrap();
        let context = ParseContext::from_config(&config).with_code("57");
        let doc = parser.parse(OHIO_PAGE, &context).unwrap();
        assert_eq!(doc.sections()[0].citation, "R.C. 5747.01");
        // No history locator: the amendment line is still routed to history
        assert!(doc.sections()[0].history.as_deref().unwrap().starts_with("Amended by"));
    }
}
