//! Parsers turning fetched documents into structured sections.
//!
//! Every parser implements [`SectionParser`]. The closed set of required
//! parsers (USLM, generic HTML, generic JSON) is always registered; the open
//! set of jurisdiction-specific parsers is looked up by id, and an id with no
//! parser is reported as `Unsupported` rather than silently falling back.

mod document;
pub mod html;
pub mod json;
mod registry;
pub mod toc;
pub mod uslm;

pub use document::{ParseContext, ParsedDocument};
pub use html::HtmlParser;
pub use json::{JsonApiParser, NyLawsParser};
pub use registry::{create_parser_registry, parser_for, ParserRegistry};
pub use uslm::UslmParser;

use crate::error::Result;

/// Common contract of all parsers: one document in, zero or more sections out.
///
/// A document with no recognizable sections is an empty result, not an
/// error; `Err` is reserved for input that cannot be interpreted at all.
pub trait SectionParser: Send + Sync {
    /// Registry id of this parser (e.g. "uslm", "html-nc").
    fn name(&self) -> &str;

    /// Parse one document.
    fn parse(&self, raw: &str, context: &ParseContext) -> Result<ParsedDocument>;
}
