//! Source adapters fetching statute documents from one jurisdiction.
//!
//! Every adapter implements [`StatuteSource`]. Adapters only retrieve bytes;
//! turning them into sections is the job of [`crate::parser`]. Each adapter
//! owns its own rate limiter, so adapters for different jurisdictions never
//! throttle each other.

mod api;
mod html;
mod ny;
mod pattern;
mod uslm;

pub use api::ApiSource;
pub use html::HtmlSource;
pub use ny::NyLegislationSource;
pub use pattern::PatternFetcher;
pub use uslm::UslmSource;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{RawDocument, SourceConfig, SourceType};

/// Uniform fetch contract of all adapters.
pub trait StatuteSource: Send + Sync {
    /// Configuration the adapter was built from.
    fn config(&self) -> &SourceConfig;

    /// Short adapter identifier ("uslm", "html", "api", "ny-legislation").
    fn adapter_name(&self) -> &'static str;

    /// Source type of the underlying configuration.
    fn source_type(&self) -> SourceType {
        self.config().source_type
    }

    /// Jurisdiction id.
    fn jurisdiction(&self) -> &str {
        &self.config().jurisdiction
    }

    /// Section identifiers of a code, in document order.
    ///
    /// An unknown code fails with `NotFound` before any request is made.
    fn fetch_table_of_contents(&self, code: &str) -> Result<Vec<String>>;

    /// Raw document for one section.
    ///
    /// An unknown code or malformed section id fails with `NotFound` before
    /// any request is made.
    fn fetch_section(&self, code: &str, section_id: &str) -> Result<RawDocument>;

    /// Code identifiers to human-readable names.
    fn list_codes(&self) -> &BTreeMap<String, String> {
        &self.config().codes
    }
}
