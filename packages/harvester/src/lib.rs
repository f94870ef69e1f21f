//! Statute Harvester - fetch federal and state statutes as structured sections.
//!
//! This crate fetches statutory text from heterogeneous government sources
//! (USLM XML, HTML pages, JSON APIs) and normalizes it into [`Section`]s with
//! a citation, heading, body text, hierarchy path and amendment history.
//!
//! # Example
//!
//! ```
//! use statute_harvester::{parser_for, ParseContext, SourceRegistry};
//!
//! let registry = SourceRegistry::builtin_only();
//! let ohio = registry.get_config("US-OH").unwrap();
//! assert_eq!(ohio.jurisdiction, "us-oh");
//!
//! let html = r#"<main><h1>Section 5747.01 | Definitions.</h1>
//!     <p>As used in this chapter...</p></main>"#;
//! let parsed = parser_for(&ohio)
//!     .unwrap()
//!     .parse(html, &ParseContext::from_config(&ohio).with_code("57"))
//!     .unwrap();
//! let sections: Vec<_> = parsed.into_iter().collect();
//! assert_eq!(sections[0].citation, "R.C. 5747.01");
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants, validation and URL helpers
//! - [`types`]: Core data types (SourceConfig, Section, RawDocument, etc.)
//! - [`error`]: Error types and Result alias
//! - [`registry`]: Jurisdiction registry with built-in and overlay configurations
//! - [`sources`]: Source adapters fetching raw documents
//! - [`policy`]: Rate limiting and retry with backoff
//! - [`http`]: HTTP client and response classification
//! - [`parser`]: USLM, HTML and JSON parsers
//! - [`xml`]: XML utilities
//! - [`text`]: Text normalization
//! - [`harvester`]: Fetch-and-parse pipeline
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod harvester;
pub mod http;
pub mod parser;
pub mod policy;
pub mod registry;
pub mod sources;
pub mod text;
pub mod types;
pub mod xml;

// Re-export main functions
pub use harvester::{
    harvest_code, harvest_jurisdictions, harvest_section, harvest_section_with, CodeHarvest,
    HarvestRequest,
};
pub use registry::{get_all_configs, get_config, get_source, list_jurisdictions, register_source};

// Re-export commonly used items
pub use error::{HarvesterError, RequestTarget, Result};
pub use parser::{parser_for, ParseContext, ParsedDocument, SectionParser};
pub use policy::{CancelFlag, RetryPolicy};
pub use registry::SourceRegistry;
pub use sources::StatuteSource;
pub use types::{JurisdictionSummary, RawDocument, Section, SourceConfig, SourceType, Subsection};
