//! Parser registry mapping parser ids to parsers.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::html::{HtmlParser, STYLES};
use super::json::{JsonApiParser, NyLawsParser};
use super::uslm::UslmParser;
use super::SectionParser;
use crate::error::{HarvesterError, Result};
use crate::types::{SourceConfig, SourceType};

/// Registry mapping parser ids to parsers.
pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn SectionParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser under an id, replacing any previous one.
    pub fn register(&mut self, id: impl Into<String>, parser: impl SectionParser + 'static) {
        self.parsers.insert(id.into(), Box::new(parser));
    }

    /// Get a parser by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn SectionParser> {
        self.parsers.get(id).map(|p| p.as_ref())
    }

    /// Check if a parser is registered under an id.
    #[must_use]
    pub fn has_parser(&self, id: &str) -> bool {
        self.parsers.contains_key(id)
    }

    /// Return set of all registered parser ids.
    #[must_use]
    pub fn registered_ids(&self) -> HashSet<&str> {
        self.parsers.keys().map(|s| s.as_str()).collect()
    }

    /// Select the parser for a jurisdiction.
    ///
    /// Order: the configured `custom_parser`, then a jurisdiction-specific
    /// HTML parser (`html-<state>` for `us-<state>`), then the default for
    /// the source type. A `custom_parser` naming nothing registered is
    /// `Unsupported`.
    pub fn parser_for(&self, config: &SourceConfig) -> Result<&dyn SectionParser> {
        if let Some(id) = config.custom_parser.as_deref() {
            return self.get(id).ok_or_else(|| HarvesterError::Unsupported {
                jurisdiction: config.jurisdiction.clone(),
                message: format!("no parser registered under '{id}'"),
            });
        }

        let id = match config.source_type {
            SourceType::Uslm => "uslm".to_string(),
            SourceType::Html => config
                .jurisdiction
                .strip_prefix("us-")
                .map(|state| format!("html-{state}"))
                .filter(|id| self.has_parser(id))
                .unwrap_or_else(|| "html".to_string()),
            SourceType::Api => "json".to_string(),
        };

        self.get(&id).ok_or_else(|| HarvesterError::Unsupported {
            jurisdiction: config.jurisdiction.clone(),
            message: format!("no parser registered under '{id}'"),
        })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with every built-in parser.
#[must_use]
pub fn create_parser_registry() -> ParserRegistry {
    let mut registry = ParserRegistry::new();

    registry.register("uslm", UslmParser::new());
    registry.register("json", JsonApiParser);
    registry.register("ny-laws", NyLawsParser);

    // Generic HTML plus one parser per state citation style
    for style in STYLES.iter() {
        registry.register(style.id, HtmlParser::new(style));
    }

    registry
}

static DEFAULT_PARSERS: LazyLock<ParserRegistry> = LazyLock::new(create_parser_registry);

/// Select a parser from the built-in registry.
pub fn parser_for(config: &SourceConfig) -> Result<&'static dyn SectionParser> {
    DEFAULT_PARSERS.parser_for(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(jurisdiction: &str) -> SourceConfig {
        SourceConfig::new(jurisdiction, "X", SourceType::Html, "https://x.gov")
            .with_patterns("/{section}", "/{code}")
    }

    #[test]
    fn test_builtin_ids() {
        let registry = create_parser_registry();
        for id in [
            "uslm", "html", "json", "ny-laws", "html-oh", "html-pa", "html-nc", "html-il",
            "html-mi", "html-ga", "html-ca", "html-tx",
        ] {
            assert!(registry.has_parser(id), "missing parser {id}");
        }
    }

    #[test]
    fn test_parser_for_state_style() {
        let parser = parser_for(&html("us-nc")).unwrap();
        assert_eq!(parser.name(), "html-nc");
    }

    #[test]
    fn test_parser_for_falls_back_to_generic_html() {
        let parser = parser_for(&html("us-wy")).unwrap();
        assert_eq!(parser.name(), "html");
    }

    #[test]
    fn test_parser_for_source_type_defaults() {
        let us = SourceConfig::new("us", "US", SourceType::Uslm, "https://x.gov");
        assert_eq!(parser_for(&us).unwrap().name(), "uslm");

        let api = SourceConfig::new("us-xx", "X", SourceType::Api, "https://x.gov");
        assert_eq!(parser_for(&api).unwrap().name(), "json");
    }

    #[test]
    fn test_parser_for_custom_parser() {
        let ny = SourceConfig::new("us-ny", "NY", SourceType::Api, "https://x.gov")
            .with_custom_parser("ny-laws");
        assert_eq!(parser_for(&ny).unwrap().name(), "ny-laws");
    }

    #[test]
    fn test_parser_for_unknown_custom_parser() {
        let config = html("us-oh").with_custom_parser("html-atlantis");
        let err = parser_for(&config).err().unwrap();
        assert!(matches!(err, HarvesterError::Unsupported { .. }));
        assert!(err.to_string().contains("html-atlantis"));
    }
}
