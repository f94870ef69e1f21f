//! Parser tests against fixture documents shaped like the real sources.

use std::fs;
use std::path::Path;

use statute_harvester::parser::toc::{html_section_ids, uslm_section_ids};
use statute_harvester::{parser_for, ParseContext, RequestTarget, Section, SourceRegistry};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// Parse a fixture with the parser the built-in registry selects.
fn parse_fixture(jurisdiction: &str, code: &str, name: &str) -> (Vec<Section>, Vec<String>) {
    let registry = SourceRegistry::builtin_only();
    let config = registry.get_config(jurisdiction).unwrap();
    let parser = parser_for(&config).unwrap();
    let context = ParseContext::from_config(&config).with_code(code);
    parser
        .parse(&load_fixture(name), &context)
        .unwrap()
        .into_parts()
}

mod uslm {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_title_excerpt_sections() {
        let (sections, warnings) = parse_fixture("us", "42", "uslm/usc42_excerpt.xml");
        assert!(warnings.is_empty(), "{warnings:?}");

        let citations: Vec<&str> = sections.iter().map(|s| s.citation.as_str()).collect();
        assert_eq!(
            citations,
            vec!["42 U.S.C. § 401", "42 U.S.C. § 401a", "42 U.S.C. § 402"]
        );
        for section in &sections {
            assert_eq!(section.source_jurisdiction, "us");
            assert_eq!(section.code.as_deref(), Some("42"));
        }
    }

    #[test]
    fn test_hierarchy_skips_missing_optional_levels() {
        let (sections, _) = parse_fixture("us", "42", "uslm/usc42_excerpt.xml");
        assert_eq!(
            sections[0].hierarchy_path,
            vec![
                Some("42".to_string()),
                None,
                Some("7".to_string()),
                Some("II".to_string()),
            ]
        );
        assert_eq!(sections[0].hierarchy_display(), "42 > - > 7 > II");
    }

    #[test]
    fn test_body_history_and_subsections() {
        let (sections, _) = parse_fixture("us", "42", "uslm/usc42_excerpt.xml");
        let s401 = &sections[0];

        assert_eq!(s401.heading.as_deref(), Some("Trust Funds"));
        assert!(s401.body_text.starts_with("(a) Federal Old-Age and Survivors Insurance Trust Fund"));
        assert!(s401.body_text.contains("(2) amounts deposited in it as provided in section 403."));
        assert!(!s401.body_text.contains("49 Stat. 622"));

        let history = s401.history.as_deref().unwrap();
        assert!(history.contains("49 Stat. 622"));
        assert!(history.contains("Pub. L. 114–74"));
        assert!(!history.contains("referred to in text"));

        assert_eq!(s401.subsections.len(), 2);
        assert_eq!(s401.subsections[1].label, "b");
        assert_eq!(s401.subsections[1].children.len(), 2);
        assert_eq!(s401.subsections[1].children[1].label, "2");
    }

    #[test]
    fn test_repealed_status_and_effective_date_notes() {
        let (sections, _) = parse_fixture("us", "42", "uslm/usc42_excerpt.xml");

        let repealed = &sections[1];
        assert!(repealed.heading.as_deref().unwrap().ends_with("[repealed]"));
        assert_eq!(repealed.body_text, "");

        let s402 = &sections[2];
        assert!(s402
            .history
            .as_deref()
            .unwrap()
            .contains("Amendment effective on the date of enactment."));
    }

    #[test]
    fn test_toc_ids_match_parsed_numbers() {
        let raw = load_fixture("uslm/usc42_excerpt.xml");
        let ids = uslm_section_ids(&raw, &RequestTarget::code("us", "42")).unwrap();
        assert_eq!(ids, vec!["401", "401a", "402"]);
    }
}

mod html {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ohio_section_page() {
        let (sections, warnings) = parse_fixture("us-oh", "57", "html/ohio_5747_01.html");
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(sections.len(), 1);

        let section = &sections[0];
        assert_eq!(section.citation, "R.C. 5747.01");
        assert_eq!(section.heading.as_deref(), Some("Definitions"));
        assert_eq!(section.hierarchy_path, vec![Some("57".to_string())]);
        assert!(section.body_text.starts_with("Except as otherwise expressly provided"));
        assert!(section.body_text.contains("\nAs used in this chapter:\n"));
        assert!(!section.body_text.contains("Ohio Legislative Service Commission"));
        assert!(!section.body_text.contains("window.analytics"));

        let history = section.history.as_deref().unwrap();
        assert!(history.contains("Effective: October 3, 2023"));
        assert!(history.contains("HB 33"));
    }

    #[test]
    fn test_ohio_chapter_links() {
        let registry = SourceRegistry::builtin_only();
        let ohio = registry.get_config("us-oh").unwrap();
        let raw = load_fixture("html/ohio_title57_chapter5747.html");

        let ids = html_section_ids(
            &raw,
            ohio.section_url_pattern.as_deref().unwrap(),
            "57",
            &RequestTarget::code("us-oh", "57"),
        )
        .unwrap();
        assert_eq!(ids, vec!["5747.01", "5747.011", "5747.02"]);
    }
}

mod ny {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_law_document() {
        let (sections, warnings) = parse_fixture("us-ny", "TAX", "ny/tax_601.json");
        assert!(warnings.is_empty(), "{warnings:?}");

        let section = &sections[0];
        assert_eq!(section.citation, "N.Y. TAX Law § 601");
        assert_eq!(section.heading.as_deref(), Some("Imposition of tax"));
        assert_eq!(section.code.as_deref(), Some("TAX"));
        assert_eq!(
            section.effective_date,
            chrono::NaiveDate::from_ymd_opt(2014, 9, 22)
        );
        assert!(section.body_text.starts_with("§ 601. Imposition of tax."));
    }

    #[test]
    fn test_api_failure_is_parse_error() {
        let registry = SourceRegistry::builtin_only();
        let config = registry.get_config("us-ny").unwrap();
        let parser = parser_for(&config).unwrap();

        let err = parser
            .parse(r#"{"success": false, "message": "No law found"}"#, &ParseContext::from_config(&config))
            .unwrap_err();
        assert!(err.to_string().contains("No law found"));
    }
}
