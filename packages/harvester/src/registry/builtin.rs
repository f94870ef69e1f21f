//! Built-in jurisdiction definitions.
//!
//! Overlay files in the sources directory replace these entries wholesale
//! when they declare the same jurisdiction.

use crate::types::{SourceConfig, SourceType};

/// New York Open Legislation API root.
pub const NY_API_BASE_URL: &str = "https://legislation.nysenate.gov/api/3";

/// Create the built-in source configurations.
///
/// This table includes federal law plus the state jurisdictions that need
/// no overlay file to be harvested.
#[must_use]
pub fn builtin_configs() -> Vec<SourceConfig> {
    vec![
        federal(),
        ohio(),
        pennsylvania(),
        north_carolina(),
        illinois(),
        michigan(),
        georgia(),
        new_york(),
    ]
}

fn federal() -> SourceConfig {
    SourceConfig::new(
        "us",
        "United States",
        SourceType::Uslm,
        "https://www.govinfo.gov",
    )
    .with_patterns(
        "/link/uscode/{code}/{section}?link-type=xml",
        "/content/pkg/USCODE-2023-title{code}/xml/USCODE-2023-title{code}.xml",
    )
    .with_codes([
        ("7", "Agriculture"),
        ("20", "Education"),
        ("26", "Internal Revenue Code"),
        ("29", "Labor"),
        ("38", "Veterans' Benefits"),
        ("42", "The Public Health and Welfare"),
    ])
    .with_priority_codes(["26", "42", "7"])
    .with_rate_limit(1.0)
}

fn ohio() -> SourceConfig {
    SourceConfig::new("us-oh", "Ohio", SourceType::Html, "https://codes.ohio.gov")
        .with_patterns(
            "/ohio-revised-code/section-{section}",
            "/ohio-revised-code/title-{code}",
        )
        .with_locators("main", "title")
        .with_codes([
            ("57", "Taxation"),
            ("51", "Public Welfare"),
            ("41", "Labor and Industry"),
            ("33", "Education-Libraries"),
            ("37", "Health-Safety-Morals"),
        ])
        .with_priority_codes(["57", "51", "41"])
}

fn pennsylvania() -> SourceConfig {
    SourceConfig::new("us-pa", "Pennsylvania", SourceType::Html, "https://www.palegis.us")
        .with_patterns(
            "/statutes/consolidated/view-statute?txtType=HTM&ttl={code}&sctn={section}",
            "/statutes/consolidated/view-statute?txtType=HTM&ttl={code}",
        )
        .with_locators("div.statute-content, div#content, body", "h1, h2.title")
        .with_codes([
            ("72", "Taxation and Fiscal Affairs"),
            ("62", "Public Welfare"),
            ("43", "Labor"),
            ("40", "Insurance"),
            ("24", "Education"),
        ])
        .with_priority_codes(["72", "62", "43"])
}

fn north_carolina() -> SourceConfig {
    SourceConfig::new("us-nc", "North Carolina", SourceType::Html, "https://www.ncleg.gov")
        .with_patterns(
            "/EnactedLegislation/Statutes/HTML/BySection/Chapter_{code}/GS_{section}.html",
            "/EnactedLegislation/Statutes/HTML/ByChapter/Chapter_{code}.html",
        )
        .with_locators("body", "title")
        .with_codes([
            ("105", "Taxation"),
            ("108A", "Social Services"),
            ("95", "Department of Labor"),
            ("96", "Employment Security"),
            ("58", "Insurance"),
        ])
        .with_priority_codes(["105", "108A", "95", "96"])
}

fn illinois() -> SourceConfig {
    // Sections are addressed as "<act>/<section>", e.g. "5/201" in 35 ILCS
    SourceConfig::new("us-il", "Illinois", SourceType::Html, "https://www.ilga.gov")
        .with_patterns(
            "/legislation/ilcs/ilcs4.asp?ChapterID={code}&Section={section}",
            "/legislation/ilcs/ilcs2.asp?ChapterID={code}",
        )
        .with_locators("div.ilcs-content, td.content, body", "h1, h2")
        .with_codes([
            ("35", "Revenue"),
            ("305", "Public Aid"),
            ("820", "Employment"),
            ("215", "Insurance"),
            ("105", "Schools"),
        ])
        .with_priority_codes(["35", "305", "820"])
}

fn michigan() -> SourceConfig {
    SourceConfig::new("us-mi", "Michigan", SourceType::Html, "https://www.legislature.mi.gov")
        .with_patterns("/Laws/MCL?objectId=mcl-{section}", "/Laws/MCL?chapter={code}")
        .with_locators("div.content, main, body", "title, h1")
        .with_codes([
            ("206", "Income Tax Act"),
            ("400", "Social Welfare"),
            ("408", "Labor"),
            ("421", "Michigan Employment Security Act"),
            ("500", "Insurance Code"),
        ])
        .with_priority_codes(["206", "400", "408", "421"])
}

fn georgia() -> SourceConfig {
    SourceConfig::new("us-ga", "Georgia", SourceType::Html, "https://www.legis.ga.gov")
        .with_patterns(
            "/api/legislation/code/{code}/section/{section}",
            "/api/legislation/code/{code}",
        )
        .with_locators("body", "title")
        .with_codes([
            ("48", "Revenue and Taxation"),
            ("49", "Social Services"),
            ("34", "Labor and Industrial Relations"),
            ("33", "Insurance"),
        ])
        .with_priority_codes(["48", "49", "34"])
}

fn new_york() -> SourceConfig {
    SourceConfig::new("us-ny", "New York", SourceType::Api, NY_API_BASE_URL)
        .with_codes([
            ("TAX", "Tax Law"),
            ("SOS", "Social Services Law"),
            ("LAB", "Labor Law"),
            ("ISC", "Insurance Law"),
            ("EDN", "Education Law"),
        ])
        .with_priority_codes(["TAX", "SOS", "LAB"])
        .with_custom_parser("ny-laws")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_configs_are_valid() {
        for config in builtin_configs() {
            assert!(
                config.validate().is_ok(),
                "{}: {:?}",
                config.jurisdiction,
                config.validate().err()
            );
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let configs = builtin_configs();
        let ids: HashSet<&str> = configs.iter().map(|c| c.jurisdiction.as_str()).collect();
        assert_eq!(ids.len(), configs.len());
    }

    #[test]
    fn test_ohio_priority_codes() {
        let ohio = builtin_configs()
            .into_iter()
            .find(|c| c.jurisdiction == "us-oh")
            .unwrap();
        assert_eq!(ohio.priority_codes, vec!["57", "51", "41"]);
        assert_eq!(ohio.code_name("57"), Some("Taxation"));
    }

    #[test]
    fn test_patterns_use_only_supplied_placeholders() {
        for config in builtin_configs() {
            if let Some(pattern) = &config.section_url_pattern {
                let expanded = crate::config::expand_pattern(
                    &config.jurisdiction,
                    pattern,
                    &[("code", "1"), ("section", "1"), ("jurisdiction", "x")],
                );
                assert!(expanded.is_ok(), "{}: {pattern}", config.jurisdiction);
            }
        }
    }
}
