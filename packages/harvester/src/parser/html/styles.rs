//! Citation styles for state HTML pages.
//!
//! A style recognizes the line that opens a section (capturing `num` and,
//! when printed on the same line, `heading` or `text`) and knows how the
//! jurisdiction cites a section.

use std::sync::LazyLock;

use regex::Regex;

/// How one family of HTML pages opens and cites a section.
#[derive(Debug)]
pub struct CitationStyle {
    /// Parser id registered for this style.
    pub id: &'static str,

    /// Matches a section-opening line.
    pub heading: Regex,

    /// Citation template with `{num}`, `{code}` and `{jurisdiction}` placeholders.
    pub citation_format: &'static str,
}

impl CitationStyle {
    #[allow(clippy::expect_used)] // Patterns below are static and guaranteed to be valid
    fn new(id: &'static str, heading: &str, citation_format: &'static str) -> Self {
        Self {
            id,
            heading: Regex::new(heading).expect("valid regex"),
            citation_format,
        }
    }

    /// Render the citation of a section.
    ///
    /// # Examples
    /// ```
    /// use statute_harvester::parser::html::STYLES;
    ///
    /// let pa = STYLES.iter().find(|s| s.id == "html-pa").unwrap();
    /// assert_eq!(pa.citation("8101", Some("72"), "us-pa"), "72 Pa.C.S. § 8101");
    /// ```
    #[must_use]
    pub fn citation(&self, num: &str, code: Option<&str>, jurisdiction: &str) -> String {
        let rendered = self
            .citation_format
            .replace("{num}", num)
            .replace("{code}", code.unwrap_or_default())
            .replace("{jurisdiction}", &jurisdiction.to_uppercase());
        rendered.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Every built-in style; the generic style comes first.
pub static STYLES: LazyLock<Vec<CitationStyle>> = LazyLock::new(|| {
    vec![
        CitationStyle::new(
            "html",
            r"^(?:§+|Sec\.|Section)\s*(?P<num>[0-9][0-9A-Za-z.\-/:]*[0-9A-Za-z])\.?(?:\s+(?P<heading>.+))?$",
            "{jurisdiction} § {num}",
        ),
        // "Section 5747.01 | Definitions."
        CitationStyle::new(
            "html-oh",
            r"^Section\s+(?P<num>[0-9]+\.[0-9]+[0-9A-Za-z]*)\s*\|?\s*(?P<heading>.*)$",
            "R.C. {num}",
        ),
        // "§ 8101. Short title."
        CitationStyle::new(
            "html-pa",
            r"^§\s*(?P<num>[0-9]+[0-9A-Za-z.]*[0-9A-Za-z])\.\s*(?P<heading>.*)$",
            "{code} Pa.C.S. § {num}",
        ),
        // "§ 105-130.3.  Corporations."
        CitationStyle::new(
            "html-nc",
            r"^§\s*(?P<num>[0-9]+[A-Z]?-[0-9]+[0-9A-Za-z.]*[0-9A-Za-z])\.\s*(?P<heading>.*)$",
            "N.C.G.S. § {num}",
        ),
        // "(35 ILCS 5/201) (from Ch. 120, par. 2-201)"
        CitationStyle::new(
            "html-il",
            r"^\([0-9]+\s+ILCS\s+(?P<num>[0-9]+/[0-9A-Za-z.\-]+)\)\s*(?P<text>.*)$",
            "{code} ILCS {num}",
        ),
        // "206.30 Taxable income; definition." (three-digit chapter, capitalized catchline)
        CitationStyle::new(
            "html-mi",
            r"^(?:Sec\.\s*|Section\s+)?(?P<num>[0-9]{3}[a-z]?\.[0-9]+[a-z]?)\.?\s+(?P<heading>[A-Z][^\s.][^.]*(?:\.[^\s.][^.]*)*\.)$",
            "MCL {num}",
        ),
        // "§ 48-7-20. Individual tax rates."
        CitationStyle::new(
            "html-ga",
            r"^§\s*(?P<num>[0-9]+-[0-9]+-[0-9]+[0-9A-Za-z.]*?)\.\s*(?P<heading>.*)$",
            "O.C.G.A. § {num}",
        ),
        // "17041." on its own line, or followed by subdivision "(a)"
        CitationStyle::new(
            "html-ca",
            r"^(?P<num>[0-9]{3,6}(?:\.[0-9]+)?)\.(?:\s+(?P<text>\([0-9a-z]+\).*))?$",
            "Cal. {code} § {num}",
        ),
        // "Sec. 151.051.  SALE, PRODUCTION, DISTRIBUTION, LEASE, OR RENTAL ..."
        CitationStyle::new(
            "html-tx",
            r"^Sec\.\s*(?P<num>[0-9]+[A-Z]?\.[0-9]+[0-9A-Za-z]*)\.\s*(?P<heading>.*)$",
            "Tex. {code} Code § {num}",
        ),
    ]
});
