//! Command-line interface for inspecting sources and sections.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{HarvesterError, Result};
use crate::parser::{parser_for, ParseContext};
use crate::registry;
use crate::types::{JurisdictionSummary, Section};

/// Width used when wrapping section text.
const TEXT_WIDTH: usize = 88;

/// Statute Harvester - fetch federal and state statutes as structured sections.
#[derive(Parser)]
#[command(name = "statute-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List registered jurisdictions.
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the codes of a jurisdiction.
    Codes {
        /// Jurisdiction id (e.g., us-oh)
        jurisdiction: String,
    },

    /// Print the section ids of a code.
    Toc {
        /// Jurisdiction id (e.g., us-oh)
        jurisdiction: String,

        /// Code id (e.g., 57)
        code: String,
    },

    /// Fetch and parse a single section.
    Fetch {
        /// Jurisdiction id (e.g., us-oh)
        jurisdiction: String,

        /// Code id (e.g., 57)
        code: String,

        /// Section id (e.g., 5747.01)
        section: String,

        /// Print the fetched document without parsing it
        #[arg(long, conflicts_with = "json")]
        raw: bool,

        /// Print parsed sections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a local file with a jurisdiction's parser.
    Parse {
        /// Jurisdiction id (e.g., us)
        jurisdiction: String,

        /// File holding a fetched document
        file: PathBuf,

        /// Code the document belongs to
        #[arg(short, long)]
        code: Option<String>,

        /// Print parsed sections as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List { json } => list_command(json),
        Commands::Codes { jurisdiction } => codes_command(&jurisdiction),
        Commands::Toc { jurisdiction, code } => toc_command(&jurisdiction, &code),
        Commands::Fetch {
            jurisdiction,
            code,
            section,
            raw,
            json,
        } => fetch_command(&jurisdiction, &code, &section, raw, json),
        Commands::Parse {
            jurisdiction,
            file,
            code,
            json,
        } => parse_command(&jurisdiction, &file, code.as_deref(), json),
    }
}

fn list_command(json: bool) -> Result<()> {
    let jurisdictions = registry::list_jurisdictions();
    if json {
        println!("{}", serde_json::to_string_pretty(&jurisdictions)?);
        return Ok(());
    }

    for JurisdictionSummary {
        jurisdiction,
        name,
        source_type,
        codes,
    } in &jurisdictions
    {
        println!(
            "{:<8} {:<5} {} {}",
            style(jurisdiction).cyan(),
            source_type.as_str(),
            name,
            style(format!("({} codes)", codes.len())).dim()
        );
    }
    Ok(())
}

fn codes_command(jurisdiction: &str) -> Result<()> {
    let config = registry::get_config(jurisdiction).ok_or_else(|| HarvesterError::ConfigNotFound {
        jurisdiction: jurisdiction.to_string(),
    })?;

    println!("{} {}", style(&config.name).bold(), style(&config.jurisdiction).dim());
    for code in config.codes_by_priority() {
        let marker = if config.priority_codes.iter().any(|p| p == code) {
            style("*").yellow().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{marker} {:<8} {}",
            style(code).cyan(),
            config.code_name(code).unwrap_or_default()
        );
    }
    Ok(())
}

fn toc_command(jurisdiction: &str, code: &str) -> Result<()> {
    let source = registry::get_source(jurisdiction)?;

    let pb = spinner(format!("Fetching table of contents for {jurisdiction} {code}..."));
    let result = source.fetch_table_of_contents(code);
    pb.finish_and_clear();

    for section in result? {
        println!("{section}");
    }
    Ok(())
}

fn fetch_command(jurisdiction: &str, code: &str, section: &str, raw: bool, json: bool) -> Result<()> {
    let source = registry::get_source(jurisdiction)?;
    let parser = parser_for(source.config())?;

    let pb = spinner(format!("Fetching {jurisdiction} {code} {section}..."));
    let document = match source.fetch_section(code, section) {
        Ok(document) => document,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    if raw {
        println!("{}", document.text());
        return Ok(());
    }

    let context = ParseContext::from_config(source.config())
        .with_code(code)
        .with_section(section);
    let parsed = parser.parse(&document.text(), &context)?;
    print_parsed(parsed.into_parts(), json)
}

fn parse_command(jurisdiction: &str, file: &Path, code: Option<&str>, json: bool) -> Result<()> {
    let config = registry::get_config(jurisdiction).ok_or_else(|| HarvesterError::ConfigNotFound {
        jurisdiction: jurisdiction.to_string(),
    })?;
    let parser = parser_for(&config)?;

    let raw = std::fs::read_to_string(file)?;
    let mut context = ParseContext::from_config(&config);
    if let Some(code) = code {
        context = context.with_code(code);
    }

    let parsed = parser.parse(&raw, &context)?;
    print_parsed(parsed.into_parts(), json)
}

fn print_parsed((sections, warnings): (Vec<Section>, Vec<String>), json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else {
        for section in &sections {
            print_section(section);
        }
    }

    for warning in &warnings {
        eprintln!("{} {warning}", style("warning:").yellow().bold());
    }
    Ok(())
}

fn print_section(section: &Section) {
    println!("{}", style(&section.citation).bold());
    if let Some(heading) = &section.heading {
        println!("{}", style(heading).green());
    }
    if !section.hierarchy_path.is_empty() {
        println!("{}", style(section.hierarchy_display()).dim());
    }
    if let Some(date) = section.effective_date {
        println!("{} {date}", style("Effective:").dim());
    }
    println!();
    println!("{}", textwrap::fill(&section.body_text, TEXT_WIDTH));
    if let Some(history) = &section.history {
        println!();
        println!("{}", style(textwrap::fill(history, TEXT_WIDTH)).dim());
    }
    println!();
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
