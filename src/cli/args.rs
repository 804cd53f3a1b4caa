//! Command line argument parsing for the Vellum CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Vellum - search query construction and highlighting for digitized collections
#[derive(Parser, Debug, Clone)]
#[command(name = "vellum")]
#[command(about = "Build index queries, facet filters and highlighted snippets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VellumArgs {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VellumArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n + 1,
            }
        }
    }

    /// Default log filter for the verbosity level; `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the final index query, facet filters and child query for a search
    Query(QueryArgs),

    /// Cut highlighted fragments out of a text
    Highlight(HighlightArgs),

    /// Check a fuzzy term against a word
    Fuzzy(FuzzyArgs),

    /// Parse and normalize a facet string
    Facets(FacetsArgs),
}

/// Arguments for building a query
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Raw user query; empty lists all top-level records
    #[arg(value_name = "QUERY", default_value = "")]
    pub query: String,

    /// Active facet string (`FIELD:value;;FIELD2:value2`)
    #[arg(long, default_value = "-")]
    pub facets: String,

    /// Search configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Join child hits up to their records (overrides the configuration)
    #[arg(long)]
    pub aggregate: bool,

    /// License types the user may list (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub licenses: Vec<String>,

    /// Skip the access filter
    #[arg(long, conflicts_with = "licenses")]
    pub superuser: bool,

    /// Additional request filter
    #[arg(long)]
    pub filter: Option<String>,

    /// Sort string (`SORT_TITLE;!YEAR`, `RANDOM`)
    #[arg(long, default_value = "")]
    pub sort: String,
}

/// Arguments for highlighting
#[derive(Parser, Debug, Clone)]
pub struct HighlightArgs {
    /// Search terms (comma-separated or repeated)
    #[arg(short, long = "term", value_delimiter = ',', required = true)]
    pub terms: Vec<String>,

    /// Text to highlight
    #[arg(value_name = "TEXT", required_unless_present = "file")]
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(long, value_name = "FILE", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Fragment length in characters
    #[arg(short, long, default_value = "200")]
    pub length: usize,

    /// Only return the first fragment
    #[arg(long)]
    pub first_only: bool,

    /// Return the head of the text if nothing matches
    #[arg(long)]
    pub fallback: bool,

    /// Seed for the fragment window positions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Highlight markup tag
    #[arg(long, default_value = "em")]
    pub tag: String,
}

/// Arguments for fuzzy matching
#[derive(Parser, Debug, Clone)]
pub struct FuzzyArgs {
    /// Term, optionally with wildcards and distance (`*color~1`)
    #[arg(value_name = "TERM")]
    pub term: String,

    /// Word or text to match against
    #[arg(value_name = "TEXT")]
    pub text: String,
}

/// Arguments for facet string handling
#[derive(Parser, Debug, Clone)]
pub struct FacetsArgs {
    /// Facet string (`FIELD:value;;FIELD2:value2`)
    #[arg(value_name = "FACET_STRING")]
    pub facet_string: String,

    /// Search configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Also print the generated filter queries
    #[arg(long)]
    pub filters: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity() {
        let args = VellumArgs::try_parse_from(["vellum", "fuzzy", "bird~1", "bird"]).unwrap();
        assert_eq!(args.verbosity(), 1);
        assert_eq!(args.log_filter(), "warn");

        let args = VellumArgs::try_parse_from(["vellum", "-vv", "fuzzy", "bird~1", "bird"]).unwrap();
        assert_eq!(args.log_filter(), "debug");

        let args =
            VellumArgs::try_parse_from(["vellum", "-q", "-v", "fuzzy", "bird~1", "bird"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_query_args() {
        let args = VellumArgs::try_parse_from([
            "vellum",
            "--format",
            "json",
            "query",
            "bird",
            "--facets",
            "DC:science",
            "--licenses",
            "restricted,internal",
        ])
        .unwrap();

        assert_eq!(args.output_format, OutputFormat::Json);
        if let Command::Query(query) = args.command {
            assert_eq!(query.query, "bird");
            assert_eq!(query.facets, "DC:science");
            assert_eq!(query.licenses, vec!["restricted", "internal"]);
            assert!(!query.superuser);
        } else {
            panic!("Expected query command");
        }
    }

    #[test]
    fn test_highlight_args() {
        let args = VellumArgs::try_parse_from([
            "vellum", "highlight", "-t", "bird,owl", "--seed", "7", "A bird and an owl",
        ])
        .unwrap();
        if let Command::Highlight(highlight) = args.command {
            assert_eq!(highlight.terms, vec!["bird", "owl"]);
            assert_eq!(highlight.seed, Some(7));
            assert_eq!(highlight.length, 200);
        } else {
            panic!("Expected highlight command");
        }

        assert!(VellumArgs::try_parse_from(["vellum", "highlight", "-t", "bird"]).is_err());
    }
}
