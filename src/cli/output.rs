//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, VellumArgs};
use crate::error::Result;
use crate::facet::item::FacetItem;

/// Queries generated for a search.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryReport {
    pub final_query: String,
    pub filter_queries: Vec<String>,
    pub expand_query: Option<String>,
    pub sort_fields: Vec<String>,
    pub search_terms: Vec<(String, Vec<String>)>,
}

/// Highlighted fragments of a text.
#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightReport {
    pub terms: Vec<String>,
    pub fragments: Vec<String>,
}

/// Result of a fuzzy comparison.
#[derive(Debug, Serialize, Deserialize)]
pub struct FuzzyReport {
    pub term: String,
    pub text: String,
    pub is_fuzzy_term: bool,
    pub max_distance: usize,
    pub distance: usize,
    pub matches: bool,
}

/// A parsed facet string.
#[derive(Debug, Serialize, Deserialize)]
pub struct FacetsReport {
    pub facet_string: String,
    pub items: Vec<FacetItem>,
    pub filter_queries: Option<Vec<String>>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &VellumArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &VellumArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    if let Some(obj) = value.as_object() {
        for (key, value) in obj {
            match value {
                serde_json::Value::Array(items) if !items.is_empty() => {
                    println!("{key}:");
                    for item in items {
                        println!("  - {}", format_value(item));
                    }
                }
                _ => println!("{key}: {}", format_value(value)),
            }
        }
    } else {
        println!("{}", format_value(&value));
    }
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &VellumArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(obj) => obj
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| format!("{k}={}", format_value(v)))
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::Null => "-".to_string(),
    }
}
