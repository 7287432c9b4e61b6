//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::classify::ScoredTerm;
use crate::cli::args::{OutputFormat, TextCatArgs};
use crate::error::Result;
use crate::index::TermId;

/// A selected term as printed by `select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedTerm {
    pub rank: usize,
    pub term_id: TermId,
    pub text: Option<String>,
    pub score: f64,
}

impl SelectedTerm {
    pub fn new(rank: usize, scored: ScoredTerm, text: Option<&str>) -> Self {
        SelectedTerm {
            rank,
            term_id: scored.term_id,
            text: text.map(str::to_string),
            score: scored.score,
        }
    }
}

/// Result structure for feature selection.
#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResult {
    pub training_documents: u64,
    pub relevant_documents: u64,
    pub requested: usize,
    pub terms: Vec<SelectedTerm>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &TextCatArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &TextCatArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value.get("terms").and_then(|t| t.as_array()) {
        Some(terms) => output_terms_human(&value, terms),
        None => output_generic_human(&value, 0),
    }
    Ok(())
}

/// Output selected terms as a table.
fn output_terms_human(value: &serde_json::Value, terms: &[serde_json::Value]) {
    if let Some(obj) = value.as_object() {
        for (key, val) in obj.iter().filter(|(key, _)| key.as_str() != "terms") {
            println!("{key}: {}", format_value(val));
        }
    }
    println!();
    println!("{:>5}  {:>8}  {:<24}  {:>12}", "Rank", "Term", "Text", "Score");
    println!("{}", "─".repeat(55));
    for term in terms {
        println!(
            "{:>5}  {:>8}  {:<24}  {:>12.6}",
            term.get("rank").and_then(|r| r.as_u64()).unwrap_or(0),
            term.get("term_id").and_then(|t| t.as_u64()).unwrap_or(0),
            term.get("text").and_then(|t| t.as_str()).unwrap_or("-"),
            term.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0)
        );
    }
}

/// Generic output for other types.
fn output_generic_human(value: &serde_json::Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                match val {
                    serde_json::Value::Object(_) => {
                        println!("{pad}{key}:");
                        output_generic_human(val, indent + 1);
                    }
                    _ => println!("{pad}{key}: {}", format_value(val)),
                }
            }
        }
        _ => println!("{pad}{}", format_value(value)),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &TextCatArgs) -> Result<()> {
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
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "-".to_string(),
    }
}
