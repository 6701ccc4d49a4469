//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::escape_csv;
use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a list.
///
/// Text formats use `headers`/`rows`; JSON and YAML serialize `records` instead so
/// numbers stay numbers.
pub fn print_list<T: Serialize + ?Sized>(
    format: OutputFormat,
    headers: &[&str],
    rows: &[Vec<String>],
    records: &T,
) -> Result<()> {
    match effective_format(format, true) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(records).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            println!("{}", headers.join(","));
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| escape_csv(c)).collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Md => {
            println!("| {} |", headers.join(" | "));
            println!("|{}", "---|".repeat(headers.len()));
            for row in rows {
                println!("| {} |", row.join(" | "));
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().map(|h| h.to_uppercase()));
            for row in rows {
                builder.push_record(row.iter().cloned());
            }
            let mut table = builder.build();
            table.with(Style::blank());
            println!("{}", table);
        }
    }
    Ok(())
}

/// Print a single record as YAML (default) or JSON
pub fn print_record<T: Serialize + ?Sized>(format: OutputFormat, record: &T) -> Result<()> {
    match effective_format(format, false) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(record).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Format a number with a fixed count of decimals
pub fn format_value(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, value)
}
