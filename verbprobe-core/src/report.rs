// Rendering of batch results

use crate::batch::{BatchResult, Disposition};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use verbprobe_scanner::{HttpMethod, ScanOutcome};
use verbprobe_scanner::result::UNREACHABLE_MESSAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Text,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "text" => Some(ReportFormat::Text),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

pub fn generate_report(result: &BatchResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => generate_json_report(result),
        ReportFormat::Text => Ok(generate_text_report(result)),
        ReportFormat::Csv => Ok(generate_csv_report(result)),
        ReportFormat::Markdown => Ok(generate_markdown_report(result)),
    }
}

/// The merged URL map as JSON with a 4-space indent.
pub fn generate_json_report(result: &BatchResult) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    result.merged().serialize(&mut ser)?;

    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn colorize_status(status: u16) -> String {
    let text = status.to_string();
    match status {
        100..=199 => text.white().to_string(),
        200..=299 => text.green().to_string(),
        300..=399 => text.cyan().to_string(),
        400..=499 => text.yellow().to_string(),
        500..=599 => text.red().to_string(),
        _ => text,
    }
}

pub fn generate_text_report(result: &BatchResult) -> String {
    let mut report = String::new();
    let divider = "━".repeat(60);

    report.push_str(&format!("{}\n\n", divider));
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Inputs: {}\n", result.len()));
    report.push_str(&format!("  URLs scanned: {}\n", result.scanned_count()));
    report.push_str(&format!("  Unreachable: {}\n", result.unreachable_count()));
    report.push_str(&format!("  Rejected inputs: {}\n", result.diagnostics().len()));
    report.push_str(&format!("\n{}\n\n", divider));

    for (url, outcome) in result.merged() {
        report.push_str(&format!("## {}\n", url));
        match outcome {
            ScanOutcome::Methods(methods) => {
                for (method, status) in methods.iter() {
                    report.push_str(&format!("  {:<8} {}\n", method.as_str(), colorize_status(status)));
                }
                let refused: Vec<&str> = HttpMethod::ALL
                    .iter()
                    .filter(|m| !methods.contains(**m))
                    .map(|m| m.as_str())
                    .collect();
                if !refused.is_empty() {
                    report.push_str(&format!(
                        "  {}\n",
                        format!("unavailable: {}", refused.join(", ")).bright_black()
                    ));
                }
            }
            ScanOutcome::Unreachable => {
                report.push_str(&format!("  {}\n", UNREACHABLE_MESSAGE.red()));
            }
        }
        report.push('\n');
    }

    let diagnostics = result.diagnostics();
    if !diagnostics.is_empty() {
        report.push_str("## Rejected inputs\n");
        for message in diagnostics {
            report.push_str(&format!("  {}\n", message));
        }
        report.push('\n');
    }

    report
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row per accepted method, one row per unreachable URL and one per
/// rejected input.
pub fn generate_csv_report(result: &BatchResult) -> String {
    let mut report = String::from("input,disposition,method,status\n");

    for entry in result.entries() {
        let input = csv_field(&entry.input);
        match &entry.disposition {
            Disposition::Invalid => report.push_str(&format!("{},invalid,,\n", input)),
            Disposition::UnsupportedScheme => {
                report.push_str(&format!("{},unsupported_scheme,,\n", input))
            }
            Disposition::Scanned(ScanOutcome::Unreachable) => {
                report.push_str(&format!("{},unreachable,,\n", input))
            }
            Disposition::Scanned(ScanOutcome::Methods(methods)) => {
                for (method, status) in methods.iter() {
                    report.push_str(&format!("{},available,{},{}\n", input, method, status));
                }
            }
        }
    }

    report
}

pub fn generate_markdown_report(result: &BatchResult) -> String {
    let mut report = String::from("# HTTP Method Report\n\n");

    let header: Vec<&str> = HttpMethod::ALL.iter().map(|m| m.as_str()).collect();
    report.push_str(&format!("| URL | {} |\n", header.join(" | ")));
    report.push_str(&format!("|-----|{}\n", "-----|".repeat(header.len())));

    for (url, outcome) in result.merged() {
        let cells: Vec<String> = HttpMethod::ALL
            .iter()
            .map(|method| {
                outcome
                    .report()
                    .and_then(|methods| methods.get(*method))
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "-".to_string())
            })
            .collect();
        report.push_str(&format!("| {} | {} |\n", url.replace('|', "\\|"), cells.join(" | ")));
    }

    let diagnostics = result.diagnostics();
    if !diagnostics.is_empty() {
        report.push_str("\n## Rejected inputs\n\n");
        for message in diagnostics {
            report.push_str(&format!("- {}\n", message));
        }
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
