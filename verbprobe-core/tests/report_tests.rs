// Tests for report generation functionality

use verbprobe_core::batch::{BatchEntry, BatchResult, Disposition};
use verbprobe_core::report::{
    ReportFormat, generate_csv_report, generate_json_report, generate_markdown_report,
    generate_report, generate_text_report, save_report,
};
use verbprobe_scanner::{HttpMethod, MethodResult, ProbeOutcome, ScanOutcome};

fn outcome(statuses: &[(HttpMethod, u16)]) -> ScanOutcome {
    ScanOutcome::from_results(
        statuses
            .iter()
            .map(|(m, s)| MethodResult::new(*m, ProbeOutcome::from_status(*s))),
    )
}

fn entry(input: &str, disposition: Disposition) -> BatchEntry {
    BatchEntry {
        input: input.to_string(),
        disposition,
    }
}

fn sample_result() -> BatchResult {
    let all_ok: Vec<(HttpMethod, u16)> = HttpMethod::ALL.iter().map(|m| (*m, 200)).collect();
    BatchResult::new(vec![
        entry("http://example.com", Disposition::Scanned(outcome(&all_ok))),
        entry("not a url", Disposition::Invalid),
        entry("ftp://example.com", Disposition::UnsupportedScheme),
        entry("http://down.example", Disposition::Scanned(ScanOutcome::Unreachable)),
    ])
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv));
    assert_eq!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown));
    assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("Text"), Some(ReportFormat::Text));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert_eq!(ReportFormat::from_str("xml"), None);
    assert_eq!(ReportFormat::from_str(""), None);
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_matches_merged_map() {
    let all_ok: Vec<(HttpMethod, u16)> = HttpMethod::ALL.iter().map(|m| (*m, 200)).collect();
    let result = BatchResult::new(vec![
        entry("http://example.com", Disposition::Scanned(outcome(&all_ok))),
        entry("not a url", Disposition::Invalid),
        entry("ftp://example.com", Disposition::UnsupportedScheme),
    ]);

    let json = generate_json_report(&result).unwrap();
    let expected = r#"{
    "http://example.com": {
        "GET": 200,
        "POST": 200,
        "PUT": 200,
        "DELETE": 200,
        "OPTIONS": 200,
        "HEAD": 200,
        "PATCH": 200
    }
}"#;
    assert_eq!(json, expected);
}

#[test]
fn test_json_report_unreachable_sentinel() {
    let result = BatchResult::new(vec![entry(
        "http://down.example",
        Disposition::Scanned(ScanOutcome::Unreachable),
    )]);

    let json = generate_json_report(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["http://down.example"],
        "No methods available or URL unreachable."
    );
}

#[test]
fn test_json_report_empty_batch() {
    let json = generate_json_report(&BatchResult::default()).unwrap();
    assert_eq!(json, "{}");
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_summary() {
    colored::control::set_override(false);
    let report = generate_text_report(&sample_result());

    assert!(report.contains("Inputs: 4"));
    assert!(report.contains("URLs scanned: 2"));
    assert!(report.contains("Unreachable: 1"));
    assert!(report.contains("Rejected inputs: 2"));
    assert!(report.contains("## http://example.com"));
    assert!(report.contains("No methods available or URL unreachable."));
    assert!(report.contains("String \"not a url\" is not a link."));
}

#[test]
fn test_text_report_lists_unavailable_methods() {
    colored::control::set_override(false);
    let result = BatchResult::new(vec![entry(
        "http://readonly.example",
        Disposition::Scanned(outcome(&[(HttpMethod::Get, 200), (HttpMethod::Head, 200)])),
    )]);

    let report = generate_text_report(&result);
    assert!(report.contains("GET"));
    assert!(report.contains("unavailable: POST, PUT, DELETE, OPTIONS, PATCH"));
}

// ============================================================================
// CSV and Markdown Report Tests
// ============================================================================

#[test]
fn test_csv_report_rows() {
    let csv = generate_csv_report(&sample_result());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "input,disposition,method,status");
    assert!(lines.contains(&"http://example.com,available,GET,200"));
    assert!(lines.contains(&"http://example.com,available,PATCH,200"));
    assert!(lines.contains(&"not a url,invalid,,"));
    assert!(lines.contains(&"ftp://example.com,unsupported_scheme,,"));
    assert!(lines.contains(&"http://down.example,unreachable,,"));
    // header + 7 methods + 3 single rows
    assert_eq!(lines.len(), 11);
}

#[test]
fn test_csv_report_escapes_fields() {
    let result = BatchResult::new(vec![entry("a,\"b\"", Disposition::Invalid)]);
    let csv = generate_csv_report(&result);
    assert!(csv.contains("\"a,\"\"b\"\"\",invalid,,"));
}

#[test]
fn test_markdown_report_table() {
    let md = generate_markdown_report(&sample_result());

    assert!(md.contains("| URL | GET | POST | PUT | DELETE | OPTIONS | HEAD | PATCH |"));
    assert!(md.contains("| http://example.com | 200 | 200 | 200 | 200 | 200 | 200 | 200 |"));
    assert!(md.contains("| http://down.example | - | - | - | - | - | - | - |"));
    assert!(md.contains("- Link \"ftp://example.com\" is not an HTTP/HTTPS link."));
}

#[test]
fn test_generate_report_dispatches_on_format() {
    let result = sample_result();
    let json = generate_report(&result, ReportFormat::Json).unwrap();
    assert!(json.starts_with('{'));
    let csv = generate_report(&result, ReportFormat::Csv).unwrap();
    assert!(csv.starts_with("input,"));
}

#[test]
fn test_save_report() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");

    save_report("{}", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
}
