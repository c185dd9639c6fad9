//! Renders batch reports for terminals, machines and pull-request comments.

use crate::core::output;
use crate::core::rules::{RuleResult, Severity};
use crate::core::validate::{BatchReport, DocumentStatus, ValidationReport};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeMap;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Include passing documents and passing checks.
    pub verbose: bool,
    /// ANSI colors in text output.
    pub color: bool,
}

pub fn render(report: &BatchReport, format: ReportFormat, options: RenderOptions) -> String {
    match format {
        ReportFormat::Text => render_text(report, options),
        ReportFormat::Json => {
            let value = to_json(report, options.verbose);
            let mut text = serde_json::to_string_pretty(&value).unwrap_or_default();
            text.push('\n');
            text
        }
        ReportFormat::Markdown => render_markdown(report, options.verbose),
    }
}

/// 0 when no document failed, 1 otherwise.
pub fn exit_code(report: &BatchReport) -> i32 {
    if report.is_success() { 0 } else { 1 }
}

/// Failure count per rule id, across all severities.
pub fn rule_failures(report: &BatchReport) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for result in report.reports.iter().flat_map(|r| &r.results) {
        if !result.passed {
            *counts.entry(result.rule_id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

fn summary_line(report: &BatchReport) -> String {
    let t = &report.totals;
    format!(
        "{}, {} passed, {} failed, {}",
        output::plural(t.documents, "document"),
        t.passed,
        t.failed,
        output::plural(t.warnings, "warning")
    )
}

fn paint(text: &str, color: bool, style: fn(&str) -> colored::ColoredString) -> String {
    if color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn failure_marker(result: &RuleResult) -> &'static str {
    match result.severity {
        Severity::Error => "x",
        Severity::Warning => "!",
    }
}

fn render_text(report: &BatchReport, options: RenderOptions) -> String {
    let color = options.color;
    let mut out = String::new();
    let headline = if report.is_success() {
        paint("PASS", color, |s| s.bright_green().bold())
    } else {
        paint("FAIL", color, |s| s.bright_red().bold())
    };
    out.push_str(&format!("validate: {} {}\n", headline, summary_line(report)));

    for doc in &report.reports {
        let has_warnings = doc.warnings().next().is_some();
        if doc.is_pass() && !has_warnings && !options.verbose {
            continue;
        }
        let label = match doc.status {
            DocumentStatus::Pass => paint("PASS", color, |s| s.green()),
            DocumentStatus::Fail => paint("FAIL", color, |s| s.red()),
        };
        out.push_str(&format!("{} {} [{}]\n", label, doc.path, doc.kind));
        if let Some(e) = &doc.io_error {
            out.push_str(&format!("  x io: {}\n", e));
        }
        if let Some(e) = &doc.parse_error {
            out.push_str(&format!("  x parse: {}\n", e));
        }
        for result in &doc.results {
            if result.passed {
                if options.verbose {
                    out.push_str(&format!("  ok {}: {}\n", result.rule_id, result.message));
                }
                continue;
            }
            let marker = match result.severity {
                Severity::Error => paint(failure_marker(result), color, |s| s.red()),
                Severity::Warning => paint(failure_marker(result), color, |s| s.yellow()),
            };
            if result.details.len() > 1 {
                out.push_str(&format!("  {} {}:\n", marker, result.rule_id));
                for detail in &result.details {
                    out.push_str(&format!("      - {}\n", detail));
                }
            } else {
                out.push_str(&format!("  {} {}: {}\n", marker, result.rule_id, result.message));
            }
        }
    }

    let failures = rule_failures(report);
    if !failures.is_empty() {
        let top: Vec<String> = failures
            .iter()
            .map(|(id, n)| format!("{}={}", id, n))
            .collect();
        out.push_str(&format!(
            "validate: failures by rule: {}\n",
            output::preview_messages(&top, 6, 60)
        ));
    }
    out
}

fn document_json(doc: &ValidationReport, verbose: bool) -> JsonValue {
    let mut checks = Map::new();
    for result in &doc.results {
        if result.passed && !verbose {
            continue;
        }
        let mut check = Map::new();
        check.insert("passed".into(), json!(result.passed));
        check.insert("severity".into(), json!(result.severity));
        check.insert("message".into(), json!(result.message));
        if !result.details.is_empty() {
            check.insert("details".into(), json!(result.details));
        }
        checks.insert(result.rule_id.clone(), JsonValue::Object(check));
    }
    let line = |r: &RuleResult| format!("{}: {}", r.rule_id, r.message);

    let mut obj = Map::new();
    obj.insert("path".into(), json!(doc.path));
    obj.insert("kind".into(), json!(doc.kind));
    obj.insert("status".into(), json!(doc.status));
    obj.insert("checks".into(), JsonValue::Object(checks));
    obj.insert("errors".into(), json!(doc.errors().map(line).collect::<Vec<_>>()));
    obj.insert(
        "warnings".into(),
        json!(doc.warnings().map(line).collect::<Vec<_>>()),
    );
    if let Some(e) = &doc.parse_error {
        obj.insert("parse_error".into(), json!(e));
    }
    if let Some(e) = &doc.io_error {
        obj.insert("io_error".into(), json!(e));
    }
    JsonValue::Object(obj)
}

/// Machine-readable report. Passing checks are included only when `verbose`.
pub fn to_json(report: &BatchReport, verbose: bool) -> JsonValue {
    let t = &report.totals;
    json!({
        "run_id": report.run_id,
        "generated_at": report.generated_at,
        "total": t.documents,
        "passed": t.passed,
        "failed": t.failed,
        "warnings": t.warnings,
        "documents": report
            .reports
            .iter()
            .map(|d| document_json(d, verbose))
            .collect::<Vec<_>>(),
        "rule_failures": rule_failures(report),
    })
}

fn render_markdown(report: &BatchReport, verbose: bool) -> String {
    let t = &report.totals;
    let mut out = String::new();
    let icon = if report.is_success() { "✅" } else { "❌" };
    out.push_str(&format!("## {} Metadata validation\n\n", icon));
    out.push_str("| Documents | Passed | Failed | Warnings |\n");
    out.push_str("|---:|---:|---:|---:|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} |\n",
        t.documents, t.passed, t.failed, t.warnings
    ));

    let failed: Vec<&ValidationReport> = report.reports.iter().filter(|d| !d.is_pass()).collect();
    if !failed.is_empty() {
        out.push_str("\n### Failures\n");
        for doc in failed {
            out.push_str(&format!("\n#### `{}` ({})\n\n", doc.path, doc.kind));
            if let Some(e) = &doc.io_error {
                out.push_str(&format!("- **io**: {}\n", output::markdown_cell(e)));
            }
            if let Some(e) = &doc.parse_error {
                out.push_str(&format!("- **parse**: {}\n", output::markdown_cell(e)));
            }
            for result in doc.errors() {
                out.push_str(&format!(
                    "- **{}**: {}\n",
                    result.rule_id,
                    output::markdown_cell(&result.message)
                ));
            }
        }
    }

    let warnings: Vec<(&ValidationReport, &RuleResult)> = report
        .reports
        .iter()
        .flat_map(|d| d.warnings().map(move |r| (d, r)))
        .collect();
    if !warnings.is_empty() {
        out.push_str("\n### Warnings\n\n");
        out.push_str("| Document | Rule | Message |\n|---|---|---|\n");
        for (doc, result) in warnings {
            out.push_str(&format!(
                "| `{}` | {} | {} |\n",
                doc.path,
                result.rule_id,
                output::markdown_cell(&result.message)
            ));
        }
    }

    if verbose {
        let passed: Vec<&ValidationReport> = report.reports.iter().filter(|d| d.is_pass()).collect();
        if !passed.is_empty() {
            out.push_str("\n<details><summary>Passing documents</summary>\n\n");
            for doc in passed {
                out.push_str(&format!("- `{}`\n", doc.path));
            }
            out.push_str("\n</details>\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::DocumentKind;
    use crate::core::validate::ValidationReport;

    fn result(id: &str, passed: bool, severity: Severity, message: &str) -> RuleResult {
        RuleResult {
            rule_id: id.to_string(),
            passed,
            message: message.to_string(),
            severity,
            details: if passed {
                Vec::new()
            } else {
                vec![message.to_string()]
            },
        }
    }

    fn sample() -> BatchReport {
        let ok = ValidationReport {
            path: "skills/ok/SKILL.md".to_string(),
            kind: DocumentKind::new("skill"),
            status: DocumentStatus::Pass,
            results: vec![
                result("name.format", true, Severity::Error, "fine"),
                result("body.line_count", false, Severity::Warning, "body is 600 lines (max 500)"),
            ],
            parse_error: None,
            io_error: None,
        };
        let bad = ValidationReport {
            path: "skills/bad/SKILL.md".to_string(),
            kind: DocumentKind::new("skill"),
            status: DocumentStatus::Fail,
            results: vec![result("name.format", false, Severity::Error, "a | b")],
            parse_error: None,
            io_error: None,
        };
        let broken = ValidationReport {
            path: "skills/broken/SKILL.md".to_string(),
            kind: DocumentKind::new("skill"),
            status: DocumentStatus::Fail,
            results: Vec::new(),
            parse_error: Some("unterminated metadata block".to_string()),
            io_error: None,
        };
        BatchReport::from_reports(vec![ok, bad, broken])
    }

    #[test]
    fn exit_code_tracks_failed_documents() {
        assert_eq!(exit_code(&sample()), 1);
        assert_eq!(exit_code(&BatchReport::from_reports(Vec::new())), 0);
    }

    #[test]
    fn text_puts_summary_first_and_hides_clean_passes() {
        let plain = RenderOptions::default();
        let text = render(&sample(), ReportFormat::Text, plain);
        let first = text.lines().next().unwrap();
        assert_eq!(first, "validate: FAIL 3 documents, 1 passed, 2 failed, 1 warning");
        assert!(text.contains("FAIL skills/bad/SKILL.md [skill]"));
        assert!(text.contains("  x parse: unterminated metadata block"));
        assert!(text.contains("  ! body.line_count: body is 600 lines (max 500)"));
        assert!(!text.contains("ok name.format"));

        let verbose = render(
            &sample(),
            ReportFormat::Text,
            RenderOptions {
                verbose: true,
                color: false,
            },
        );
        assert!(verbose.contains("  ok name.format: fine"));
    }

    #[test]
    fn json_shape_has_totals_checks_and_rule_failures() {
        let value = to_json(&sample(), false);
        assert_eq!(value["total"], 3);
        assert_eq!(value["failed"], 2);
        assert_eq!(value["warnings"], 1);
        let bad = &value["documents"][1];
        assert_eq!(bad["status"], "fail");
        assert_eq!(bad["checks"]["name.format"]["passed"], false);
        assert_eq!(bad["checks"]["name.format"]["severity"], "error");
        assert_eq!(bad["errors"][0], "name.format: a | b");
        assert!(value["documents"][0]["checks"].get("name.format").is_none());
        assert_eq!(
            value["documents"][2]["parse_error"],
            "unterminated metadata block"
        );
        assert_eq!(value["rule_failures"]["name.format"], 1);
        assert_eq!(value["rule_failures"]["body.line_count"], 1);
    }

    #[test]
    fn markdown_escapes_table_cells_and_lists_failures() {
        let md = render(&sample(), ReportFormat::Markdown, RenderOptions::default());
        assert!(md.starts_with("## ❌ Metadata validation"));
        assert!(md.contains("| 3 | 1 | 2 | 1 |"));
        assert!(md.contains("#### `skills/bad/SKILL.md` (skill)"));
        assert!(md.contains("- **name.format**: a \\| b"));
        assert!(md.contains("| `skills/ok/SKILL.md` | body.line_count |"));
    }
}
