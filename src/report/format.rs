// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rendering of audit reports.
//!
//! Supports multiple output formats:
//! - Text: human-readable findings grouped by severity
//! - JSON: the structured report artifact
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use crate::finding::Severity;
use crate::report::Report;
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report in the requested format
pub fn generate_report(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(report),
        OutputFormat::Json => generate_json_report(report),
        OutputFormat::Sarif => generate_sarif_report(report),
    }
}

fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("=== Accessibility Audit: {} ===\n", report.target()));
    output.push_str(&format!("Audited at {}\n\n", report.timestamp().to_rfc3339()));

    if report.is_incomplete() {
        output.push_str("WARNING: audit was cancelled, results are partial\n\n");
    }

    let summary = report.summary();
    if summary.total == 0 {
        output.push_str("No accessibility issues found. All checks passed.\n");
        return output;
    }

    output.push_str(&format!(
        "Found {} issue(s): {} high, {} medium, {} low\n\n",
        summary.total, summary.high, summary.medium, summary.low
    ));

    for severity in Severity::ALL {
        let findings = report.by_severity(severity);
        if findings.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity, findings.len()));

        for finding in findings {
            output.push_str(&format!("[{}] {}\n", finding.rule_id, finding.message));

            if let Some(node) = &finding.node {
                output.push_str(&format!("  Node: {} ({})\n", node.selector, node.id));
            }

            let details: Vec<String> = finding
                .metadata
                .iter()
                .filter(|(key, _)| key.as_str() != "skipped")
                .map(|(key, value)| match value {
                    serde_json::Value::String(s) => format!("{}={}", key, s),
                    other => format!("{}={}", key, other),
                })
                .collect();
            if !details.is_empty() {
                output.push_str(&format!("  Details: {}\n", details.join(", ")));
            }

            output.push('\n');
        }
    }

    if report.has_high() {
        output.push_str("RESULT: FAIL (high severity issues found)\n");
    } else {
        output.push_str("RESULT: PASS WITH WARNINGS\n");
    }

    output
}

fn generate_json_report(report: &Report) -> String {
    report
        .to_json()
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
struct SarifRule {
    id: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
    #[serde(rename = "logicalLocations", skip_serializing_if = "Vec::is_empty")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
    kind: String,
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}

fn generate_sarif_report(report: &Report) -> String {
    let results: Vec<SarifResult> = report
        .findings()
        .map(|f| SarifResult {
            rule_id: f.rule_id.clone(),
            level: sarif_level(f.severity).to_string(),
            message: SarifMessage {
                text: f.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation {
                        uri: report.target().to_string(),
                    },
                },
                logical_locations: f
                    .node
                    .iter()
                    .map(|node| SarifLogicalLocation {
                        fully_qualified_name: node.selector.clone(),
                        kind: "element".to_string(),
                    })
                    .collect(),
            }],
        })
        .collect();

    let sarif = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "a11y-audit".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    rules: report
                        .batches()
                        .iter()
                        .map(|b| SarifRule {
                            id: b.rule_id.clone(),
                        })
                        .collect(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&sarif)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e))
}
