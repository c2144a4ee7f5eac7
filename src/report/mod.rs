// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit reports.
//!
//! A [`Report`] is built once by the engine and read-only afterwards. Its
//! summary is derived from the batches at construction, so the counts always
//! agree with the findings they describe.

pub mod format;

use crate::finding::{Finding, NodeRef, Severity};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Findings produced by one rule, in the rule's traversal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBatch {
    pub rule_id: String,
    pub findings: Vec<Finding>,
}

impl RuleBatch {
    pub fn new(rule_id: &str, findings: Vec<Finding>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            findings,
        }
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Severity counts over a whole report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_batches(batches: &[RuleBatch]) -> Self {
        let mut summary = Summary::default();
        for finding in batches.iter().flat_map(|b| &b.findings) {
            match finding.severity {
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Result of one audit run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    target: String,
    timestamp: DateTime<Utc>,
    incomplete: bool,
    batches: Vec<RuleBatch>,
    summary: Summary,
}

impl Report {
    pub fn new(
        target: &str,
        timestamp: DateTime<Utc>,
        batches: Vec<RuleBatch>,
        incomplete: bool,
    ) -> Self {
        let summary = Summary::from_batches(&batches);
        Self {
            target: target.to_string(),
            timestamp,
            incomplete,
            batches,
            summary,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when the run was cancelled before every rule finished
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn batches(&self) -> &[RuleBatch] {
        &self.batches
    }

    pub fn batch(&self, rule_id: &str) -> Option<&RuleBatch> {
        self.batches.iter().find(|b| b.rule_id == rule_id)
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// All findings, batch by batch
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.batches.iter().flat_map(|b| b.findings.iter())
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&Finding> {
        self.findings().filter(|f| f.severity == severity).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }

    /// Whether any high-severity finding is present
    pub fn has_high(&self) -> bool {
        self.summary.high > 0
    }

    /// Plain-data export
    pub fn to_structured(&self) -> StructuredReport {
        StructuredReport {
            target: self.target.clone(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            incomplete: self.incomplete,
            summary: self.summary,
            findings: self
                .findings()
                .map(|f| StructuredFinding {
                    rule_id: f.rule_id.clone(),
                    severity: f.severity,
                    message: f.message.clone(),
                    node_ref: f.node.clone(),
                    metadata: f.metadata.clone(),
                })
                .collect(),
        }
    }

    /// Pretty-printed JSON of [`Report::to_structured`]
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_structured())?)
    }
}

/// Exported shape of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub target: String,
    pub timestamp: String,
    pub incomplete: bool,
    pub summary: Summary,
    pub findings: Vec<StructuredFinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub node_ref: Option<NodeRef>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn sample_report() -> Report {
        Report::new(
            "index.html",
            fixed_time(),
            vec![
                RuleBatch::new(
                    "alt-text",
                    vec![
                        Finding::new("alt-text", Severity::High, "missing alternative text"),
                        Finding::new("alt-text", Severity::Low, "empty alternative text (verify decorative intent)"),
                    ],
                ),
                RuleBatch::new("form-label", Vec::new()),
                RuleBatch::new(
                    "heading-structure",
                    vec![Finding::new("heading-structure", Severity::Medium, "empty heading")
                        .with_meta("level", 2)],
                ),
            ],
            false,
        )
    }

    #[test]
    fn test_summary_matches_batches() {
        let report = sample_report();
        let summary = report.summary();
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 1);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.total, summary.high + summary.medium + summary.low);
        let batch_total: usize = report.batches().iter().map(RuleBatch::len).sum();
        assert_eq!(summary.total, batch_total);
        assert!(report.has_high());
    }

    #[test]
    fn test_empty_report_summary() {
        let report = Report::new("empty", fixed_time(), Vec::new(), false);
        assert_eq!(report.summary(), Summary::default());
        assert!(report.is_empty());
        assert!(!report.has_high());
    }

    #[test]
    fn test_structured_shape() {
        let value = serde_json::to_value(sample_report().to_structured()).unwrap();
        assert_eq!(value["target"], "index.html");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00.000Z");
        assert_eq!(value["incomplete"], false);
        assert_eq!(value["summary"]["total"], 3);
        let first = &value["findings"][0];
        assert_eq!(first["ruleId"], "alt-text");
        assert_eq!(first["severity"], "high");
        assert!(first["nodeRef"].is_null());
        assert_eq!(value["findings"][2]["metadata"]["level"], 2);
    }

    #[test]
    fn test_to_json_is_stable() {
        let report = sample_report();
        assert_eq!(report.to_json().unwrap(), report.to_json().unwrap());
    }

    #[test]
    fn test_batch_lookup() {
        let report = sample_report();
        assert_eq!(report.batch("alt-text").map(RuleBatch::len), Some(2));
        assert!(report.batch("form-label").unwrap().is_empty());
        assert!(report.batch("nope").is_none());
        assert_eq!(report.by_severity(Severity::Medium).len(), 1);
    }
}
