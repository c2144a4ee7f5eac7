// SPDX-License-Identifier: PMPL-1.0-or-later
//! Finding types produced by audit rules.

use crate::document::{NodeId, NodeTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks assistive-technology users outright
    High,
    /// Degrades the experience, should be fixed
    Medium,
    /// Needs human review
    Low,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Lower-case label used in structured output
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// Reference to the node a finding was raised against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Arena index of the node within its tree
    pub id: NodeId,
    /// Compact selector, e.g. `img#hero.banner`
    pub selector: String,
}

/// A single issue reported by one rule against one (or no) node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Identifier of the rule that produced this finding (e.g. "alt-text")
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Offending node, if the finding is tied to one
    pub node: Option<NodeRef>,
    /// Structured details (measured ratio, offending value, ...)
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Finding {
    /// Create a new finding
    pub fn new(rule_id: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.into(),
            node: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Meta-finding recorded when a rule could not complete
    pub fn rule_skipped(rule_id: &str, reason: &str) -> Self {
        Finding::new(rule_id, Severity::Low, format!("rule skipped: {}", reason))
            .with_meta("skipped", true)
    }

    /// Attach the offending node
    pub fn with_node(mut self, tree: &NodeTree, id: NodeId) -> Self {
        self.node = Some(NodeRef {
            id,
            selector: tree.describe(id),
        });
        self
    }

    /// Attach a metadata entry
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Whether this is a "rule skipped" meta-finding
    pub fn is_skip_marker(&self) -> bool {
        self.metadata.get("skipped") == Some(&serde_json::Value::Bool(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_rule_skipped_marker() {
        let finding = Finding::rule_skipped("alt-text", "panicked: boom");
        assert_eq!(finding.severity, Severity::Low);
        assert_eq!(finding.message, "rule skipped: panicked: boom");
        assert!(finding.is_skip_marker());
        assert!(!Finding::new("alt-text", Severity::High, "x").is_skip_marker());
    }

    #[test]
    fn test_with_node_records_selector() {
        let mut tree = NodeTree::new();
        let root = tree.push(None, "body", Vec::new());
        let img = tree.push(
            Some(root),
            "img",
            vec![("id".to_string(), "hero".to_string())],
        );
        let finding = Finding::new("alt-text", Severity::High, "missing alternative text")
            .with_node(&tree, img);
        let node = finding.node.expect("node ref");
        assert_eq!(node.id, img);
        assert_eq!(node.selector, "img#hero");
    }
}
