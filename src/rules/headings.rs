// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading structure - WCAG 1.3.1 Info and Relationships, 2.4.6 Headings and Labels
//!
//! Walks `h1`..`h6` in document order and reports empty headings, skipped
//! levels (h2 followed by h4) and more than one top-level heading.

use crate::document::Node;
use crate::finding::{Finding, Severity};
use crate::rules::{AuditContext, Rule};

pub const ID: &str = "heading-structure";

/// Level of an `h1`..`h6` node
pub fn heading_level(node: &Node) -> Option<u8> {
    match node.tag() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Heading hierarchy rule
pub struct HeadingRule;

impl Rule for HeadingRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Info and Relationships"
    }

    fn description(&self) -> &str {
        "Headings are non-empty and nest without skipping levels (WCAG 1.3.1, 2.4.6)"
    }

    fn default_severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let mut findings = Vec::new();
        let mut previous: u8 = 0;
        let mut top_level = 0usize;

        for node in ctx.nodes() {
            let Some(level) = heading_level(node) else {
                continue;
            };
            if level == 1 {
                top_level += 1;
            }

            if tree.text_content(node.id()).trim().is_empty() {
                findings.push(
                    Finding::new(ID, Severity::Medium, "empty heading")
                        .with_meta("level", level)
                        .with_node(tree, node.id()),
                );
            }

            if previous > 0 && level > previous + 1 {
                findings.push(
                    Finding::new(
                        ID,
                        Severity::Medium,
                        format!("heading level skipped (h{}→h{})", previous, level),
                    )
                    .with_meta("from", previous)
                    .with_meta("to", level)
                    .with_node(tree, node.id()),
                );
            }
            previous = level;
        }

        if top_level > 1 {
            findings.push(Finding::new(
                ID,
                Severity::Medium,
                format!("multiple top-level headings: {}", top_level),
            ));
        }

        findings
    }
}
