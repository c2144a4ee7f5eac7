// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard navigation - WCAG 2.4.3 Focus Order, 2.1.1 Keyboard
//!
//! For every focusable node:
//! - a positive `tabindex` overrides document order and is flagged
//! - a node that is not visible but still takes focus is flagged

use crate::finding::{Finding, Severity};
use crate::rules::{is_focusable, tab_index, AuditContext, Rule};

pub const ID: &str = "keyboard-navigation";

/// Keyboard navigation rule
pub struct KeyboardRule;

impl Rule for KeyboardRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Keyboard"
    }

    fn description(&self) -> &str {
        "Focusable nodes follow document order and are visible (WCAG 2.4.3, 2.1.1)"
    }

    fn default_severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let mut findings = Vec::new();

        for node in ctx.nodes().filter(|n| is_focusable(n)) {
            if let Some(index) = tab_index(node).filter(|i| *i > 0) {
                findings.push(
                    Finding::new(ID, Severity::Medium, "explicit positive tab order discouraged")
                        .with_meta("tabindex", index)
                        .with_node(tree, node.id()),
                );
            }

            if !ctx.is_visible(node.id()) {
                findings.push(
                    Finding::new(ID, Severity::Medium, "hidden node remains keyboard-focusable")
                        .with_node(tree, node.id()),
                );
            }
        }

        findings
    }
}
