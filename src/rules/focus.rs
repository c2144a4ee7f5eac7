// SPDX-License-Identifier: PMPL-1.0-or-later
//! Focus visibility - WCAG 2.4.7 Focus Visible
//!
//! Reads each focusable node's style in the focused state and reports it
//! when the outline is suppressed and no `box-shadow` replaces it.
//!
//! This is an approximation. No focus event is dispatched, so scripted focus
//! styling and substitutes other than `box-shadow` (borders, background
//! changes) are not seen. Nodes whose focused style is unknown pass.

use crate::finding::{Finding, Severity};
use crate::rules::{is_focusable, AuditContext, Rule};

pub const ID: &str = "focus-indicator";

/// Focus indicator rule
pub struct FocusIndicatorRule;

impl Rule for FocusIndicatorRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Focus Visible"
    }

    fn description(&self) -> &str {
        "Focusable nodes show a visible focus indicator (WCAG 2.4.7)"
    }

    fn default_severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let mut findings = Vec::new();

        for node in ctx.nodes().filter(|n| is_focusable(n)) {
            let snapshot = ctx.focused_style(node.id());
            let Some(style) = snapshot.resolved() else {
                continue;
            };
            if !style.outline_suppressed() || style.box_shadow.is_some() {
                continue;
            }

            findings.push(
                Finding::new(ID, Severity::Medium, "no visible focus indicator")
                    .with_meta("outline_style", style.outline_style.as_str())
                    .with_meta("outline_width", style.outline_width)
                    .with_node(tree, node.id()),
            );
        }

        findings
    }
}
