// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form labels - WCAG 3.3.2 Labels or Instructions, 1.3.1 Info and Relationships
//!
//! A control is labelled when any of these hold:
//! - its `id` is referenced by a `<label for>`
//! - it carries a non-empty `aria-label` or `aria-labelledby`
//! - it sits inside a `<label>`
//!
//! A placeholder never counts as a label.

use crate::document::Node;
use crate::finding::{Finding, Severity};
use crate::rules::{AuditContext, Rule};
use std::collections::HashSet;

pub const ID: &str = "form-label";

/// Input types that never need a label
const EXEMPT_INPUT_TYPES: &[&str] = &["hidden", "button", "submit", "reset"];

/// Type of a labellable control, `None` for anything else
fn control_type(node: &Node) -> Option<String> {
    match node.tag() {
        "input" => {
            let kind = node
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "text".to_string());
            (!EXEMPT_INPUT_TYPES.contains(&kind.as_str())).then_some(kind)
        }
        "select" | "textarea" => Some(node.tag().to_string()),
        _ => None,
    }
}

fn non_empty_attr<'n>(node: &'n Node, name: &str) -> Option<&'n str> {
    node.attr(name).map(str::trim).filter(|v| !v.is_empty())
}

/// Rule for form control labels
pub struct FormLabelRule;

impl Rule for FormLabelRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Labels or Instructions"
    }

    fn description(&self) -> &str {
        "Form controls have an associated label (WCAG 3.3.2)"
    }

    fn default_severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let label_targets: HashSet<&str> = tree
            .pre_order()
            .filter(|n| n.is("label"))
            .filter_map(|n| non_empty_attr(n, "for"))
            .collect();

        let mut findings = Vec::new();
        for node in ctx.nodes() {
            let Some(kind) = control_type(node) else {
                continue;
            };

            let explicit = non_empty_attr(node, "id").is_some_and(|id| label_targets.contains(id));
            let aria = non_empty_attr(node, "aria-label").is_some()
                || non_empty_attr(node, "aria-labelledby").is_some();
            let wrapped = tree.ancestors(node.id()).any(|a| a.is("label"));
            if explicit || aria || wrapped {
                continue;
            }

            let mut finding = Finding::new(ID, Severity::High, "missing label")
                .with_meta("type", kind)
                .with_node(tree, node.id());
            if let Some(placeholder) = non_empty_attr(node, "placeholder") {
                finding = finding.with_meta("placeholder", placeholder);
            }
            findings.push(finding);
        }

        findings
    }
}
