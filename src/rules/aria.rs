// SPDX-License-Identifier: PMPL-1.0-or-later
//! ARIA attributes - WCAG 4.1.2 Name, Role, Value
//!
//! Checks that:
//! - every id listed in `aria-labelledby` / `aria-describedby` exists
//! - every token of a `role` attribute is a WAI-ARIA 1.2 role

use crate::finding::{Finding, Severity};
use crate::rules::{AuditContext, Rule};

pub const ID: &str = "aria-attributes";

/// Attributes holding whitespace-separated id references
const REFERENCE_ATTRIBUTES: &[&str] = &["aria-labelledby", "aria-describedby"];

/// Concrete WAI-ARIA 1.2 roles; abstract roles are not allowed in markup
const VALID_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "application",
    "article",
    "banner",
    "blockquote",
    "button",
    "caption",
    "cell",
    "checkbox",
    "code",
    "columnheader",
    "combobox",
    "complementary",
    "contentinfo",
    "definition",
    "deletion",
    "dialog",
    "directory",
    "document",
    "emphasis",
    "feed",
    "figure",
    "form",
    "generic",
    "grid",
    "gridcell",
    "group",
    "heading",
    "img",
    "insertion",
    "link",
    "list",
    "listbox",
    "listitem",
    "log",
    "main",
    "marquee",
    "math",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "meter",
    "navigation",
    "none",
    "note",
    "option",
    "paragraph",
    "presentation",
    "progressbar",
    "radio",
    "radiogroup",
    "region",
    "row",
    "rowgroup",
    "rowheader",
    "scrollbar",
    "search",
    "searchbox",
    "separator",
    "slider",
    "spinbutton",
    "status",
    "strong",
    "subscript",
    "superscript",
    "switch",
    "tab",
    "table",
    "tablist",
    "tabpanel",
    "term",
    "textbox",
    "time",
    "timer",
    "toolbar",
    "tooltip",
    "tree",
    "treegrid",
    "treeitem",
];

/// Case-insensitive membership in the role vocabulary
pub fn is_valid_role(role: &str) -> bool {
    let role = role.to_ascii_lowercase();
    VALID_ROLES.contains(&role.as_str())
}

/// ARIA reference and role rule
pub struct AriaRule;

impl Rule for AriaRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Name, Role, Value"
    }

    fn description(&self) -> &str {
        "ARIA references resolve and roles are valid (WCAG 4.1.2)"
    }

    fn default_severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let known_ids = tree.element_ids();
        let mut findings = Vec::new();

        for node in ctx.nodes() {
            for attribute in REFERENCE_ATTRIBUTES {
                let Some(value) = node.attr(attribute) else {
                    continue;
                };
                for reference in value.split_whitespace() {
                    if !known_ids.contains(reference) {
                        findings.push(
                            Finding::new(
                                ID,
                                Severity::High,
                                format!("dangling reference: {}", reference),
                            )
                            .with_meta("attribute", *attribute)
                            .with_node(tree, node.id()),
                        );
                    }
                }
            }

            if let Some(roles) = node.attr("role") {
                for role in roles.split_whitespace().filter(|r| !is_valid_role(r)) {
                    findings.push(
                        Finding::new(ID, Severity::High, format!("invalid role: {}", role))
                            .with_meta("role", role)
                            .with_node(tree, node.id()),
                    );
                }
            }
        }

        findings
    }
}
