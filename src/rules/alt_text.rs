// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alternative text - WCAG 1.1.1 Non-text Content
//!
//! One finding per offending `<img>`, first match wins:
//! - no `alt` attribute: high
//! - empty `alt`: low, a review flag for decorative intent
//! - generic `alt` such as "photo" or "Logo.": medium

use crate::finding::{Finding, Severity};
use crate::rules::{AuditContext, Rule};

pub const ID: &str = "alt-text";

/// Descriptions that say nothing about the image
const GENERIC_ALT_VALUES: &[&str] = &[
    "image", "picture", "photo", "img", "graphic", "logo", "icon", "button", "link", "untitled",
    "unnamed",
];

/// Case-insensitive match against the generic list, allowing a trailing period
pub fn is_generic_alt(alt: &str) -> bool {
    let lower = alt.trim().to_lowercase();
    let value = lower.strip_suffix('.').unwrap_or(&lower);
    GENERIC_ALT_VALUES.contains(&value)
}

/// Rule for image alternative text
pub struct AltTextRule;

impl Rule for AltTextRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Non-text Content"
    }

    fn description(&self) -> &str {
        "Images carry a meaningful alt attribute (WCAG 1.1.1)"
    }

    fn default_severity(&self) -> Severity {
        Severity::High
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let mut findings = Vec::new();

        for node in ctx.nodes().filter(|n| n.is("img")) {
            let finding = match node.attr("alt") {
                None => Finding::new(ID, Severity::High, "missing alternative text"),
                Some(alt) if alt.trim().is_empty() => Finding::new(
                    ID,
                    Severity::Low,
                    "empty alternative text (verify decorative intent)",
                ),
                Some(alt) if is_generic_alt(alt) => {
                    Finding::new(ID, Severity::Medium, "generic alternative text")
                        .with_meta("alt", alt)
                }
                Some(_) => continue,
            };

            let finding = match node.attr("src") {
                Some(src) => finding.with_meta("src", src),
                None => finding,
            };
            findings.push(finding.with_node(tree, node.id()));
        }

        findings
    }
}
