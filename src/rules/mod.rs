// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility rules.
//!
//! Each rule is a stateless check over a [`DocumentModel`]. Rules traverse
//! the tree single-threaded and in pre-order so their findings come out in a
//! reproducible order; the engine decides how rules are scheduled relative to
//! each other.

pub mod alt_text;
pub mod aria;
pub mod contrast;
pub mod focus;
pub mod forms;
pub mod headings;
pub mod keyboard;

use crate::cancel::CancellationToken;
use crate::color::LuminanceModel;
use crate::document::{DocumentModel, Node, NodeId, NodeTree, StyleSnapshot};
use crate::finding::{Finding, Severity};
use std::sync::Arc;

/// Trait implemented by all rules
pub trait Rule: Send + Sync {
    /// Stable identifier used in findings and in rule selection
    fn id(&self) -> &str;

    /// Human-readable category
    fn category(&self) -> &str;

    /// Short description of what this rule checks
    fn description(&self) -> &str;

    /// Severity of this rule's primary finding
    fn default_severity(&self) -> Severity;

    /// Inspect the document. Must not panic on well-formed input and must
    /// not mutate anything reachable from `ctx`.
    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding>;
}

/// What a rule sees during one audit run
pub struct AuditContext<'a> {
    document: &'a dyn DocumentModel,
    token: &'a CancellationToken,
}

impl<'a> AuditContext<'a> {
    pub fn new(document: &'a dyn DocumentModel, token: &'a CancellationToken) -> Self {
        Self { document, token }
    }

    pub fn document(&self) -> &'a dyn DocumentModel {
        self.document
    }

    pub fn tree(&self) -> &'a NodeTree {
        self.document.tree()
    }

    /// Pre-order traversal that stops yielding once the run is cancelled
    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + 'a {
        let token = self.token;
        self.document
            .nodes()
            .take_while(move |_| !token.is_cancelled())
    }

    pub fn style(&self, node: NodeId) -> StyleSnapshot {
        self.document.style(node)
    }

    pub fn focused_style(&self, node: NodeId) -> StyleSnapshot {
        self.document.focused_style(node)
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.document.is_visible(node)
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Ordered set of rules available to an engine
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Registry with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// All built-in rules with the default luminance model
    pub fn with_defaults() -> Self {
        Self::with_luminance(LuminanceModel::default())
    }

    /// All built-in rules, contrast computed with `model`
    pub fn with_luminance(model: LuminanceModel) -> Self {
        let mut registry = Self::empty();
        registry
            .register(Arc::new(alt_text::AltTextRule))
            .register(Arc::new(forms::FormLabelRule))
            .register(Arc::new(contrast::ContrastRule::new(model)))
            .register(Arc::new(keyboard::KeyboardRule))
            .register(Arc::new(headings::HeadingRule))
            .register(Arc::new(focus::FocusIndicatorRule))
            .register(Arc::new(aria::AriaRule));
        registry
    }

    /// Add a rule. A rule with an id already present replaces it in place.
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> &mut Self {
        match self.rules.iter().position(|r| r.id() == rule.id()) {
            Some(idx) => self.rules[idx] = rule,
            None => self.rules.push(rule),
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Rule ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parsed `tabindex`, `None` when absent or not an integer
pub fn tab_index(node: &Node) -> Option<i64> {
    node.attr("tabindex")?.trim().parse().ok()
}

fn is_natively_focusable(node: &Node) -> bool {
    let focusable = match node.tag() {
        "a" | "area" => node.has_attr("href"),
        "button" | "select" | "textarea" | "summary" => true,
        "input" => !node
            .attr("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden")),
        _ => false,
    };
    focusable && !node.has_attr("disabled")
}

/// Whether the node takes part in sequential keyboard navigation.
///
/// A negative `tabindex` always removes the node; any other integer adds it.
pub fn is_focusable(node: &Node) -> bool {
    match tab_index(node) {
        Some(index) => index >= 0,
        None => is_natively_focusable(node),
    }
}

#[cfg(test)]
pub(crate) fn run_rule(rule: &dyn Rule, html: &str) -> Vec<Finding> {
    let doc = crate::html::HtmlDocument::parse("test.html", html);
    let token = CancellationToken::new();
    rule.check(&AuditContext::new(&doc, &token))
}
