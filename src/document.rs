// SPDX-License-Identifier: PMPL-1.0-or-later
//! Read-only document model consumed by audit rules.
//!
//! A host adapts its own tree (a parsed HTML snapshot, a live browser tree,
//! a server-rendered fixture) by building a [`NodeTree`] and implementing
//! [`DocumentModel`] for style and geometry queries. Rules never touch the
//! host representation directly.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Opaque handle to a node inside a [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element in the audited tree
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Lower-cased tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Attributes in the order the adapter supplied them
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up an attribute by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Text held directly by this node (not by its descendants)
    pub fn own_text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena of nodes. Children are owned through the arena; parent links are
/// plain ids used for lookup only.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as a root when `None`).
    ///
    /// Tag and attribute names are lower-cased.
    pub fn push(
        &mut self,
        parent: Option<NodeId>,
        tag: &str,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        self.nodes.push(Node {
            id,
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            text: String::new(),
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Append text directly owned by `id`
    pub fn push_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.text.push_str(text);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first root pushed, if any
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.parent.is_none()).map(|n| n.id)
    }

    /// Depth-first, pre-order traversal over every root
    pub fn pre_order(&self) -> PreOrder<'_> {
        let stack = self
            .nodes
            .iter()
            .rev()
            .filter(|n| n.parent.is_none())
            .map(|n| n.id)
            .collect();
        PreOrder { tree: self, stack }
    }

    /// Depth-first, pre-order traversal of the subtree rooted at `root`
    pub fn pre_order_from(&self, root: NodeId) -> PreOrder<'_> {
        let stack = if root.0 < self.nodes.len() { vec![root] } else { Vec::new() };
        PreOrder { tree: self, stack }
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        let mut current = self.get(id).and_then(|n| n.parent);
        std::iter::from_fn(move || {
            let node = self.get(current?)?;
            current = node.parent;
            Some(node)
        })
    }

    /// Own text followed by the text content of each child, recursively
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.pre_order_from(id) {
            out.push_str(&node.text);
        }
        out
    }

    /// Compact selector for messages: `tag#id.class1.class2`
    pub fn describe(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return format!("<unknown {}>", id);
        };
        let mut out = node.tag.clone();
        if let Some(element_id) = node.attr("id").map(str::trim).filter(|v| !v.is_empty()) {
            out.push('#');
            out.push_str(element_id);
        }
        if let Some(classes) = node.attr("class") {
            for class in classes.split_whitespace() {
                out.push('.');
                out.push_str(class);
            }
        }
        out
    }

    /// Every `id` attribute value declared in the tree
    pub fn element_ids(&self) -> BTreeSet<&str> {
        self.nodes
            .iter()
            .filter_map(|n| n.attr("id"))
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// Iterator returned by [`NodeTree::pre_order`]
pub struct PreOrder<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id)?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}

/// CSS `visibility`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
    Collapse,
}

/// Rendered box size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const ZERO: BoundingBox = BoundingBox { width: 0.0, height: 0.0 };

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Post-cascade style of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    /// Foreground colour as a CSS value
    pub color: String,
    /// Background colour as a CSS value
    pub background_color: String,
    /// Font size in px
    pub font_size: f64,
    pub outline_style: String,
    /// Outline width in px
    pub outline_width: f64,
    pub box_shadow: Option<String>,
    pub visibility: Visibility,
    pub display_none: bool,
    pub opacity: f64,
    /// `None` when the host has no layout information
    pub bounds: Option<BoundingBox>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "transparent".to_string(),
            font_size: 16.0,
            outline_style: "none".to_string(),
            outline_width: 0.0,
            box_shadow: None,
            visibility: Visibility::Visible,
            display_none: false,
            opacity: 1.0,
            bounds: None,
        }
    }
}

impl ComputedStyle {
    /// Non-zero box, not hidden, displayed, and not fully transparent.
    /// Unknown geometry counts as non-zero.
    pub fn is_visible(&self) -> bool {
        let has_area = self.bounds.map_or(true, |b| !b.is_empty());
        has_area
            && self.visibility == Visibility::Visible
            && !self.display_none
            && self.opacity != 0.0
    }

    /// Outline is `none`/`hidden` or has zero width
    pub fn outline_suppressed(&self) -> bool {
        let style = self.outline_style.trim().to_ascii_lowercase();
        style == "none" || style == "hidden" || self.outline_width <= 0.0
    }
}

/// Result of a style query. `Unknown` is returned when the oracle cannot
/// resolve a node; rules treat it as "assume pass".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StyleSnapshot {
    Unknown,
    Resolved(ComputedStyle),
}

impl StyleSnapshot {
    pub fn resolved(&self) -> Option<&ComputedStyle> {
        match self {
            StyleSnapshot::Resolved(style) => Some(style),
            StyleSnapshot::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StyleSnapshot::Unknown)
    }
}

/// Host boundary: a tree plus a style/geometry oracle.
pub trait DocumentModel: Send + Sync {
    /// Identity of the audit target (URL, file path, label)
    fn target(&self) -> &str;

    fn tree(&self) -> &NodeTree;

    /// Computed style in the node's resting state
    fn style(&self, node: NodeId) -> StyleSnapshot;

    /// Computed style while the node has keyboard focus
    fn focused_style(&self, node: NodeId) -> StyleSnapshot;

    /// Every node, parent before children, siblings in document order
    fn nodes(&self) -> PreOrder<'_> {
        self.tree().pre_order()
    }

    fn nodes_from(&self, root: NodeId) -> PreOrder<'_> {
        self.tree().pre_order_from(root)
    }

    fn is_visible(&self, node: NodeId) -> bool {
        match self.style(node) {
            StyleSnapshot::Resolved(style) => style.is_visible(),
            StyleSnapshot::Unknown => true,
        }
    }
}

/// In-memory adapter with explicitly supplied styles.
///
/// Nodes without a registered snapshot resolve to [`StyleSnapshot::Unknown`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    target: String,
    tree: NodeTree,
    styles: HashMap<NodeId, ComputedStyle>,
    focused: HashMap<NodeId, ComputedStyle>,
}

impl MemoryDocument {
    pub fn new(target: &str, tree: NodeTree) -> Self {
        Self {
            target: target.to_string(),
            tree,
            styles: HashMap::new(),
            focused: HashMap::new(),
        }
    }

    pub fn with_style(mut self, node: NodeId, style: ComputedStyle) -> Self {
        self.styles.insert(node, style);
        self
    }

    pub fn with_focused_style(mut self, node: NodeId, style: ComputedStyle) -> Self {
        self.focused.insert(node, style);
        self
    }
}

impl DocumentModel for MemoryDocument {
    fn target(&self) -> &str {
        &self.target
    }

    fn tree(&self) -> &NodeTree {
        &self.tree
    }

    fn style(&self, node: NodeId) -> StyleSnapshot {
        self.styles
            .get(&node)
            .cloned()
            .map_or(StyleSnapshot::Unknown, StyleSnapshot::Resolved)
    }

    fn focused_style(&self, node: NodeId) -> StyleSnapshot {
        self.focused
            .get(&node)
            .cloned()
            .map_or(StyleSnapshot::Unknown, StyleSnapshot::Resolved)
    }
}
