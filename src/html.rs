// SPDX-License-Identifier: PMPL-1.0-or-later
//! Static HTML adapter.
//!
//! Parses markup with `scraper`, flattens it into a [`NodeTree`], and answers
//! style queries from a small cascade: user-agent defaults, `<style>` blocks,
//! then inline `style` attributes. Only compound selectors (`tag`, `*`,
//! `.class`, `#id`, optionally with `:focus` / `:focus-visible`) are
//! understood; combinators and other pseudo-classes are ignored. Rules nested
//! in `@media` apply only for plain `screen`/`all` queries. There is no
//! layout engine, so geometry is unknown unless a node is not rendered or
//! declares a zero width or height.

use crate::color::parse_color;
use crate::document::{
    BoundingBox, ComputedStyle, DocumentModel, Node, NodeId, NodeTree, StyleSnapshot, Visibility,
};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::debug;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*|[a-zA-Z][a-zA-Z0-9-]*)?((?:[.#][A-Za-z0-9_-]+)*)(:focus(?:-visible)?)?$")
        .expect("valid regex")
});

static SIMPLE_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.#])([A-Za-z0-9_-]+)").expect("valid regex"));

/// Elements that never produce a box
const NON_RENDERED: &[&str] = &[
    "head", "title", "meta", "link", "base", "script", "style", "template", "noscript",
];

/// Elements whose text children are not document text
const RAW_TEXT: &[&str] = &["script", "style", "template", "noscript"];

const OUTLINE_STYLES: &[&str] = &[
    "none", "hidden", "auto", "solid", "dotted", "dashed", "double", "groove", "ridge", "inset",
    "outset",
];

/// A document parsed from static HTML
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    target: String,
    tree: NodeTree,
    styles: Vec<ComputedStyle>,
    focused: Vec<ComputedStyle>,
}

impl HtmlDocument {
    /// Parse a full HTML document. Parsing never fails; malformed markup is
    /// recovered the way browsers recover it.
    pub fn parse(target: &str, markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let mut tree = NodeTree::new();
        let mut css = String::new();
        convert(html.root_element(), None, &mut tree, &mut css);

        let sheet = Stylesheet::parse(&css);
        let (styles, focused) = sheet.cascade(&tree);
        debug!(
            "Parsed {}: {} nodes, {} style rules",
            target,
            tree.len(),
            sheet.rules.len()
        );

        Self {
            target: target.to_string(),
            tree,
            styles,
            focused,
        }
    }
}

impl DocumentModel for HtmlDocument {
    fn target(&self) -> &str {
        &self.target
    }

    fn tree(&self) -> &NodeTree {
        &self.tree
    }

    fn style(&self, node: NodeId) -> StyleSnapshot {
        self.styles
            .get(node.index())
            .cloned()
            .map_or(StyleSnapshot::Unknown, StyleSnapshot::Resolved)
    }

    fn focused_style(&self, node: NodeId) -> StyleSnapshot {
        self.focused
            .get(node.index())
            .cloned()
            .map_or(StyleSnapshot::Unknown, StyleSnapshot::Resolved)
    }
}

fn convert(element: ElementRef<'_>, parent: Option<NodeId>, tree: &mut NodeTree, css: &mut String) {
    let value = element.value();
    let name = value.name();
    let attributes = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let id = tree.push(parent, name, attributes);
    let raw_text = RAW_TEXT.contains(&name);

    for child in element.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                if name == "style" {
                    css.push_str(text);
                    css.push('\n');
                } else if !raw_text {
                    tree.push_text(id, text);
                }
            }
            scraper::Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    convert(child_element, Some(id), tree, css);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
struct Selector {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    focus: bool,
}

impl Selector {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let caps = SELECTOR_RE.captures(raw)?;
        let tag = caps
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .filter(|t| t != "*");
        let mut ids = Vec::new();
        let mut classes = Vec::new();
        if let Some(parts) = caps.get(2) {
            for part in SIMPLE_PART_RE.captures_iter(parts.as_str()) {
                if &part[1] == "#" {
                    ids.push(part[2].to_string());
                } else {
                    classes.push(part[2].to_string());
                }
            }
        }
        Some(Self {
            tag,
            ids,
            classes,
            focus: caps.get(3).is_some(),
        })
    }

    fn specificity(&self) -> (usize, usize, usize) {
        (
            self.ids.len(),
            self.classes.len() + usize::from(self.focus),
            usize::from(self.tag.is_some()),
        )
    }

    fn matches(&self, node: &Node) -> bool {
        if let Some(tag) = &self.tag {
            if !node.is(tag) {
                return false;
            }
        }
        let node_id = node.attr("id").unwrap_or("");
        if !self.ids.iter().all(|id| id == node_id) {
            return false;
        }
        let node_classes: Vec<&str> = node
            .attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        self.classes.iter().all(|c| node_classes.contains(&c.as_str()))
    }
}

#[derive(Debug, Clone)]
struct StyleRule {
    selector: Selector,
    declarations: Vec<(String, String)>,
    order: usize,
}

/// Walk the blocks of `css` in source order. Conditional group rules are
/// entered only when they hold on a screen; other at-rules are dropped whole.
fn collect_rules(css: &str, rules: &mut Vec<StyleRule>) {
    let mut rest = css;
    while let Some(open) = rest.find('{') {
        let Some(len) = block_len(&rest[open + 1..]) else {
            debug!("Unterminated CSS block, ignoring remainder");
            return;
        };
        // statement at-rules (`@import ...;`) may precede the header
        let header = rest[..open].rsplit(';').next().unwrap_or("").trim();
        let body = &rest[open + 1..open + 1 + len];
        rest = &rest[open + 2 + len..];

        if let Some(at_rule) = header.strip_prefix('@') {
            if applies_on_screen(at_rule) {
                collect_rules(body, rules);
            }
            continue;
        }
        let declarations = parse_declarations(body);
        for raw in header.split(',') {
            if let Some(selector) = Selector::parse(raw) {
                rules.push(StyleRule {
                    selector,
                    declarations: declarations.clone(),
                    order: rules.len(),
                });
            }
        }
    }
}

/// Length of a block body up to its matching `}`
fn block_len(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Only unconditional `@media screen` / `@media all` groups apply to the
/// static snapshot; feature queries, `@supports` and `@container` are unknowable.
fn applies_on_screen(at_rule: &str) -> bool {
    let Some(query) = at_rule.strip_prefix("media") else {
        return false;
    };
    let query = query.trim().to_ascii_lowercase();
    !query.is_empty()
        && query.split(',').all(|q| {
            matches!(
                q.split_whitespace().collect::<Vec<_>>().as_slice(),
                ["screen"] | ["all"] | ["only", "screen"] | ["only", "all"]
            )
        })
}

#[derive(Debug, Default)]
struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    fn parse(css: &str) -> Self {
        let css = COMMENT_RE.replace_all(css, "");
        let mut rules = Vec::new();
        collect_rules(&css, &mut rules);
        Self { rules }
    }

    /// Matching rules in cascade order (lowest precedence first)
    fn matching(&self, node: &Node, focused: bool) -> Vec<&StyleRule> {
        let mut matched: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|r| (focused || !r.selector.focus) && r.selector.matches(node))
            .collect();
        matched.sort_by_key(|r| (r.selector.specificity(), r.order));
        matched
    }

    /// Resting and focused styles for every node, indexed by arena position
    fn cascade(&self, tree: &NodeTree) -> (Vec<ComputedStyle>, Vec<ComputedStyle>) {
        let mut styles: Vec<Option<ComputedStyle>> = vec![None; tree.len()];
        let mut focused: Vec<Option<ComputedStyle>> = vec![None; tree.len()];

        for node in tree.pre_order() {
            let parent = node
                .parent()
                .and_then(|p| styles.get(p.index()).cloned().flatten());
            let resting = self.compute(node, parent.as_ref(), false);
            let on_focus = self.compute(node, parent.as_ref(), true);
            styles[node.id().index()] = Some(resting);
            focused[node.id().index()] = Some(on_focus);
        }

        (
            styles.into_iter().map(Option::unwrap_or_default).collect(),
            focused.into_iter().map(Option::unwrap_or_default).collect(),
        )
    }

    fn compute(&self, node: &Node, parent: Option<&ComputedStyle>, focused: bool) -> ComputedStyle {
        let root = ComputedStyle::default();
        let parent = parent.unwrap_or(&root);
        let mut style = ComputedStyle {
            color: parent.color.clone(),
            font_size: parent.font_size * heading_scale(node.tag()),
            visibility: parent.visibility,
            opacity: parent.opacity,
            ..ComputedStyle::default()
        };
        if focused {
            style.outline_style = "auto".to_string();
            style.outline_width = 1.0;
        }
        style.display_none = NON_RENDERED.contains(&node.tag())
            || node.has_attr("hidden")
            || (node.is("input")
                && node.attr("type").is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden")));

        let mut zero_box = false;
        for rule in self.matching(node, focused) {
            for (property, value) in &rule.declarations {
                apply(&mut style, parent, property, value, &mut zero_box);
            }
        }
        if let Some(inline) = node.attr("style") {
            for (property, value) in parse_declarations(inline) {
                apply(&mut style, parent, &property, &value, &mut zero_box);
            }
        }

        if parent.display_none {
            style.display_none = true;
        }
        if style.display_none || zero_box {
            style.bounds = Some(BoundingBox::ZERO);
        }
        style
    }
}

fn parse_declarations(block: &str) -> Vec<(String, String)> {
    block
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

fn apply(
    style: &mut ComputedStyle,
    parent: &ComputedStyle,
    property: &str,
    value: &str,
    zero_box: &mut bool,
) {
    let lower = value.to_ascii_lowercase();
    if matches!(lower.as_str(), "inherit" | "initial" | "unset" | "revert") {
        return;
    }
    match property {
        "color" => style.color = value.to_string(),
        "background-color" => style.background_color = value.to_string(),
        "background" => style.background_color = background_color_of(value),
        "font-size" => {
            if let Some(size) = parse_font_size(&lower, parent.font_size) {
                style.font_size = size;
            }
        }
        "outline" => {
            style.outline_style = "none".to_string();
            style.outline_width = 3.0;
            for token in lower.split_whitespace() {
                if OUTLINE_STYLES.contains(&token) {
                    style.outline_style = token.to_string();
                } else if let Some(width) = parse_border_width(token, style.font_size) {
                    style.outline_width = width;
                }
            }
        }
        "outline-style" => style.outline_style = lower,
        "outline-width" => {
            if let Some(width) = parse_border_width(&lower, style.font_size) {
                style.outline_width = width;
            }
        }
        "box-shadow" => {
            style.box_shadow = (lower != "none").then(|| value.to_string());
        }
        "visibility" => {
            style.visibility = match lower.as_str() {
                "hidden" => Visibility::Hidden,
                "collapse" => Visibility::Collapse,
                _ => Visibility::Visible,
            }
        }
        "display" => style.display_none = lower == "none",
        "opacity" => {
            let parsed = match lower.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok().map(|v| v / 100.0),
                None => lower.parse::<f64>().ok(),
            };
            if let Some(opacity) = parsed {
                style.opacity = parent.opacity * opacity.clamp(0.0, 1.0);
            }
        }
        "width" | "height" => {
            if parse_length(&lower, style.font_size) == Some(0.0) {
                *zero_box = true;
            }
        }
        _ => {}
    }
}

/// Colour component of a `background` shorthand. Without one the shorthand
/// resets the colour to `transparent`.
fn background_color_of(value: &str) -> String {
    if parse_color(value).is_some() {
        return value.trim().to_string();
    }
    top_level_tokens(value)
        .into_iter()
        .find(|token| parse_color(token).is_some())
        .unwrap_or("transparent")
        .to_string()
}

/// Whitespace/comma separated tokens, keeping function arguments such as
/// `url(...)` or `rgba(...)` inside their token
fn top_level_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || c == ',') => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

fn heading_scale(tag: &str) -> f64 {
    match tag {
        "h1" => 2.0,
        "h2" => 1.5,
        "h3" => 1.17,
        "h5" => 0.83,
        "h6" => 0.67,
        _ => 1.0,
    }
}

/// Length in px; `em` and `%` resolve against `em_base`
fn parse_length(value: &str, em_base: f64) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    let (number, factor) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 4.0 / 3.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, em_base)
    } else if let Some(n) = value.strip_suffix('%') {
        (n, em_base / 100.0)
    } else {
        return None;
    };
    let number: f64 = number.trim().parse().ok()?;
    (number >= 0.0).then_some(number * factor)
}

fn parse_font_size(value: &str, parent_size: f64) -> Option<f64> {
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        "smaller" => Some(parent_size / 1.2),
        "larger" => Some(parent_size * 1.2),
        _ => None,
    };
    keyword.or_else(|| parse_length(value, parent_size))
}

fn parse_border_width(value: &str, em_base: f64) -> Option<f64> {
    match value {
        "thin" => Some(1.0),
        "medium" => Some(3.0),
        "thick" => Some(5.0),
        other => parse_length(other, em_base),
    }
}
