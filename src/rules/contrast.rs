// SPDX-License-Identifier: PMPL-1.0-or-later
//! Colour contrast - WCAG 1.4.3 Contrast (Minimum)
//!
//! Evaluates every node that directly holds text against its own computed
//! background. Required ratio is 3:1 at 18px and above, 4.5:1 otherwise.
//! The bold 14pt large-text allowance of WCAG is not applied.
//!
//! Nothing is reported when the background is transparent, when either
//! colour cannot be parsed, or when style is unavailable.

use crate::color::{contrast_ratio, parse_color, LuminanceModel};
use crate::finding::{Finding, Severity};
use crate::rules::{AuditContext, Rule};

pub const ID: &str = "color-contrast";

/// Font size (px) from which text counts as large
pub const LARGE_TEXT_PX: f64 = 18.0;
pub const NORMAL_TEXT_RATIO: f64 = 4.5;
pub const LARGE_TEXT_RATIO: f64 = 3.0;

/// Minimum contrast ratio for text rendered at `font_size` px
pub fn required_ratio(font_size: f64) -> f64 {
    if font_size >= LARGE_TEXT_PX {
        LARGE_TEXT_RATIO
    } else {
        NORMAL_TEXT_RATIO
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rule for text colour contrast
#[derive(Debug, Default)]
pub struct ContrastRule {
    model: LuminanceModel,
}

impl ContrastRule {
    pub fn new(model: LuminanceModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> LuminanceModel {
        self.model
    }
}

impl Rule for ContrastRule {
    fn id(&self) -> &str {
        ID
    }

    fn category(&self) -> &str {
        "Contrast (Minimum)"
    }

    fn description(&self) -> &str {
        "Text contrasts sufficiently with its background (WCAG 1.4.3)"
    }

    fn default_severity(&self) -> Severity {
        Severity::Medium
    }

    fn check(&self, ctx: &AuditContext<'_>) -> Vec<Finding> {
        let tree = ctx.tree();
        let mut findings = Vec::new();

        for node in ctx.nodes() {
            if node.own_text().trim().is_empty() || !ctx.is_visible(node.id()) {
                continue;
            }
            let snapshot = ctx.style(node.id());
            let Some(style) = snapshot.resolved() else {
                continue;
            };
            if style.background_color.trim().eq_ignore_ascii_case("transparent") {
                continue;
            }
            let (Some(fg), Some(bg)) = (parse_color(&style.color), parse_color(&style.background_color))
            else {
                continue;
            };
            if bg.is_transparent() {
                continue;
            }

            let ratio = contrast_ratio(fg, bg, self.model);
            let required = required_ratio(style.font_size);
            if ratio < required {
                findings.push(
                    Finding::new(ID, Severity::Medium, "insufficient contrast")
                        .with_meta("ratio", round2(ratio))
                        .with_meta("required", required)
                        .with_meta("foreground", style.color.as_str())
                        .with_meta("background", style.background_color.as_str())
                        .with_meta("font_size", style.font_size)
                        .with_node(tree, node.id()),
                );
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::document::{ComputedStyle, MemoryDocument, NodeTree};
    use crate::rules::run_rule;

    fn text_doc(color: &str, background: &str, font_size: f64) -> MemoryDocument {
        let mut tree = NodeTree::new();
        let p = tree.push(None, "p", Vec::new());
        tree.push_text(p, "Sample text");
        let style = ComputedStyle {
            color: color.to_string(),
            background_color: background.to_string(),
            font_size,
            ..ComputedStyle::default()
        };
        MemoryDocument::new("fixture", tree).with_style(p, style)
    }

    fn check(rule: &ContrastRule, doc: &MemoryDocument) -> Vec<Finding> {
        let token = CancellationToken::new();
        rule.check(&AuditContext::new(doc, &token))
    }

    #[test]
    fn test_black_on_white_passes() {
        let doc = text_doc("rgb(0, 0, 0)", "rgb(255, 255, 255)", 16.0);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
    }

    #[test]
    fn test_linear_model_grey_on_white() {
        // 118/255 luminance without gamma decoding gives roughly 2.05:1
        let doc = text_doc("rgb(118,118,118)", "rgb(255,255,255)", 16.0);
        let findings = check(&ContrastRule::default(), &doc);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.severity, Severity::Medium);
        assert_eq!(f.message, "insufficient contrast");
        assert_eq!(f.metadata["ratio"], 2.05);
        assert_eq!(f.metadata["required"], 4.5);
        assert_eq!(f.metadata["foreground"], "rgb(118,118,118)");
        assert_eq!(f.metadata["background"], "rgb(255,255,255)");
        assert_eq!(f.metadata["font_size"], 16.0);
    }

    #[test]
    fn test_srgb_model_boundary() {
        let rule = ContrastRule::new(LuminanceModel::Srgb);
        let failing = text_doc("rgb(119,119,119)", "rgb(255,255,255)", 16.0);
        let passing = text_doc("rgb(118,118,118)", "rgb(255,255,255)", 16.0);
        let findings = check(&rule, &failing);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].metadata["ratio"], 4.48);
        assert!(check(&rule, &passing).is_empty());
    }

    #[test]
    fn test_large_text_threshold() {
        assert_eq!(required_ratio(17.9), 4.5);
        assert_eq!(required_ratio(18.0), 3.0);
        // sRGB ratio of #777 on white is ~4.48: fails normal text, passes large
        let rule = ContrastRule::new(LuminanceModel::Srgb);
        assert_eq!(check(&rule, &text_doc("#777", "#fff", 16.0)).len(), 1);
        assert!(check(&rule, &text_doc("#777", "#fff", 18.0)).is_empty());
    }

    #[test]
    fn test_transparent_background_skipped() {
        let doc = text_doc("#eee", "transparent", 16.0);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
        let doc = text_doc("#eee", "rgba(255, 255, 255, 0)", 16.0);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
    }

    #[test]
    fn test_unparseable_colors_fail_open() {
        let doc = text_doc("var(--fg)", "#fff", 16.0);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
        let doc = text_doc("#fff", "linear-gradient(red, blue)", 16.0);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
    }

    #[test]
    fn test_unknown_style_fails_open() {
        let mut tree = NodeTree::new();
        let p = tree.push(None, "p", Vec::new());
        tree.push_text(p, "text");
        let doc = MemoryDocument::new("fixture", tree);
        assert!(check(&ContrastRule::default(), &doc).is_empty());
    }

    #[test]
    fn test_unrendered_text_skipped() {
        let html = r#"<html><head><title>Home</title><style>* { color: #999; background-color: #fff }</style></head>
            <body><p style="display: none">gone</p><p style="opacity: 0">faded</p><p>shown</p></body></html>"#;
        let findings = run_rule(&ContrastRule::default(), html);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].node.as_ref().unwrap().selector, "p");
    }

    #[test]
    fn test_background_image_without_color_skipped() {
        let html = r#"<p style="color: #000; background: url(black-texture.png) repeat">text</p>"#;
        assert!(run_rule(&ContrastRule::default(), html).is_empty());
    }

    #[test]
    fn test_print_only_styles_skipped() {
        let html = r#"<style>@media print { .note { color: #eee; background-color: #fff } }</style>
            <p class="note">printed note</p>"#;
        assert!(run_rule(&ContrastRule::default(), html).is_empty());
    }

    #[test]
    fn test_html_inline_styles() {
        let html = r#"
            <div style="background-color: #fff">
                <p style="color: #ddd">faint</p>
                <span style="color: #ddd; background: #fff">faint too</span>
                <em style="color: #000; background: #fff">fine</em>
            </div>
        "#;
        let findings = run_rule(&ContrastRule::default(), html);
        // the <p> has no background of its own and is skipped
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].node.as_ref().unwrap().selector, "span");
    }
}
