// SPDX-License-Identifier: PMPL-1.0-or-later
//! CSS colour parsing and contrast computation.
//!
//! The default [`LuminanceModel::Linear`] weights raw normalised channels
//! without sRGB gamma decoding. It is NOT the WCAG 2.x relative luminance
//! definition; it is kept so results stay reproducible across versions.
//! [`LuminanceModel::Srgb`] implements the full definition.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rgba?\(\s*([\d.]+%?)\s*[,\s]\s*([\d.]+%?)\s*[,\s]\s*([\d.]+%?)\s*(?:[,/]\s*([\d.]+%?)\s*)?\)$",
    )
    .expect("valid regex")
});

/// An sRGB colour with alpha in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a < 1.0 {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        } else {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        }
    }
}

/// How relative luminance is derived from channel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuminanceModel {
    /// `0.2126 R + 0.7152 G + 0.0722 B` over channels normalised to `[0, 1]`
    #[default]
    Linear,
    /// WCAG 2.x: channels are gamma-decoded before weighting
    Srgb,
}

/// Parse a hex colour (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`)
pub fn parse_hex_color(hex: &str) -> Option<Rgba> {
    let hex = hex.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let short = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
    let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(short(0)?, short(1)?, short(2)?)),
        4 => Some(Rgba {
            a: f64::from(short(3)?) / 255.0,
            ..Rgba::rgb(short(0)?, short(1)?, short(2)?)
        }),
        6 => Some(Rgba::rgb(long(0)?, long(2)?, long(4)?)),
        8 => Some(Rgba {
            a: f64::from(long(6)?) / 255.0,
            ..Rgba::rgb(long(0)?, long(2)?, long(4)?)
        }),
        _ => None,
    }
}

fn parse_channel(raw: &str) -> Option<u8> {
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? * 2.55,
        None => raw.parse::<f64>().ok()?,
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(raw: &str) -> Option<f64> {
    let value = match raw.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    Some(value.clamp(0.0, 1.0))
}

/// Parse an `rgb()` or `rgba()` colour
pub fn parse_rgb_color(value: &str) -> Option<Rgba> {
    let caps = RGB_RE.captures(value.trim())?;
    let a = match caps.get(4) {
        Some(m) => parse_alpha(m.as_str())?,
        None => 1.0,
    };
    Some(Rgba {
        r: parse_channel(&caps[1])?,
        g: parse_channel(&caps[2])?,
        b: parse_channel(&caps[3])?,
        a,
    })
}

/// Parse a named CSS colour
pub fn parse_named_color(name: &str) -> Option<Rgba> {
    let rgb = match name {
        "transparent" => return Some(Rgba { a: 0.0, ..Rgba::rgb(0, 0, 0) }),
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Rgba::rgb(rgb.0, rgb.1, rgb.2))
}

/// Parse any supported CSS colour value
pub fn parse_color(value: &str) -> Option<Rgba> {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        parse_named_color(&trimmed)
    }
}

/// Relative luminance in `[0, 1]`
pub fn relative_luminance(color: Rgba, model: LuminanceModel) -> f64 {
    let channels = [color.r, color.g, color.b].map(|c| {
        let v = f64::from(c) / 255.0;
        match model {
            LuminanceModel::Linear => v,
            LuminanceModel::Srgb => {
                if v <= 0.04045 {
                    v / 12.92
                } else {
                    ((v + 0.055) / 1.055).powf(2.4)
                }
            }
        }
    });
    0.2126 * channels[0] + 0.7152 * channels[1] + 0.0722 * channels[2]
}

/// `(lighter + 0.05) / (darker + 0.05)`, always `>= 1.0`
pub fn contrast_ratio(fg: Rgba, bg: Rgba, model: LuminanceModel) -> f64 {
    let l1 = relative_luminance(fg, model);
    let l2 = relative_luminance(bg, model);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff"), Some(WHITE));
        assert_eq!(parse_hex_color("#000000"), Some(BLACK));
        assert_eq!(parse_hex_color("#ff0000"), Some(Rgba::rgb(255, 0, 0)));
        assert!(parse_hex_color("#ff000000").unwrap().is_transparent());
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("##fff"), None);
        assert_eq!(parse_hex_color("fff"), None);
    }

    #[test]
    fn test_parse_rgb_color() {
        assert_eq!(parse_rgb_color("rgb(255, 0, 0)"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(parse_rgb_color("rgb(118 118 118)"), Some(Rgba::rgb(118, 118, 118)));
        let half = parse_rgb_color("rgba(0, 128, 0, 0.5)").unwrap();
        assert_eq!((half.r, half.g, half.b), (0, 128, 0));
        assert!((half.a - 0.5).abs() < f64::EPSILON);
        assert!(parse_rgb_color("rgba(0, 0, 0, 0)").unwrap().is_transparent());
        assert_eq!(parse_rgb_color("rgb(100%, 0%, 0%)"), Some(Rgba::rgb(255, 0, 0)));
        assert_eq!(parse_rgb_color("rgb(var(--fg))"), None);
    }

    #[test]
    fn test_parse_color_dispatch() {
        assert_eq!(parse_color("  WHITE "), Some(WHITE));
        assert!(parse_color("transparent").unwrap().is_transparent());
        assert_eq!(parse_color("currentColor"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        for model in [LuminanceModel::Linear, LuminanceModel::Srgb] {
            let ratio = contrast_ratio(BLACK, WHITE, model);
            assert!((ratio - 21.0).abs() < 1e-9, "got {:.3}", ratio);
        }
    }

    #[test]
    fn test_contrast_ratio_symmetric_and_same_color() {
        let grey = Rgba::rgb(128, 128, 128);
        let a = contrast_ratio(grey, WHITE, LuminanceModel::Linear);
        let b = contrast_ratio(WHITE, grey, LuminanceModel::Linear);
        assert!((a - b).abs() < 1e-12);
        let same = contrast_ratio(grey, grey, LuminanceModel::Srgb);
        assert!((same - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_luminance_is_channel_average_for_greys() {
        let l = relative_luminance(Rgba::rgb(118, 118, 118), LuminanceModel::Linear);
        assert!((l - 118.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_srgb_ratio_matches_wcag_reference_values() {
        // #777 is the darkest grey that fails 4.5:1 on white, #767676 the lightest that passes
        let r119 = contrast_ratio(Rgba::rgb(119, 119, 119), WHITE, LuminanceModel::Srgb);
        let r118 = contrast_ratio(Rgba::rgb(118, 118, 118), WHITE, LuminanceModel::Srgb);
        assert!((r119 - 4.48).abs() < 0.01, "got {:.3}", r119);
        assert!((r118 - 4.54).abs() < 0.01, "got {:.3}", r118);
    }
}
