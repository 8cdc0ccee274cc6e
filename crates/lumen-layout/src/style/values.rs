//! Parsers for the handful of style value syntaxes layout understands.
//!
//! Every parser returns `None` on malformed input; callers keep their
//! previous value and report the problem through
//! [`lumen_common::warning::warn_once`].

use std::str::FromStr;

use strum_macros::{Display, EnumString};

/// Parse a `<N>px` length.
#[must_use]
pub fn parse_px(value: &str) -> Option<f32> {
    let number = value.trim().strip_suffix("px")?;
    number.trim().parse::<f32>().ok().filter(|n| n.is_finite())
}

/// Parse `font-size: <N>px` into a point size: `round(N * 0.75)`.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn parse_font_size(value: &str) -> Option<u16> {
    let px = parse_px(value)?;
    if px < 0.0 {
        return None;
    }
    let points = (px * 0.75).round();
    (points <= f32::from(u16::MAX)).then_some(points as u16)
}

/// Parse `translate(<x>px[, <y>px])` into a pixel offset.
///
/// A missing `y` means zero.
#[must_use]
pub fn parse_translate(value: &str) -> Option<(f32, f32)> {
    let args = value
        .trim()
        .strip_prefix("translate(")?
        .strip_suffix(')')?;
    let mut parts = args.split(',');
    let x = parse_px(parts.next()?)?;
    let y = match parts.next() {
        Some(y) => parse_px(y)?,
        None => 0.0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((x, y))
}

/// Parse an `opacity` number, clamped to `[0, 1]`.
#[must_use]
pub fn parse_opacity(value: &str) -> Option<f32> {
    let opacity = value.trim().parse::<f32>().ok()?;
    opacity.is_finite().then(|| opacity.clamp(0.0, 1.0))
}

/// [§ 11.1.1 overflow](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Overflow {
    /// "This value indicates that content is not clipped."
    #[default]
    Visible,
    /// "This value indicates that the content is clipped."
    Hidden,
    /// Clipped with no scrolling mechanism at all.
    Clip,
    /// Clipped, with a scrolling mechanism.
    Scroll,
    /// User-agent dependent.
    Auto,
}

impl Overflow {
    /// Parse an `overflow` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::from_str(value.trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("16px"), Some(16.0));
        assert_eq!(parse_px(" 2.5px "), Some(2.5));
        assert_eq!(parse_px("16"), None);
        assert_eq!(parse_px("1em"), None);
        assert_eq!(parse_px("px"), None);
    }

    #[test]
    fn test_parse_font_size_converts_to_points() {
        assert_eq!(parse_font_size("16px"), Some(12));
        assert_eq!(parse_font_size("30px"), Some(23));
        assert_eq!(parse_font_size("-4px"), None);
        assert_eq!(parse_font_size("large"), None);
    }

    #[test]
    fn test_parse_translate() {
        assert_eq!(parse_translate("translate(10px, 20px)"), Some((10.0, 20.0)));
        assert_eq!(parse_translate("translate(-5px)"), Some((-5.0, 0.0)));
        assert_eq!(parse_translate("rotate(10deg)"), None);
        assert_eq!(parse_translate("translate(1px, 2px, 3px)"), None);
        assert_eq!(parse_translate("translate(10%)"), None);
    }

    #[test]
    fn test_parse_opacity_clamps() {
        assert_eq!(parse_opacity("0.5"), Some(0.5));
        assert_eq!(parse_opacity("1.7"), Some(1.0));
        assert_eq!(parse_opacity("-1"), Some(0.0));
        assert_eq!(parse_opacity("half"), None);
    }

    #[test]
    fn test_parse_overflow() {
        assert_eq!(Overflow::parse("clip"), Some(Overflow::Clip));
        assert_eq!(Overflow::parse(" Hidden "), Some(Overflow::Hidden));
        assert_eq!(Overflow::parse("sideways"), None);
    }
}
