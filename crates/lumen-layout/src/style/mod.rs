//! Inherited text style tracked while walking the node tree.
//!
//! [§ 4 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
//!
//! Each element's style map is already cascaded, but text style is still
//! inherited positionally: a `<b>` inside a `<p style="font-size: 20px">`
//! renders bold at 15pt. Layout resolves this with an explicit stack of
//! [`StyleSnapshot`] values owned by one layout pass. Entering an element
//! pushes the current snapshot and applies the element's keys; leaving it
//! restores the pushed snapshot verbatim, whatever the subtree did.

mod color;
pub mod values;

use lumen_common::warning::warn_once;
use lumen_dom::ElementData;
use serde::Serialize;

pub use color::Color;
pub use values::Overflow;

use crate::font::{FontRequest, FontSlant, FontWeight};

/// Inheritable text style at one point of the tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct StyleSnapshot {
    /// `font-weight: bold` in effect.
    pub bold: bool,
    /// `font-style: italic` in effect.
    pub italic: bool,
    /// Font size in points.
    pub size: u16,
    /// Text color.
    pub color: Color,
    /// Accumulated `translate()` x offset, applied to hit-test rectangles.
    pub transform_offset_x: f32,
    /// Accumulated `translate()` y offset, applied to hit-test rectangles.
    pub transform_offset_y: f32,
    /// Inside `<abbr>` or `font-variant: small-caps`.
    pub small_caps: bool,
    /// Inside `<sup>`.
    pub superscript: bool,
    /// Inside `<pre>`.
    pub preformatted: bool,
}

impl StyleSnapshot {
    /// Initial style of a document: black, upright, regular weight.
    #[must_use]
    pub fn initial(size: u16) -> Self {
        Self {
            bold: false,
            italic: false,
            size,
            color: Color::BLACK,
            transform_offset_x: 0.0,
            transform_offset_y: 0.0,
            small_caps: false,
            superscript: false,
            preformatted: false,
        }
    }

    /// The font request this style resolves to.
    #[must_use]
    pub fn font_request(&self) -> FontRequest {
        FontRequest {
            weight: if self.bold {
                FontWeight::Bold
            } else {
                FontWeight::Normal
            },
            slant: if self.italic {
                FontSlant::Italic
            } else {
                FontSlant::Roman
            },
            size: self.size,
            monospace: self.preformatted,
        }
    }
}

/// Push/pop stack of [`StyleSnapshot`]s.
///
/// Every [`StyleStack::enter`] must be matched by exactly one
/// [`StyleStack::exit`]. The layout builder enforces this through a scoped
/// helper so an error unwinding out of a subtree still restores the style.
#[derive(Debug, Clone)]
pub struct StyleStack {
    current: StyleSnapshot,
    saved: Vec<StyleSnapshot>,
}

impl StyleStack {
    /// Create a stack whose initial style uses `default_size` points.
    #[must_use]
    pub fn new(default_size: u16) -> Self {
        Self {
            current: StyleSnapshot::initial(default_size),
            saved: Vec::new(),
        }
    }

    /// The live style.
    #[must_use]
    pub fn current(&self) -> &StyleSnapshot {
        &self.current
    }

    /// Number of unmatched `enter` calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Save the current style, then apply `element`'s tag defaults and
    /// recognized style keys on top of it.
    ///
    /// Malformed values are ignored: the previous value stays in effect.
    pub fn enter(&mut self, element: &ElementData) {
        self.saved.push(self.current);
        let style = &element.style;
        let cur = &mut self.current;

        if let Some(weight) = style.get("font-weight") {
            match parse_bold(weight) {
                Some(bold) => cur.bold = bold,
                None => warn_once("Style", &format!("ignoring font-weight '{weight}'")),
            }
        }

        if let Some(font_style) = style.get("font-style") {
            match font_style.trim() {
                "italic" | "oblique" => cur.italic = true,
                "normal" => cur.italic = false,
                other => warn_once("Style", &format!("ignoring font-style '{other}'")),
            }
        }

        if let Some(size) = style.get("font-size") {
            match values::parse_font_size(size) {
                Some(points) => cur.size = points,
                None => warn_once("Style", &format!("ignoring font-size '{size}'")),
            }
        }

        if let Some(variant) = style.get("font-variant") {
            match variant.trim() {
                "small-caps" => cur.small_caps = true,
                "normal" => cur.small_caps = false,
                other => warn_once("Style", &format!("ignoring font-variant '{other}'")),
            }
        }

        if let Some(raw) = style.get("color") {
            match Color::parse(raw) {
                Some(color) => cur.color = color,
                None => warn_once("Style", &format!("ignoring color '{raw}'")),
            }
        }

        if let Some(transform) = style.get("transform") {
            match values::parse_translate(transform) {
                Some((dx, dy)) => {
                    cur.transform_offset_x += dx;
                    cur.transform_offset_y += dy;
                }
                None if transform.trim() == "none" => {}
                None => warn_once("Style", &format!("ignoring transform '{transform}'")),
            }
        }

        match element.tag_name.as_str() {
            "sup" => {
                cur.superscript = true;
                cur.size = (cur.size / 2).max(1);
            }
            "abbr" => cur.small_caps = true,
            "pre" => cur.preformatted = true,
            _ => {}
        }
    }

    /// Restore the style saved by the matching [`StyleStack::enter`].
    ///
    /// Returns `false` (and leaves the style untouched) when there is no
    /// matching `enter`.
    pub fn exit(&mut self) -> bool {
        match self.saved.pop() {
            Some(saved) => {
                self.current = saved;
                true
            }
            None => {
                warn_once("Style", "style stack exit without matching enter");
                false
            }
        }
    }
}

/// Interpret a `font-weight` value as bold or not.
fn parse_bold(value: &str) -> Option<bool> {
    match value.trim() {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        numeric => numeric.parse::<u16>().ok().map(|w| w >= 600),
    }
}
