//! Layout
//!
//! [CSS 2.1 Chapter 9: Visual formatting model](https://www.w3.org/TR/CSS2/visuren.html)
//!
//! "This chapter and the next describe the visual formatting model: how
//! user agents process the document tree for visual media."
//!
//! # Architecture
//!
//! ```text
//! NodeTree ─► layout() ─► Document ─► Block ─► Block ...
//!                 │                      └──► Line ─► Text / Input
//!                 ├─ StyleStack        (inherited text style)
//!                 ├─ InlineLayout      (word placement, wrapping, baselines)
//!                 └─ HitTestCollector  (input and link bounds)
//! ```

pub mod box_model;
pub mod inline;
pub mod layout_box;
pub mod text;

use lumen_dom::{NodeId, NodeKind, NodeTree};

pub use box_model::Rect;
pub use hit_test::{BoundsTable, HitTestCollector};
pub use inline::InlineLayout;
pub use layout_box::{
    BlockBox, DocumentBox, InputBox, LayoutBox, LayoutResult, LineBox, TextBox, layout,
};

/// Elements that make their parent a block container.
///
/// [§ 9.2.1 Block-level elements and block boxes](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
pub const BLOCK_ELEMENTS: &[&str] = &[
    "html", "body", "article", "section", "nav", "aside", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "header", "footer", "address", "p", "hr", "pre", "blockquote", "ol", "ul", "menu",
    "li", "dl", "dt", "dd", "figure", "figcaption", "main", "div", "table", "form", "fieldset",
    "legend", "details", "summary",
];

/// Elements that generate no boxes.
///
/// [§ 9.2.4 The 'display' property](https://www.w3.org/TR/CSS2/visuren.html#display-prop)
///
/// "none: This value causes an element to not appear in the formatting
/// structure."
pub const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "title", "meta", "link"];

/// Horizontal page margin in pixels.
pub const HSTEP: f32 = 13.0;

/// Vertical page margin in pixels.
pub const VSTEP: f32 = 18.0;

/// Layout settings of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Viewport width in pixels.
    pub viewport_width: f32,
    /// Viewport height in pixels.
    pub viewport_height: f32,
    /// Vertical scroll offset in pixels.
    pub scroll_y: f32,
    /// Horizontal page margin.
    pub hstep: f32,
    /// Vertical page margin.
    pub vstep: f32,
    /// Width of `input` and `button` widgets.
    pub input_width: f32,
    /// Font size of the document, in points.
    pub default_font_size: u16,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            scroll_y: 0.0,
            hstep: HSTEP,
            vstep: VSTEP,
            input_width: 200.0,
            default_font_size: 12,
        }
    }
}

/// How the content of a node is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Children are stacked as blocks.
    Block,
    /// Content forms an inline formatting context.
    Inline,
}

/// Classify `node`.
///
/// Text is inline. `input` and `button` are atomic inline boxes. An
/// element is a block container if any child is an element listed in
/// [`BLOCK_ELEMENTS`], or if it has no children at all.
#[must_use]
pub fn layout_mode(tree: &NodeTree, node: NodeId) -> LayoutMode {
    let Some(data) = tree.get(node) else {
        return LayoutMode::Block;
    };
    match &data.kind {
        NodeKind::Text(_) => LayoutMode::Inline,
        NodeKind::Element(element) if matches!(element.tag_name.as_str(), "input" | "button") => {
            LayoutMode::Inline
        }
        NodeKind::Element(_) => {
            let has_block_child = data.children.iter().any(|&child| {
                tree.tag_name(child)
                    .is_some_and(|tag| BLOCK_ELEMENTS.contains(&tag))
            });
            if has_block_child || data.children.is_empty() {
                LayoutMode::Block
            } else {
                LayoutMode::Inline
            }
        }
    }
}
