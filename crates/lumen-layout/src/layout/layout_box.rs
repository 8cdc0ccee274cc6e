//! Layout boxes and the box tree builder.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! "The following sections describe the types of boxes that may be
//! generated in CSS 2.1."
//!
//! The tree always has the shape Document → Block → (Block | Line → Text /
//! Input). It is rebuilt from scratch on every pass and borrows nothing
//! from the node tree except [`NodeId`] handles.

#[cfg(feature = "layout-trace")]
use std::cell::Cell;

use lumen_dom::{NodeId, NodeKind, NodeTree};
use serde::Serialize;

use super::box_model::Rect;
use super::hit_test::{BoundsTable, HitTestCollector};
use super::inline::InlineLayout;
use super::{HIDDEN_ELEMENTS, LayoutMode, LayoutOptions, layout_mode};
use crate::error::{LayoutError, Result};
use crate::font::{FontRequest, FontService};
use crate::paint::DisplayCommand;
use crate::style::{Color, StyleStack};

#[cfg(feature = "layout-trace")]
thread_local! {
    static LAYOUT_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Horizontal indent of list item content.
const LIST_INDENT: f32 = 16.0;

/// Side length of a list item bullet.
const BULLET_SIZE: f32 = 8.0;

/// Distance from the top of a list item to its bullet.
const BULLET_TOP: f32 = 4.0;

/// Root of the box tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentBox {
    /// Content rectangle: the viewport minus the page margins.
    pub bounds: Rect,
    /// Root node of the laid out tree.
    pub node: NodeId,
    /// The single block generated for the root node.
    pub children: Vec<LayoutBox>,
}

/// [§ 9.2.1 Block-level elements and block boxes](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
///
/// "A block container box either contains only block-level boxes or
/// establishes an inline formatting context and thus contains only
/// inline-level boxes."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockBox {
    /// Resolved geometry.
    pub bounds: Rect,
    /// The node this block was generated for.
    pub node: NodeId,
    /// Child blocks, or the lines of an inline formatting context.
    pub children: Vec<LayoutBox>,
    /// Commands this block paints itself, after its background (list
    /// bullets).
    pub display_items: Vec<DisplayCommand>,
}

/// [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
///
/// "The rectangular area that contains the boxes that form a line is
/// called a line box."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBox {
    /// Full width of the containing block, height including leading.
    pub bounds: Rect,
    /// Block that established the inline formatting context.
    pub node: NodeId,
    /// Absolute y of the baseline.
    pub baseline: f32,
    /// Text and input boxes, in placement order.
    pub children: Vec<LayoutBox>,
}

/// A run of text placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBox {
    /// Glyph box: `width` is the advance, `height` is ascent plus descent.
    pub bounds: Rect,
    /// Text node the run came from.
    pub node: NodeId,
    /// The rendered text.
    pub text: String,
    /// Face the text is painted with.
    pub font: FontRequest,
    /// Height above the baseline.
    pub ascent: f32,
    /// Depth below the baseline.
    pub descent: f32,
    /// Fill color.
    pub color: Color,
    /// Raised to the line top instead of sitting on the baseline.
    pub superscript: bool,
}

/// An `input` or `button` widget placed on a line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputBox {
    /// Widget rectangle.
    pub bounds: Rect,
    /// The `input` or `button` element.
    pub node: NodeId,
    /// The value of an `input`, the text content of a `button`.
    pub text: String,
    /// Advance width of `text`; the caret of a focused input sits here.
    pub text_width: f32,
    /// Face the text is painted with.
    pub font: FontRequest,
    /// Height above the baseline.
    pub ascent: f32,
    /// Depth below the baseline.
    pub descent: f32,
    /// Text color.
    pub color: Color,
    /// The element has focus.
    pub focused: bool,
}

/// A box in the layout tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayoutBox {
    /// Root box.
    Document(DocumentBox),
    /// Block container.
    Block(BlockBox),
    /// Line of an inline formatting context.
    Line(LineBox),
    /// Text run.
    Text(TextBox),
    /// Form control.
    Input(InputBox),
}

impl LayoutBox {
    /// Resolved geometry.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        match self {
            Self::Document(b) => b.bounds,
            Self::Block(b) => b.bounds,
            Self::Line(b) => b.bounds,
            Self::Text(b) => b.bounds,
            Self::Input(b) => b.bounds,
        }
    }

    /// The node this box was generated for. Lines report their block.
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::Document(b) => b.node,
            Self::Block(b) => b.node,
            Self::Line(b) => b.node,
            Self::Text(b) => b.node,
            Self::Input(b) => b.node,
        }
    }

    /// Child boxes in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Document(b) => &b.children,
            Self::Block(b) => &b.children,
            Self::Line(b) => &b.children,
            Self::Text(_) | Self::Input(_) => &[],
        }
    }

    /// Lowercase name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Block(_) => "block",
            Self::Line(_) => "line",
            Self::Text(_) => "text",
            Self::Input(_) => "input",
        }
    }

    /// This box and every descendant, pre-order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect_descendants(&mut out);
        out
    }

    fn collect_descendants<'a>(&'a self, out: &mut Vec<&'a Self>) {
        out.push(self);
        for child in self.children() {
            child.collect_descendants(out);
        }
    }
}

/// Output of one layout pass.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    /// The Document box.
    pub document: LayoutBox,
    /// Widget rectangles of `input` and `button` elements.
    pub input_bounds: BoundsTable,
    /// Merged glyph rectangles of `a` elements.
    pub link_bounds: BoundsTable,
}

/// State owned by one layout pass.
///
/// The style stack and the hit-test tables live here, so nothing leaks
/// between passes.
struct LayoutContext<'a> {
    tree: &'a NodeTree,
    fonts: &'a dyn FontService,
    options: &'a LayoutOptions,
    style: StyleStack,
    hits: HitTestCollector,
}

/// Lay out the subtree rooted at `root`.
///
/// The Document box sits at `(hstep, vstep)` and is
/// `viewport_width - 2 * hstep` wide; its height is the height of the root
/// block.
///
/// # Errors
/// [`LayoutError::UnknownNode`] if `root` is not in `tree`, otherwise the
/// first font service or allocation error met.
pub fn layout(
    tree: &NodeTree,
    root: NodeId,
    fonts: &dyn FontService,
    options: &LayoutOptions,
) -> Result<LayoutResult> {
    if tree.get(root).is_none() {
        return Err(LayoutError::UnknownNode(root));
    }

    let mut ctx = LayoutContext {
        tree,
        fonts,
        options,
        style: StyleStack::new(options.default_font_size),
        hits: HitTestCollector::new(),
    };

    let x = options.hstep;
    let y = options.vstep;
    let width = options.viewport_width - 2.0 * options.hstep;
    let child = ctx.layout_block(root, x, y, width)?;
    let height = child.bounds().height;

    let document = LayoutBox::Document(DocumentBox {
        bounds: Rect::new(x, y, width, height),
        node: root,
        children: vec![child],
    });
    let (input_bounds, link_bounds) = ctx.hits.into_tables();
    Ok(LayoutResult {
        document,
        input_bounds,
        link_bounds,
    })
}

impl LayoutContext<'_> {
    /// Run `f` with `node`'s style entered, restoring it afterwards even
    /// when `f` fails.
    fn scoped<T>(&mut self, node: NodeId, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let tree = self.tree;
        let Some(element) = tree.as_element(node) else {
            return f(self);
        };
        self.style.enter(element);
        let result = f(self);
        let balanced = self.style.exit();
        debug_assert!(balanced, "style stack underflow leaving {node:?}");
        result
    }

    /// [§ 10.3.3 Block-level, non-replaced elements in normal flow](https://www.w3.org/TR/CSS2/visudet.html#blockwidth)
    ///
    /// Build the Block box of `node` at `(x, y)`, `width` wide.
    fn layout_block(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> Result<LayoutBox> {
        #[cfg(feature = "layout-trace")]
        let depth = LAYOUT_DEPTH.with(|d| {
            let current = d.get();
            d.set(current + 1);
            current
        });
        #[cfg(feature = "layout-trace")]
        eprintln!(
            "{:indent$}[LAYOUT] block {node:?} <{}> at ({x}, {y}) width={width}",
            "",
            self.tree.tag_name(node).unwrap_or("#text"),
            indent = depth * 2
        );

        let result = self.scoped(node, |ctx| ctx.layout_block_contents(node, x, y, width));

        #[cfg(feature = "layout-trace")]
        LAYOUT_DEPTH.with(|d| d.set(depth));

        result
    }

    fn layout_block_contents(&mut self, node: NodeId, x: f32, y: f32, width: f32) -> Result<LayoutBox> {
        let tree = self.tree;
        if tree.get(node).is_none() {
            return Err(LayoutError::UnknownNode(node));
        }

        // STEP 1: List items get a bullet and indented content.
        let mut display_items = Vec::new();
        let (content_x, content_width) = if tree.tag_name(node) == Some("li") {
            display_items.push(DisplayCommand::Rect {
                rect: Rect::new(x, y + BULLET_TOP, BULLET_SIZE, BULLET_SIZE),
                color: self.style.current().color,
            });
            (x + LIST_INDENT, (width - LIST_INDENT).max(0.0))
        } else {
            (x, width)
        };

        // STEP 2: Stack child blocks, or run an inline formatting context.
        let (children, height) = match layout_mode(tree, node) {
            LayoutMode::Block => {
                let mut children = Vec::new();
                let mut cursor_y = y;
                for &child in tree.children(node) {
                    if tree
                        .tag_name(child)
                        .is_some_and(|tag| HIDDEN_ELEMENTS.contains(&tag))
                    {
                        continue;
                    }
                    let child_box = self.layout_block(child, content_x, cursor_y, content_width)?;
                    cursor_y += child_box.bounds().height;
                    children.try_reserve(1)?;
                    children.push(child_box);
                }
                (children, cursor_y - y)
            }
            LayoutMode::Inline => {
                let mut inline = InlineLayout::new(
                    self.fonts,
                    tree,
                    node,
                    (content_x, content_x + content_width),
                    y,
                    self.is_rtl(node),
                );
                inline.set_title(
                    tree.as_element(node)
                        .is_some_and(|e| e.tag_name == "h1" && e.has_class("title")),
                );
                self.inline_contents(node, &mut inline)?;
                let (lines, bottom) = inline.finish(&mut self.hits)?;
                (lines, bottom - y)
            }
        };

        Ok(LayoutBox::Block(BlockBox {
            bounds: Rect::new(x, y, width, height),
            node,
            children,
            display_items,
        }))
    }

    /// `dir="rtl"` on the node or its nearest ancestor carrying `dir`.
    fn is_rtl(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find_map(|id| self.tree.as_element(id)?.attrs.get("dir"))
            .is_some_and(|dir| dir.eq_ignore_ascii_case("rtl"))
    }

    /// Feed the content of the block root `node` to `inline`. The root's
    /// own style is already entered.
    fn inline_contents(&mut self, node: NodeId, inline: &mut InlineLayout<'_>) -> Result<()> {
        match self.tree.tag_name(node) {
            Some("input" | "button") => self.inline_input(node, inline),
            Some("br") => {
                let style = *self.style.current();
                inline.break_line(&style, &mut self.hits)
            }
            _ => self.inline_children(node, inline),
        }
    }

    fn inline_children(&mut self, node: NodeId, inline: &mut InlineLayout<'_>) -> Result<()> {
        let tree = self.tree;
        if let Some(text) = tree.as_text(node) {
            return self.inline_text(node, text, inline);
        }
        for &child in tree.children(node) {
            self.inline_node(child, inline)?;
        }
        Ok(())
    }

    /// Recurse into one node inside an inline formatting context.
    fn inline_node(&mut self, node: NodeId, inline: &mut InlineLayout<'_>) -> Result<()> {
        let tree = self.tree;
        let kind = &tree.get(node).ok_or(LayoutError::UnknownNode(node))?.kind;
        match kind {
            NodeKind::Text(text) => self.inline_text(node, text, inline),
            NodeKind::Element(element) => {
                if HIDDEN_ELEMENTS.contains(&element.tag_name.as_str()) {
                    return Ok(());
                }
                self.scoped(node, |ctx| ctx.inline_contents(node, inline))
            }
        }
    }

    /// [§ 4.1 White Space Processing](https://www.w3.org/TR/css-text-3/#white-space-processing)
    ///
    /// Collapsible whitespace separates words and is replaced by one space
    /// advance after each word. Preformatted text keeps every space and
    /// breaks at every newline.
    fn inline_text(&mut self, node: NodeId, text: &str, inline: &mut InlineLayout<'_>) -> Result<()> {
        let style = *self.style.current();
        if style.preformatted {
            for (line_index, line) in text.split('\n').enumerate() {
                if line_index > 0 {
                    inline.break_line(&style, &mut self.hits)?;
                }
                for (word_index, word) in line.split(' ').enumerate() {
                    if word_index > 0 {
                        inline.add_space(&style)?;
                    }
                    inline.add_word(word, &style, node, &mut self.hits)?;
                }
            }
        } else {
            for word in text.split_whitespace() {
                inline.add_word(word, &style, node, &mut self.hits)?;
                inline.add_space(&style)?;
            }
        }
        Ok(())
    }

    /// Inputs show their `value`, buttons their text content.
    fn inline_input(&mut self, node: NodeId, inline: &mut InlineLayout<'_>) -> Result<()> {
        let tree = self.tree;
        let element = tree.as_element(node).ok_or(LayoutError::UnknownNode(node))?;
        let text = if element.tag_name == "button" {
            tree.text_content(node)
        } else {
            element.attrs.get("value").cloned().unwrap_or_default()
        };
        let style = *self.style.current();
        inline.add_input(
            node,
            &text,
            self.options.input_width,
            element.is_focused,
            &style,
            &mut self.hits,
        )
    }
}
