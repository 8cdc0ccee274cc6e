//! Page pipeline for the Lumen renderer.
//!
//! # Scope
//!
//! This crate provides:
//! - **Rendering passes** - layout plus paint over a node tree, producing
//!   the box tree, the display list, the scrollable content height and
//!   the hit-test tables
//! - **Font measurement** - a fontdue-backed [`FontService`] with an
//!   append-only glyph cache
//! - **Animation stepping** - advancing element animations between frames
//!
//! Rasterizing the display list is left to the embedder.

pub mod font_service;

pub use lumen_dom as dom;
pub use lumen_layout as layout;

pub use font_service::FontdueFontService;

use anyhow::{Context, Result};
use lumen_common::warning::clear_warnings;
use lumen_dom::{NodeId, NodeTree};
use lumen_layout::layout::BoundsTable;
use lumen_layout::{DisplayList, FontService, LayoutBox, LayoutOptions, Painter};

/// Everything one rendering pass produces.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The Document box with resolved geometry.
    pub document: LayoutBox,
    /// Drawing commands for the rasterizer.
    pub display_list: DisplayList,
    /// Height of the scrollable area: the document height, or the scroll
    /// offset if that is larger.
    pub content_height: f32,
    /// Widget rectangles of `input` and `button` elements.
    pub input_bounds: BoundsTable,
    /// Rectangles of `a` elements.
    pub link_bounds: BoundsTable,
}

impl RenderOutput {
    /// The anchor under page point `(x, y)`.
    #[must_use]
    pub fn link_at(&self, x: f32, y: f32) -> Option<NodeId> {
        hit(&self.link_bounds, x, y)
    }

    /// The form control under page point `(x, y)`.
    #[must_use]
    pub fn input_at(&self, x: f32, y: f32) -> Option<NodeId> {
        hit(&self.input_bounds, x, y)
    }
}

/// Smallest node id whose rectangle contains the point, so overlapping
/// entries resolve the same way on every call.
fn hit(table: &BoundsTable, x: f32, y: f32) -> Option<NodeId> {
    table
        .iter()
        .filter(|(_, rect)| rect.contains_point(x, y))
        .map(|(&node, _)| node)
        .min()
}

/// A node tree together with the font service used to render it.
pub struct Page {
    tree: NodeTree,
    root: NodeId,
    fonts: Box<dyn FontService>,
}

impl Page {
    /// Create a page rendering the subtree at `root`.
    #[must_use]
    pub fn new(tree: NodeTree, root: NodeId, fonts: Box<dyn FontService>) -> Self {
        Self { tree, root, fonts }
    }

    /// The node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Mutable access to the node tree, for focus and style changes
    /// between passes.
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// The root node passes start from.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Run one full layout and paint pass.
    ///
    /// Nothing from earlier passes is reused. Warnings are reset so each
    /// pass reports its own malformed style values.
    ///
    /// # Errors
    /// Returns the first layout or paint error, with context.
    pub fn render(&self, options: &LayoutOptions) -> Result<RenderOutput> {
        clear_warnings();

        let result = lumen_layout::layout(&self.tree, self.root, self.fonts.as_ref(), options)
            .context("layout pass failed")?;
        let display_list = Painter::new(&self.tree)
            .paint(&result.document)
            .context("paint pass failed")?;
        let content_height = result.document.bounds().height.max(options.scroll_y);

        Ok(RenderOutput {
            document: result.document,
            display_list,
            content_height,
            input_bounds: result.input_bounds,
            link_bounds: result.link_bounds,
        })
    }

    /// Step every running element animation by one frame.
    ///
    /// Returns `true` while any animation still has frames left, i.e. while
    /// another pass would paint something different.
    pub fn advance_animations(&mut self) -> bool {
        let ids: Vec<NodeId> = self.tree.ids().collect();
        let mut running = false;
        for id in ids {
            let Some(element) = self.tree.element_mut(id) else {
                continue;
            };
            for animation in element.animations.values_mut() {
                if animation.advance() && !animation.is_finished() {
                    running = true;
                }
            }
        }
        running
    }
}
