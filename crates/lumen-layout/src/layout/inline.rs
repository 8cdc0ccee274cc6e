//! Inline Layout and Line Box construction.
//!
//! [§ 9.4.2 Inline formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#inline-formatting)
//!
//! "In an inline formatting context, boxes are laid out horizontally, one
//! after the other, beginning at the top of a containing block."
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Text arrives here one word at a time. Each word is cut into
//! [`Segment`]s, measured through the [`FontService`] and placed on the
//! pending line; the line is flushed into a [`LineBox`] once the next
//! segment no longer fits or a break is forced.

use lumen_dom::{NodeId, NodeTree};

use super::box_model::Rect;
use super::hit_test::HitTestCollector;
use super::layout_box::{InputBox, LayoutBox, LineBox, TextBox};
use super::text::{Segment, segment_word};
use crate::error::Result;
use crate::font::{FontRequest, FontService, Glyph};
use crate::style::{Color, StyleSnapshot};

/// Extra leading added below every line, as a fraction of its glyph height.
const LEADING: f32 = 0.25;

/// What a pending item becomes once its line is flushed.
#[derive(Debug, Clone)]
enum PendingContent {
    Text(String),
    Input { text: String, text_width: f32 },
}

/// An item placed horizontally on the current line, waiting for the
/// baseline to be known.
#[derive(Debug, Clone)]
struct PendingItem {
    content: PendingContent,
    node: NodeId,
    x: f32,
    width: f32,
    glyph: Glyph,
    font: FontRequest,
    color: Color,
    superscript: bool,
    focused: bool,
    offset: (f32, f32),
}

/// Inline formatting context of one block.
///
/// Positions are absolute. `line_left` and `line_right` bound every line;
/// `cursor` is where the next item starts (its left edge in left-to-right
/// mode, its right edge in right-to-left mode).
pub struct InlineLayout<'a> {
    fonts: &'a dyn FontService,
    tree: &'a NodeTree,
    node: NodeId,
    line_left: f32,
    line_right: f32,
    line_top: f32,
    cursor: f32,
    rtl: bool,
    title: bool,
    pending: Vec<PendingItem>,
    lines: Vec<LayoutBox>,
}

impl<'a> InlineLayout<'a> {
    /// Create an inline context for block `node` whose lines span
    /// `[line_left, line_right]` and start at `top`.
    #[must_use]
    pub fn new(
        fonts: &'a dyn FontService,
        tree: &'a NodeTree,
        node: NodeId,
        (line_left, line_right): (f32, f32),
        top: f32,
        rtl: bool,
    ) -> Self {
        Self {
            fonts,
            tree,
            node,
            line_left,
            line_right,
            line_top: top,
            cursor: if rtl { line_right } else { line_left },
            rtl,
            title: false,
            pending: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Center the next flushed line. The flag clears after one flush.
    pub fn set_title(&mut self, title: bool) {
        self.title = title;
    }

    /// Position of the cursor on the current line.
    #[must_use]
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    fn line_start(&self) -> f32 {
        if self.rtl { self.line_right } else { self.line_left }
    }

    fn at_line_start(&self) -> bool {
        self.pending.is_empty() && (self.cursor - self.line_start()).abs() < f32::EPSILON
    }

    /// Whether an item `width` wide fits before the line edge.
    fn fits(&self, width: f32) -> bool {
        if self.rtl {
            self.cursor - width >= self.line_left
        } else {
            self.cursor + width <= self.line_right
        }
    }

    /// Claim `width` at the cursor, returning the item's left edge.
    fn advance(&mut self, width: f32) -> f32 {
        if self.rtl {
            self.cursor -= width;
            self.cursor
        } else {
            let x = self.cursor;
            self.cursor += width;
            x
        }
    }

    /// Add one word of text node `node`. No space is added after it.
    ///
    /// # Errors
    /// Propagates segmentation and font service errors.
    pub fn add_word(
        &mut self,
        word: &str,
        style: &StyleSnapshot,
        node: NodeId,
        hits: &mut HitTestCollector,
    ) -> Result<()> {
        for segment in segment_word(word, style, node)? {
            self.place_segment(segment, style, node, hits)?;
        }
        Ok(())
    }

    /// Advance the cursor by the width of a space in the current font.
    ///
    /// # Errors
    /// Propagates font service errors.
    pub fn add_space(&mut self, style: &StyleSnapshot) -> Result<()> {
        let space = self.fonts.glyph(" ", style.font_request())?;
        let _ = self.advance(space.width);
        Ok(())
    }

    /// [§ 5.5.1 Line Breaking Details](https://www.w3.org/TR/css-text-3/#line-break-details)
    ///
    /// Place one segment, wrapping as many times as needed.
    fn place_segment(
        &mut self,
        mut segment: Segment,
        style: &StyleSnapshot,
        node: NodeId,
        hits: &mut HitTestCollector,
    ) -> Result<()> {
        loop {
            // STEP 1: Measure.
            let glyph = self.fonts.glyph(&segment.text, segment.font)?;

            // STEP 2: Place it if it fits.
            if self.fits(glyph.width) {
                self.push_text(segment, glyph, style, node);
                return Ok(());
            }

            // STEP 3: Break at the longest soft hyphen prefix that fits.
            if let Some((head, head_glyph, tail)) = self.fitting_hyphen_split(&segment)? {
                self.push_text(head, head_glyph, style, node);
                self.flush(hits)?;
                segment = tail;
                continue;
            }

            // STEP 4: An oversized segment alone on its line is placed
            // anyway; otherwise wrap and retry.
            if self.at_line_start() {
                self.push_text(segment, glyph, style, node);
                return Ok(());
            }
            self.flush(hits)?;
        }
    }

    fn fitting_hyphen_split(&self, segment: &Segment) -> Result<Option<(Segment, Glyph, Segment)>> {
        for &point in segment.hyphen_points.iter().rev() {
            let (head, tail) = segment.split_at_hyphen(point);
            let glyph = self.fonts.glyph(&head.text, head.font)?;
            if self.fits(glyph.width) {
                return Ok(Some((head, glyph, tail)));
            }
        }
        Ok(None)
    }

    fn push_text(&mut self, segment: Segment, glyph: Glyph, style: &StyleSnapshot, node: NodeId) {
        let x = self.advance(glyph.width);
        self.pending.push(PendingItem {
            content: PendingContent::Text(segment.text),
            node,
            x,
            width: glyph.width,
            glyph,
            font: segment.font,
            color: style.color,
            superscript: style.superscript,
            focused: false,
            offset: (style.transform_offset_x, style.transform_offset_y),
        });
    }

    /// Place an atomic form control `width` pixels wide showing `text`.
    ///
    /// # Errors
    /// Propagates font service errors.
    pub fn add_input(
        &mut self,
        node: NodeId,
        text: &str,
        width: f32,
        focused: bool,
        style: &StyleSnapshot,
        hits: &mut HitTestCollector,
    ) -> Result<()> {
        let font = style.font_request();
        let metrics = self.fonts.glyph(if text.is_empty() { " " } else { text }, font)?;
        let text_width = if text.is_empty() { 0.0 } else { metrics.width };

        if !self.fits(width) && !self.at_line_start() {
            self.flush(hits)?;
        }
        let x = self.advance(width);
        self.pending.push(PendingItem {
            content: PendingContent::Input {
                text: text.to_string(),
                text_width,
            },
            node,
            x,
            width,
            glyph: Glyph { width, ..metrics },
            font,
            color: style.color,
            superscript: style.superscript,
            focused,
            offset: (style.transform_offset_x, style.transform_offset_y),
        });
        self.add_space(style)
    }

    /// Forced break (`<br>` or a preserved newline).
    ///
    /// An empty line still produces a Line box one blank line tall.
    ///
    /// # Errors
    /// Propagates font service and allocation errors.
    pub fn break_line(&mut self, style: &StyleSnapshot, hits: &mut HitTestCollector) -> Result<()> {
        if !self.pending.is_empty() {
            return self.flush(hits);
        }
        let blank = self.fonts.glyph(" ", style.font_request())?;
        let height = blank.height() * (1.0 + LEADING);
        self.lines.push(LayoutBox::Line(LineBox {
            bounds: Rect::new(
                self.line_left,
                self.line_top,
                self.line_right - self.line_left,
                height,
            ),
            node: self.node,
            baseline: self.line_top + blank.ascent,
            children: Vec::new(),
        }));
        self.line_top += height;
        self.cursor = self.line_start();
        self.title = false;
        Ok(())
    }

    /// [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// Turn the pending items into a Line box and start a new line.
    ///
    /// "The height of the line box is the distance between the uppermost
    /// box top and the lowermost box bottom."
    ///
    /// # Errors
    /// [`crate::LayoutError::AllocationFailed`] if the line's child list cannot grow.
    pub fn flush(&mut self, hits: &mut HitTestCollector) -> Result<()> {
        let mut items = std::mem::take(&mut self.pending);
        self.cursor = self.line_start();
        if items.is_empty() {
            return Ok(());
        }

        // STEP 1: Center a title line, once.
        if self.title {
            let left = items.iter().map(|i| i.x).fold(f32::INFINITY, f32::min);
            let right = items
                .iter()
                .map(|i| i.x + i.width)
                .fold(f32::NEG_INFINITY, f32::max);
            let shift = self.line_left + (self.line_right - self.line_left - (right - left)) / 2.0 - left;
            for item in &mut items {
                item.x += shift;
            }
            self.title = false;
        }

        // STEP 2: Line metrics. Superscripts sit at the line top and do
        // not push the baseline down, unless the line holds nothing else.
        let all_superscript = items.iter().all(|i| i.superscript);
        let (max_ascent, max_descent) = items
            .iter()
            .filter(|i| all_superscript || !i.superscript)
            .fold((0.0_f32, 0.0_f32), |(a, d), i| {
                (a.max(i.glyph.ascent), d.max(i.glyph.descent))
            });
        let baseline = self.line_top + max_ascent;
        let glyph_height = max_ascent + max_descent;

        // STEP 3: Vertical placement and hit-test recording.
        let mut children = Vec::new();
        children.try_reserve_exact(items.len())?;
        for item in items {
            let y = if item.superscript {
                self.line_top
            } else {
                baseline - item.glyph.ascent
            };
            let bounds = Rect::new(item.x, y, item.width, item.glyph.height());
            let hit_rect = bounds.translate(item.offset.0, item.offset.1);

            let child = match item.content {
                PendingContent::Text(text) => {
                    hits.record_glyph(self.tree, item.node, hit_rect);
                    LayoutBox::Text(TextBox {
                        bounds,
                        node: item.node,
                        text,
                        font: item.font,
                        ascent: item.glyph.ascent,
                        descent: item.glyph.descent,
                        color: item.color,
                        superscript: item.superscript,
                    })
                }
                PendingContent::Input { text, text_width } => {
                    hits.record_input(item.node, hit_rect);
                    LayoutBox::Input(InputBox {
                        bounds,
                        node: item.node,
                        text,
                        text_width,
                        font: item.font,
                        ascent: item.glyph.ascent,
                        descent: item.glyph.descent,
                        color: item.color,
                        focused: item.focused,
                    })
                }
            };
            children.push(child);
        }

        // STEP 4: Emit the line and advance past it, with leading.
        let height = glyph_height * (1.0 + LEADING);
        self.lines.try_reserve(1)?;
        self.lines.push(LayoutBox::Line(LineBox {
            bounds: Rect::new(
                self.line_left,
                self.line_top,
                self.line_right - self.line_left,
                height,
            ),
            node: self.node,
            baseline,
            children,
        }));
        self.line_top += height;
        Ok(())
    }

    /// Flush the last line and return the lines with the y coordinate just
    /// below them.
    ///
    /// # Errors
    /// Propagates [`InlineLayout::flush`] errors.
    pub fn finish(mut self, hits: &mut HitTestCollector) -> Result<(Vec<LayoutBox>, f32)> {
        self.flush(hits)?;
        Ok((self.lines, self.line_top))
    }
}
