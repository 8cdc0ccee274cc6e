//! Display List - a tree of drawing commands
//!
//! [CSS 2.1 Appendix E](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! The display list is the output of the painting phase. Primitive commands
//! are listed back to front; effect commands ([`DisplayCommand::Blend`],
//! [`DisplayCommand::Transform`]) own the commands they apply to, so the
//! list is a shallow tree that a rasterizer composites group by group.

use lumen_dom::NodeId;
use serde::Serialize;

use crate::font::FontRequest;
use crate::layout::Rect;
use crate::style::Color;

/// A single drawing command.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DisplayCommand {
    /// Draw text with its top-left corner at `(x, y)`.
    Glyph {
        /// Left edge of the text.
        x: f32,
        /// Top edge of the glyph box.
        y: f32,
        /// The text to draw.
        text: String,
        /// Face to draw with.
        font: FontRequest,
        /// Fill color.
        color: Color,
    },

    /// Fill a rectangle with a solid color.
    Rect {
        /// Area to fill.
        rect: Rect,
        /// Fill color.
        color: Color,
    },

    /// Fill a rectangle with rounded corners.
    ///
    /// [§ 5 'border-radius'](https://www.w3.org/TR/css-backgrounds-3/#border-radius)
    RoundedRect {
        /// Area to fill.
        rect: Rect,
        /// Radius of every corner.
        radius: f32,
        /// Fill color.
        color: Color,
    },

    /// Stroke a straight line.
    Line {
        /// Start x.
        x1: f32,
        /// Start y.
        y1: f32,
        /// End x.
        x2: f32,
        /// End y.
        y2: f32,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        thickness: f32,
    },

    /// Composite `children` as one group with the given opacity and blend
    /// mode.
    ///
    /// [Compositing and Blending Level 1](https://www.w3.org/TR/compositing-1/)
    Blend {
        /// Group opacity in `[0, 1]`.
        opacity: f32,
        /// `mix-blend-mode` value, passed through verbatim. The clip mask
        /// uses `destination-in`.
        blend_mode: Option<String>,
        /// Whether the group must be rendered into an offscreen surface.
        needs_compositing: bool,
        /// Commands in the group.
        children: Vec<DisplayCommand>,
        /// Element the group was painted for.
        node: Option<NodeId>,
    },

    /// Draw `children` shifted by whole pixels.
    ///
    /// [§ 13.2 translate()](https://www.w3.org/TR/css-transforms-1/#funcdef-transform-translate)
    Transform {
        /// Horizontal shift.
        dx: i32,
        /// Vertical shift.
        dy: i32,
        /// Commands to shift.
        children: Vec<DisplayCommand>,
        /// Element the transform belongs to.
        node: Option<NodeId>,
    },
}

impl DisplayCommand {
    /// Nested commands of an effect command; empty for primitives.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Blend { children, .. } | Self::Transform { children, .. } => children,
            Self::Glyph { .. } | Self::Rect { .. } | Self::RoundedRect { .. } | Self::Line { .. } => {
                &[]
            }
        }
    }

    /// Lowercase name of the variant, for debugging output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Glyph { .. } => "glyph",
            Self::Rect { .. } => "rect",
            Self::RoundedRect { .. } => "rounded-rect",
            Self::Line { .. } => "line",
            Self::Blend { .. } => "blend",
            Self::Transform { .. } => "transform",
        }
    }
}

/// A list of drawing commands in painting order.
///
/// [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DisplayList {
    commands: Vec<DisplayCommand>,
}

impl DisplayList {
    /// Create an empty display list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Add a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Get the top-level commands in painting order.
    #[must_use]
    pub fn commands(&self) -> &[DisplayCommand] {
        &self.commands
    }

    /// Get the number of top-level commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if the display list is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every command, nested ones included, in depth-first order: an effect
    /// command is yielded before the commands it wraps.
    #[must_use]
    pub fn iter_flat(&self) -> FlatIter<'_> {
        FlatIter {
            stack: vec![self.commands.iter()],
        }
    }
}

impl From<Vec<DisplayCommand>> for DisplayList {
    fn from(commands: Vec<DisplayCommand>) -> Self {
        Self { commands }
    }
}

/// Depth-first iterator returned by [`DisplayList::iter_flat`].
#[derive(Debug)]
pub struct FlatIter<'a> {
    stack: Vec<std::slice::Iter<'a, DisplayCommand>>,
}

impl<'a> Iterator for FlatIter<'a> {
    type Item = &'a DisplayCommand;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(command) => {
                    let nested = command.children();
                    if !nested.is_empty() {
                        self.stack.push(nested.iter());
                    }
                    return Some(command);
                }
                None => {
                    let _ = self.stack.pop();
                }
            }
        }
    }
}
