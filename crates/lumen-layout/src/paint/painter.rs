//! Painter - generates the display list from the box tree
//!
//! [CSS 2.1 Appendix E.2 Painting order](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
//!
//! The painter walks the box tree post-order. Every box yields its own
//! background, its own display items and its children's output, in that
//! order, and the result is then wrapped in the visual effects its element
//! asks for.

use lumen_common::warning::warn_once;
use lumen_dom::{ElementData, NodeId, NodeTree};

use crate::error::{LayoutError, Result};
use crate::layout::{InputBox, LayoutBox, Rect};
use crate::style::values::{parse_opacity, parse_px, parse_translate};
use crate::style::{Color, Overflow};

use super::{DisplayCommand, DisplayList};

/// Blend mode of the clip mask: keep destination pixels only where the
/// mask is opaque.
pub const CLIP_MASK_BLEND_MODE: &str = "destination-in";

/// Caret width of a focused input.
const CARET_THICKNESS: f32 = 1.0;

/// Painter that generates a display list from a box tree.
///
/// [CSS 2.1 Appendix E.2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
pub struct Painter<'a> {
    /// The node tree the boxes were built from, for style lookups.
    tree: &'a NodeTree,
}

impl<'a> Painter<'a> {
    /// Create a painter reading styles from `tree`.
    #[must_use]
    pub fn new(tree: &'a NodeTree) -> Self {
        Self { tree }
    }

    /// Paint a box tree and return the display list.
    ///
    /// # Errors
    /// [`LayoutError::UnknownNode`] if a box refers to a node missing from
    /// the tree, [`LayoutError::AllocationFailed`] if a command buffer
    /// cannot grow.
    pub fn paint(&self, layout_box: &LayoutBox) -> Result<DisplayList> {
        Ok(DisplayList::from(self.paint_box(layout_box)?))
    }

    /// Paint a single box and its descendants.
    fn paint_box(&self, layout_box: &LayoutBox) -> Result<Vec<DisplayCommand>> {
        let mut cmds = Vec::new();
        match layout_box {
            LayoutBox::Document(document) => {
                self.paint_children(&document.children, &mut cmds)?;
                Ok(cmds)
            }
            LayoutBox::Line(line) => {
                self.paint_children(&line.children, &mut cmds)?;
                Ok(cmds)
            }
            LayoutBox::Text(text) => {
                cmds.push(DisplayCommand::Glyph {
                    x: text.bounds.x,
                    y: text.bounds.y,
                    text: text.text.clone(),
                    font: text.font,
                    color: text.color,
                });
                Ok(cmds)
            }
            LayoutBox::Block(block) => {
                // A block generated for a form control wraps its Input box,
                // which paints the control's background and effects.
                let element = self
                    .element(block.node)?
                    .filter(|element| !is_form_control(element));

                // [CSS 2.1 Appendix E.2 Step 2](https://www.w3.org/TR/CSS2/zindex.html#painting-order)
                // "the background color of the element"
                if let Some(element) = element {
                    cmds.extend(Self::background(element, block.bounds));
                }
                cmds.try_reserve(block.display_items.len())?;
                cmds.extend(block.display_items.iter().cloned());
                self.paint_children(&block.children, &mut cmds)?;

                match element {
                    Some(element) => Self::paint_visual_effects(block.node, element, cmds, block.bounds),
                    None => Ok(cmds),
                }
            }
            LayoutBox::Input(input) => {
                let element = self.element(input.node)?;
                if let Some(element) = element {
                    cmds.extend(Self::background(element, input.bounds));
                }
                Self::paint_input(input, &mut cmds);
                match element {
                    Some(element) => Self::paint_visual_effects(input.node, element, cmds, input.bounds),
                    None => Ok(cmds),
                }
            }
        }
    }

    fn paint_children(&self, children: &[LayoutBox], cmds: &mut Vec<DisplayCommand>) -> Result<()> {
        for child in children {
            let child_cmds = self.paint_box(child)?;
            cmds.try_reserve(child_cmds.len())?;
            cmds.extend(child_cmds);
        }
        Ok(())
    }

    fn element(&self, node: NodeId) -> Result<Option<&'a ElementData>> {
        if self.tree.get(node).is_none() {
            return Err(LayoutError::UnknownNode(node));
        }
        Ok(self.tree.as_element(node))
    }

    /// The text of an input and, when focused, its caret.
    fn paint_input(input: &InputBox, cmds: &mut Vec<DisplayCommand>) {
        let bounds = input.bounds;
        if !input.text.is_empty() {
            cmds.push(DisplayCommand::Glyph {
                x: bounds.x,
                y: bounds.y,
                text: input.text.clone(),
                font: input.font,
                color: input.color,
            });
        }
        if input.focused {
            let caret_x = bounds.x + input.text_width;
            cmds.push(DisplayCommand::Line {
                x1: caret_x,
                y1: bounds.y,
                x2: caret_x,
                y2: bounds.bottom(),
                color: input.color,
                thickness: CARET_THICKNESS,
            });
        }
    }

    /// [CSS Backgrounds § 3.2 background-color](https://www.w3.org/TR/css-backgrounds-3/#background-color)
    ///
    /// An explicit `background-color` wins over the tag default;
    /// `transparent` (or any fully transparent color) paints nothing.
    fn background(element: &ElementData, rect: Rect) -> Option<DisplayCommand> {
        let style = &element.style;
        let explicit = style.get("background-color").and_then(|raw| {
            let color = Color::parse(raw);
            if color.is_none() {
                warn_once("Paint", &format!("ignoring background-color '{raw}'"));
            }
            color
        });
        let color = explicit.or_else(|| default_background(&element.tag_name))?;
        if color.a == 0 {
            return None;
        }

        match border_radius(element) {
            Some(radius) if radius > 0.0 => Some(DisplayCommand::RoundedRect {
                rect,
                radius,
                color,
            }),
            _ => Some(DisplayCommand::Rect { rect, color }),
        }
    }

    /// Wrap `cmds` in the effects `element` requests.
    ///
    /// The clip mask goes in first, then a Blend wraps everything, then a
    /// Transform wraps the Blend: a translation is always outermost.
    fn paint_visual_effects(
        node: NodeId,
        element: &ElementData,
        mut cmds: Vec<DisplayCommand>,
        rect: Rect,
    ) -> Result<Vec<DisplayCommand>> {
        let style = &element.style;

        // STEP 1: Clip.
        // [CSS Overflow § 3 overflow: clip](https://www.w3.org/TR/css-overflow-3/#valdef-overflow-clip)
        let overflow = style.get("overflow").map_or(Overflow::Visible, |value| {
            Overflow::parse(value).unwrap_or_else(|| {
                warn_once("Paint", &format!("ignoring overflow '{value}'"));
                Overflow::Visible
            })
        });
        let clip_radius = match (overflow, border_radius(element)) {
            (Overflow::Clip, Some(radius)) => Some(radius),
            _ => None,
        };
        if let Some(radius) = clip_radius {
            cmds.try_reserve(1)?;
            cmds.insert(
                0,
                DisplayCommand::Blend {
                    opacity: 1.0,
                    blend_mode: Some(CLIP_MASK_BLEND_MODE.to_string()),
                    needs_compositing: true,
                    children: vec![DisplayCommand::RoundedRect {
                        rect,
                        radius,
                        color: Color::WHITE,
                    }],
                    node: None,
                },
            );
        }

        // STEP 2: Opacity and blend mode.
        // [Compositing § 5.2 mix-blend-mode](https://www.w3.org/TR/compositing-1/#mix-blend-mode)
        let opacity = Self::opacity(element);
        let blend_mode = style.get("mix-blend-mode").map(str::to_string);
        if opacity < 1.0 || blend_mode.is_some() || clip_radius.is_some() {
            cmds = vec![DisplayCommand::Blend {
                opacity,
                blend_mode,
                needs_compositing: true,
                children: cmds,
                node: Some(node),
            }];
        }

        // STEP 3: Translation.
        // [CSS Transforms § 13.2 translate()](https://www.w3.org/TR/css-transforms-1/#funcdef-transform-translate)
        if let Some(transform) = style.get("transform") {
            match parse_translate(transform) {
                Some((dx, dy)) => {
                    cmds = vec![DisplayCommand::Transform {
                        dx: dx.round() as i32,
                        dy: dy.round() as i32,
                        children: cmds,
                        node: Some(node),
                    }];
                }
                None if transform.trim() == "none" => {}
                None => warn_once("Paint", &format!("ignoring transform '{transform}'")),
            }
        }

        Ok(cmds)
    }

    /// A running `opacity` animation wins over the static style value.
    fn opacity(element: &ElementData) -> f32 {
        if let Some(value) = element.animated_value("opacity") {
            return (value as f32).clamp(0.0, 1.0);
        }
        match element.style.get("opacity") {
            Some(raw) => parse_opacity(raw).unwrap_or_else(|| {
                warn_once("Paint", &format!("ignoring opacity '{raw}'"));
                1.0
            }),
            None => 1.0,
        }
    }
}

/// `input` and `button` elements, laid out as Input boxes.
fn is_form_control(element: &ElementData) -> bool {
    matches!(element.tag_name.as_str(), "input" | "button")
}

/// Background of elements that carry one without any style.
fn default_background(tag_name: &str) -> Option<Color> {
    match tag_name {
        "pre" => Some(Color::LIGHT_GRAY),
        "input" | "button" => Some(Color::LIGHT_BLUE),
        _ => None,
    }
}

/// `border-radius: <N>px`, ignoring malformed values.
fn border_radius(element: &ElementData) -> Option<f32> {
    let raw = element.style.get("border-radius")?;
    let radius = parse_px(raw);
    if radius.is_none() {
        warn_once("Paint", &format!("ignoring border-radius '{raw}'"));
    }
    radius.filter(|r| *r >= 0.0)
}
