//! Layout and paint for the Lumen document renderer.
//!
//! Given a node tree whose elements carry already-cascaded style maps, this
//! crate builds a tree of positioned boxes and paints it into a display
//! list for a rasterizer:
//!
//! - [`style`]: the style stack inherited text style is resolved with
//! - [`layout`]: block/inline classification, line breaking, the box tree
//!   and the hit-test tables
//! - [`paint`]: backgrounds, glyphs and compositing effects
//! - [`font`]: the font service boundary layout measures text through
//!
//! Every pass is synchronous and starts from scratch. Errors from the font
//! service abort the pass; malformed style values never do.

pub mod error;
pub mod font;
pub mod layout;
pub mod paint;
pub mod style;

pub use error::{LayoutError, Result};
pub use font::{ApproximateFontService, FontCategory, FontRequest, FontService, Glyph};
pub use layout::{LayoutBox, LayoutOptions, LayoutResult, Rect, layout};
pub use paint::{DisplayCommand, DisplayList, Painter};
pub use style::{Color, StyleSnapshot, StyleStack};
