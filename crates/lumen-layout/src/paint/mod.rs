//! Painting
//!
//! [CSS 2.1 Appendix E - Elaborate description of Stacking Contexts](https://www.w3.org/TR/CSS2/zindex.html)
//!
//! This module converts a box tree into a display list of drawing commands
//! that a separate rasterizer executes.
//!
//! ```text
//! Style → Layout → Paint → Raster
//!                    ↓
//!              DisplayList
//! ```

mod display_list;
mod painter;

pub use display_list::{DisplayCommand, DisplayList, FlatIter};
pub use painter::{CLIP_MASK_BLEND_MODE, Painter};
