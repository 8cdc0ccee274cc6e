//! Errors surfaced by layout and paint.
//!
//! Every layout and paint function propagates the first error it meets to
//! its caller. There is no per-glyph recovery: a cluster no font can cover
//! aborts the whole pass, and the partially built box tree must be
//! discarded. Malformed style values are not errors; see
//! [`crate::style::StyleStack`].

use std::collections::TryReserveError;

use lumen_dom::NodeId;
use thiserror::Error;

use crate::font::FontCategory;

/// Error type for layout and paint passes.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// No loaded font covers the category of a grapheme cluster.
    #[error("no font covers {category} cluster {cluster:?}")]
    NoFontForGlyph {
        /// The cluster that could not be measured.
        cluster: String,
        /// Its font category.
        category: FontCategory,
    },

    /// The font service failed to produce metrics for a glyph.
    #[error("glyph rendering failed: {0}")]
    RenderFailed(String),

    /// Grapheme extraction produced a cluster with no code point.
    #[error("text of node {node:?} yielded a cluster with no code point")]
    InvalidUtf8 {
        /// The text node being segmented.
        node: NodeId,
    },

    /// A buffer could not grow.
    #[error("allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),

    /// A node handle does not resolve in the tree being laid out.
    #[error("node {0:?} is not part of the tree")]
    UnknownNode(NodeId),
}

/// Result alias used throughout layout and paint.
pub type Result<T> = std::result::Result<T, LayoutError>;
