//! Splitting words into measurable segments.
//!
//! [§ 5.4 Line Breaking](https://www.w3.org/TR/css-text-3/#line-breaking)
//!
//! A word is cut into grapheme clusters, each cluster is classified into a
//! font category, and consecutive clusters that share a face are merged
//! into one [`Segment`]. CJK and emoji clusters always form segments of
//! their own, since a line may break between any two of them.

use lumen_dom::NodeId;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{LayoutError, Result};
use crate::font::{FontCategory, FontRequest, FontWeight};
use crate::style::StyleSnapshot;

/// U+00AD SOFT HYPHEN.
pub const SOFT_HYPHEN: char = '\u{AD}';

/// HTML entity form of the soft hyphen, left undecoded by some parsers.
pub const SOFT_HYPHEN_ENTITY: &str = "&shy;";

/// Visible hyphen appended when a word is broken at a soft hyphen.
pub const VISIBLE_HYPHEN: &str = "-";

/// Small-caps clusters render at this fraction of the surrounding size.
const SMALL_CAPS_SCALE: f32 = 0.8;

/// A run of clusters measured and placed as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Text to render (soft hyphens removed, small caps uppercased).
    pub text: String,
    /// Font category of every cluster in the run.
    pub category: FontCategory,
    /// Face the run is measured and painted with.
    pub font: FontRequest,
    /// Byte offsets into `text` where a soft hyphen was removed. Only
    /// offsets strictly inside `text` are kept.
    pub hyphen_points: Vec<usize>,
}

impl Segment {
    /// Split at a recorded soft hyphen: the head gains a visible hyphen,
    /// the tail keeps the remaining break points.
    #[must_use]
    pub fn split_at_hyphen(&self, point: usize) -> (Self, Self) {
        let mut head_text = self.text[..point].to_string();
        head_text.push_str(VISIBLE_HYPHEN);
        let head = Self {
            text: head_text,
            hyphen_points: Vec::new(),
            ..self.clone()
        };
        let tail = Self {
            text: self.text[point..].to_string(),
            hyphen_points: self
                .hyphen_points
                .iter()
                .filter(|&&p| p > point)
                .map(|&p| p - point)
                .collect(),
            ..self.clone()
        };
        (head, tail)
    }
}

/// The face a cluster is rendered with, after small-caps substitution.
#[allow(clippy::cast_sign_loss)]
fn cluster_face(cluster: &str, style: &StyleSnapshot) -> (String, FontRequest) {
    let base = style.font_request();
    let is_lowercase = cluster.chars().next().is_some_and(char::is_lowercase);
    if style.small_caps && is_lowercase {
        let font = FontRequest {
            weight: FontWeight::Bold,
            size: ((f32::from(base.size) * SMALL_CAPS_SCALE).round() as u16).max(1),
            ..base
        };
        (cluster.to_uppercase(), font)
    } else {
        (cluster.to_string(), base)
    }
}

/// Cut `word` into segments for placement.
///
/// `node` is the text node the word came from, used for error reporting.
///
/// # Errors
/// [`LayoutError::InvalidUtf8`] if a cluster has no code point.
pub fn segment_word(word: &str, style: &StyleSnapshot, node: NodeId) -> Result<Vec<Segment>> {
    let word = word.replace(SOFT_HYPHEN_ENTITY, "\u{AD}");
    let mut segments: Vec<Segment> = Vec::new();

    for (piece_index, piece) in word.split(SOFT_HYPHEN).enumerate() {
        if piece_index > 0
            && let Some(last) = segments.last_mut()
        {
            let point = last.text.len();
            if point > 0 && !last.category.breaks_per_cluster() {
                last.hyphen_points.push(point);
            }
        }

        for cluster in piece.graphemes(true) {
            let category = FontCategory::classify(cluster, style.preformatted)
                .ok_or(LayoutError::InvalidUtf8 { node })?;
            let (text, font) = cluster_face(cluster, style);

            let extend = segments.last().is_some_and(|last| {
                !category.breaks_per_cluster() && last.category == category && last.font == font
            });
            match segments.last_mut() {
                Some(last) if extend => last.text.push_str(&text),
                _ => segments.push(Segment {
                    text,
                    category,
                    font,
                    hyphen_points: Vec::new(),
                }),
            }
        }
    }

    // A soft hyphen at the very end of a segment is not a usable break
    // inside it.
    for segment in &mut segments {
        let len = segment.text.len();
        segment.hyphen_points.retain(|&p| p < len);
    }

    Ok(segments)
}
