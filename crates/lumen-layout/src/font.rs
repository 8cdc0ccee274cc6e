//! Font service boundary.
//!
//! Layout never rasterizes or selects font files itself. It asks a
//! [`FontService`] for the metrics of a piece of text in a given weight,
//! slant, size and monospace flag, and positions the result.

use serde::Serialize;
use strum_macros::Display;

use crate::error::{LayoutError, Result};

/// Font weight requested from the font service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

/// Font slant requested from the font service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FontSlant {
    /// Upright glyphs.
    #[default]
    Roman,
    /// Italic glyphs.
    Italic,
}

/// Everything the font service needs besides the text itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FontRequest {
    /// Weight.
    pub weight: FontWeight,
    /// Slant.
    pub slant: FontSlant,
    /// Size in points.
    pub size: u16,
    /// Force a monospace face for Latin text.
    pub monospace: bool,
}

impl FontRequest {
    /// Size converted from points to pixels (`pt / 0.75`).
    #[must_use]
    pub fn pixel_size(&self) -> f32 {
        f32::from(self.size) / 0.75
    }
}

/// Measured metrics of a piece of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Glyph {
    /// Advance width.
    pub width: f32,
    /// Distance from the top of the glyph box to the baseline.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the glyph box.
    pub descent: f32,
}

impl Glyph {
    /// Total height of the glyph box.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Which family of fonts must cover a grapheme cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FontCategory {
    /// Latin, Greek, Cyrillic and everything not listed below.
    Latin,
    /// Chinese, Japanese and Korean scripts, including full-width forms.
    Cjk,
    /// Pictographic emoji.
    Emoji,
    /// Latin text inside preformatted content.
    Monospace,
}

/// Code-point ranges rendered with a CJK font.
const CJK_RANGES: &[(u32, u32)] = &[
    (0x1100, 0x11FF),   // Hangul Jamo
    (0x2E80, 0x2FDF),   // CJK radicals, Kangxi radicals
    (0x3000, 0x30FF),   // CJK symbols, Hiragana, Katakana
    (0x3100, 0x31FF),   // Bopomofo, Hangul compatibility Jamo
    (0x3400, 0x4DBF),   // CJK extension A
    (0x4E00, 0x9FFF),   // CJK unified ideographs
    (0xAC00, 0xD7AF),   // Hangul syllables
    (0xF900, 0xFAFF),   // CJK compatibility ideographs
    (0xFF00, 0xFFEF),   // Half-width and full-width forms
    (0x20000, 0x2FA1F), // CJK extensions B-F, supplement
];

/// Code-point ranges rendered with an emoji font.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x2600, 0x27BF),   // Misc symbols, dingbats
    (0x2B50, 0x2B55),   // Stars and circles
    (0x1F000, 0x1F2FF), // Mahjong, dominoes, cards, enclosed supplements
    (0x1F300, 0x1F5FF), // Misc symbols and pictographs
    (0x1F600, 0x1F64F), // Emoticons
    (0x1F680, 0x1F6FF), // Transport and map
    (0x1F900, 0x1FAFF), // Supplemental symbols and pictographs
];

fn in_ranges(cp: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

impl FontCategory {
    /// Classify a grapheme cluster by its first code point.
    ///
    /// Returns `None` for an empty cluster. Preformatted content maps
    /// Latin clusters to [`FontCategory::Monospace`] but keeps the
    /// specialized CJK and emoji categories.
    #[must_use]
    pub fn classify(cluster: &str, preformatted: bool) -> Option<Self> {
        let cp = u32::from(cluster.chars().next()?);
        let category = if in_ranges(cp, EMOJI_RANGES) {
            Self::Emoji
        } else if in_ranges(cp, CJK_RANGES) {
            Self::Cjk
        } else if preformatted {
            Self::Monospace
        } else {
            Self::Latin
        };
        Some(category)
    }

    /// Whether clusters of this category may break from their neighbours
    /// anywhere, not only at spaces.
    #[must_use]
    pub fn breaks_per_cluster(self) -> bool {
        matches!(self, Self::Cjk | Self::Emoji)
    }
}

/// Measures text for layout.
///
/// Implementors own any glyph cache; layout treats it as append-only and
/// never evicts. Calls are synchronous and fallible: an error aborts the
/// layout pass.
pub trait FontService {
    /// Measure `text` (one or more grapheme clusters of a single font
    /// category) in the requested face.
    ///
    /// # Errors
    /// [`LayoutError::NoFontForGlyph`] when no loaded font covers the text,
    /// [`LayoutError::RenderFailed`] when the font cannot produce metrics.
    fn glyph(&self, text: &str, request: FontRequest) -> Result<Glyph>;
}

/// Approximate font metrics using fixed ratios.
///
/// Without access to actual font data, Latin advances are approximated as
/// 0.6× the pixel size per character, CJK and emoji clusters as a full
/// em, ascent as 0.8× and descent as 0.2× the pixel size. Bold text is 10%
/// wider.
///
/// This is used as a fallback when no font is available, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontService;

impl FontService for ApproximateFontService {
    fn glyph(&self, text: &str, request: FontRequest) -> Result<Glyph> {
        const CHAR_WIDTH_RATIO: f32 = 0.6;
        const ASCENT_RATIO: f32 = 0.8;
        const DESCENT_RATIO: f32 = 0.2;

        let px = request.pixel_size();
        let bold_factor = if request.weight == FontWeight::Bold { 1.1 } else { 1.0 };
        let mut width = 0.0;
        for ch in text.chars() {
            let cluster = ch.to_string();
            let Some(category) = FontCategory::classify(&cluster, request.monospace) else {
                return Err(LayoutError::RenderFailed(format!("cannot measure {text:?}")));
            };
            width += match category {
                FontCategory::Cjk | FontCategory::Emoji => px,
                FontCategory::Latin | FontCategory::Monospace => px * CHAR_WIDTH_RATIO,
            };
        }

        Ok(Glyph {
            width: width * bold_factor,
            ascent: px * ASCENT_RATIO,
            descent: px * DESCENT_RATIO,
        })
    }
}
