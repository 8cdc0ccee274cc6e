//! Font service backed by fontdue.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! One face is loaded per font category and variant from well-known system
//! paths. Text is measured with `Font::metrics()` rather than
//! `Font::rasterize()`, since layout only needs advances; ascent and
//! descent come from the face's horizontal line metrics.

use std::cell::RefCell;
use std::collections::HashMap;

use fontdue::{Font, FontSettings};
use lumen_common::warning::warn_once;
use lumen_layout::font::{FontSlant, FontWeight};
use lumen_layout::{FontCategory, FontRequest, FontService, Glyph, LayoutError};

/// System font paths for regular Latin text.
const LATIN_REGULAR_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// System font paths for bold Latin text.
const LATIN_BOLD_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// System font paths for italic Latin text.
const LATIN_ITALIC_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
    "C:\\Windows\\Fonts\\ariali.ttf",
];

/// System font paths for bold-italic Latin text.
const LATIN_BOLD_ITALIC_PATHS: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    "C:\\Windows\\Fonts\\arialbi.ttf",
];

/// System font paths for monospace text.
const MONOSPACE_PATHS: &[&str] = &[
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// System font paths for bold monospace text.
const MONOSPACE_BOLD_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
    "C:\\Windows\\Fonts\\consolab.ttf",
];

/// System font paths for CJK text.
const CJK_PATHS: &[&str] = &[
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
];

/// System font paths for emoji.
const EMOJI_PATHS: &[&str] = &[
    "/System/Library/Fonts/Apple Color Emoji.ttc",
    "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
    "/usr/share/fonts/noto/NotoColorEmoji.ttf",
    "C:\\Windows\\Fonts\\seguiemj.ttf",
];

/// Identifies one loaded face.
type FaceKey = (FontCategory, FontWeight, FontSlant);

/// [`FontService`] measuring text with fontdue.
///
/// Measured glyphs are cached by `(text, request)`. The cache only grows:
/// a pass never evicts, and the same service can serve many passes.
#[derive(Default)]
pub struct FontdueFontService {
    faces: HashMap<FaceKey, Font>,
    cache: RefCell<HashMap<(String, FontRequest), Glyph>>,
}

impl FontdueFontService {
    /// A service with no faces loaded. Every lookup fails until faces are
    /// added with [`FontdueFontService::add_face`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every face found at the well-known system paths.
    #[must_use]
    pub fn load_system() -> Self {
        let mut service = Self::empty();
        let table: [(FaceKey, &[&str]); 8] = [
            ((FontCategory::Latin, FontWeight::Normal, FontSlant::Roman), LATIN_REGULAR_PATHS),
            ((FontCategory::Latin, FontWeight::Bold, FontSlant::Roman), LATIN_BOLD_PATHS),
            ((FontCategory::Latin, FontWeight::Normal, FontSlant::Italic), LATIN_ITALIC_PATHS),
            ((FontCategory::Latin, FontWeight::Bold, FontSlant::Italic), LATIN_BOLD_ITALIC_PATHS),
            ((FontCategory::Monospace, FontWeight::Normal, FontSlant::Roman), MONOSPACE_PATHS),
            ((FontCategory::Monospace, FontWeight::Bold, FontSlant::Roman), MONOSPACE_BOLD_PATHS),
            ((FontCategory::Cjk, FontWeight::Normal, FontSlant::Roman), CJK_PATHS),
            ((FontCategory::Emoji, FontWeight::Normal, FontSlant::Roman), EMOJI_PATHS),
        ];
        for (key, paths) in table {
            match load_font_from_paths(paths) {
                Some(font) => service.add_face(key.0, key.1, key.2, font),
                None => warn_once(
                    "Fonts",
                    &format!("no {} {} {} face found", key.0, key.1, key.2),
                ),
            }
        }
        service
    }

    /// Register `font` for one category and variant.
    pub fn add_face(&mut self, category: FontCategory, weight: FontWeight, slant: FontSlant, font: Font) {
        let _ = self.faces.insert((category, weight, slant), font);
    }

    /// Number of loaded faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of cached measurements.
    #[must_use]
    pub fn cached_glyphs(&self) -> usize {
        self.cache.borrow().len()
    }

    /// The best loaded face: the exact variant, then the upright one, then
    /// the regular one of the same category.
    fn face(&self, category: FontCategory, weight: FontWeight, slant: FontSlant) -> Option<&Font> {
        self.faces
            .get(&(category, weight, slant))
            .or_else(|| self.faces.get(&(category, weight, FontSlant::Roman)))
            .or_else(|| self.faces.get(&(category, FontWeight::Normal, FontSlant::Roman)))
    }
}

impl FontService for FontdueFontService {
    fn glyph(&self, text: &str, request: FontRequest) -> lumen_layout::Result<Glyph> {
        let key = (text.to_string(), request);
        if let Some(glyph) = self.cache.borrow().get(&key) {
            return Ok(*glyph);
        }

        let category = FontCategory::classify(text, request.monospace)
            .ok_or_else(|| LayoutError::RenderFailed("cannot measure empty text".to_string()))?;
        let no_font = || LayoutError::NoFontForGlyph {
            cluster: text.to_string(),
            category,
        };
        let font = self.face(category, request.weight, request.slant).ok_or_else(no_font)?;

        // A face loaded for the category must still cover the cluster.
        let first = text.chars().next().ok_or_else(no_font)?;
        if !first.is_whitespace() && font.lookup_glyph_index(first) == 0 {
            return Err(no_font());
        }

        let px = request.pixel_size();
        let width = text
            .chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| font.metrics(ch, px).advance_width)
            .sum();
        let line = font.horizontal_line_metrics(px).ok_or_else(|| {
            LayoutError::RenderFailed(format!("face for {category} text has no horizontal metrics"))
        })?;

        let glyph = Glyph {
            width,
            ascent: line.ascent,
            descent: -line.descent,
        };
        let _ = self.cache.borrow_mut().insert(key, glyph);
        Ok(glyph)
    }
}

/// Try to load a font from a list of filesystem paths.
fn load_font_from_paths(paths: &[&str]) -> Option<Font> {
    for path in paths {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = Font::from_bytes(data, FontSettings::default())
        {
            return Some(font);
        }
    }
    None
}
