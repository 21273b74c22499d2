//! Glyph metrics
//!
//! The layout never talks to a font system directly. It asks a
//! [`GlyphMetricsProvider`] for the advance and vertical extent of each
//! character under a resolved [`TextStyle`].

use crate::style::TextStyle;

/// Horizontal advance and vertical extent of one glyph
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphMetrics {
    pub advance: f32,
    /// Distance above the baseline (positive)
    pub ascent: f32,
    /// Distance below the baseline (positive)
    pub descent: f32,
}

/// Source of text metrics
pub trait GlyphMetricsProvider {
    fn measure(&self, ch: char, style: &TextStyle) -> GlyphMetrics;

    /// Ascent and descent of the style's font, used for empty lines
    fn line_metrics(&self, style: &TextStyle) -> (f32, f32) {
        let m = self.measure(' ', style);
        (m.ascent, m.descent)
    }

    /// Total advance of a string
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        text.chars().map(|c| self.measure(c, style).advance).sum()
    }
}

/// Deterministic metrics proportional to font size
///
/// Every glyph advances by `size * advance_ratio`, except spaces and tabs
/// which use `space_ratio` and other control characters which take no
/// room. Bold text is widened by `bold_extra`. Useful for tests and
/// character-cell targets.
#[derive(Debug, Clone, Copy)]
pub struct FixedMetrics {
    pub advance_ratio: f32,
    pub space_ratio: f32,
    pub ascent_ratio: f32,
    pub descent_ratio: f32,
    pub bold_extra: f32,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            advance_ratio: 0.5,
            space_ratio: 0.5,
            ascent_ratio: 0.8,
            descent_ratio: 0.2,
            bold_extra: 0.0,
        }
    }
}

impl FixedMetrics {
    /// Every glyph, space included, is exactly `advance` wide at size 1.0
    pub fn uniform(advance_ratio: f32) -> Self {
        Self {
            advance_ratio,
            space_ratio: advance_ratio,
            ..Default::default()
        }
    }
}

impl GlyphMetricsProvider for FixedMetrics {
    fn measure(&self, ch: char, style: &TextStyle) -> GlyphMetrics {
        let size = style.effective_size();
        let mut advance = match ch {
            ' ' | '\t' => size * self.space_ratio,
            c if c.is_control() => 0.0,
            _ => size * self.advance_ratio,
        };
        if style.is_bold() && advance > 0.0 {
            advance += self.bold_extra;
        }
        GlyphMetrics {
            advance,
            ascent: size * self.ascent_ratio,
            descent: size * self.descent_ratio,
        }
    }
}

/// Metrics read from a TrueType/OpenType face
#[cfg(feature = "font-metrics")]
pub struct FontFaceMetrics<'a> {
    face: ttf_parser::Face<'a>,
}

#[cfg(feature = "font-metrics")]
impl<'a> FontFaceMetrics<'a> {
    /// Parse face `index` of a font file
    pub fn parse(data: &'a [u8], index: u32) -> crate::Result<Self> {
        let face = ttf_parser::Face::parse(data, index)
            .map_err(|e| crate::FlowError::FontParsing(e.to_string()))?;
        Ok(Self { face })
    }

    fn scale(&self, style: &TextStyle) -> f32 {
        style.effective_size() / f32::from(self.face.units_per_em())
    }
}

#[cfg(feature = "font-metrics")]
impl GlyphMetricsProvider for FontFaceMetrics<'_> {
    fn measure(&self, ch: char, style: &TextStyle) -> GlyphMetrics {
        let scale = self.scale(style);
        let advance = self
            .face
            .glyph_index(ch)
            .and_then(|id| self.face.glyph_hor_advance(id))
            .map(|a| f32::from(a) * scale)
            .unwrap_or(0.0);
        GlyphMetrics {
            advance,
            ascent: f32::from(self.face.ascender()) * scale,
            descent: -f32::from(self.face.descender()) * scale,
        }
    }
}

#[cfg(feature = "font-metrics")]
impl std::fmt::Debug for FontFaceMetrics<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFaceMetrics")
            .field("units_per_em", &self.face.units_per_em())
            .finish()
    }
}
