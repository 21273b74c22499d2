//! Line breaking
//!
//! Greedy breaking at spaces: characters are measured one at a time, the
//! last break opportunity is remembered, and the line is cut there once the
//! next word no longer fits. A word wider than the whole band is kept
//! on one overflowing line.

use crate::config::FlowConfig;
use crate::document::{CharContent, Document, ParagraphId};
use crate::metrics::GlyphMetricsProvider;
use crate::style::{Alignment, StyleResolver, TextStyle};
use crate::Result;

/// Horizontal band a line may occupy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    /// Left edge after indents and carve-outs
    pub left: f32,
    /// Usable width after indents and carve-outs
    pub width: f32,
}

/// Extent and metrics of one line
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    pub start: usize,
    /// Exclusive; the next line starts here
    pub end: usize,
    /// Text width, trailing break space excluded
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Tallest embedded object on the line
    pub special_height: f32,
    /// Spaces between words (the trailing break space is not counted)
    pub space_count: usize,
    /// Where the first glyph is drawn
    pub left: f32,
    /// Where the counter is drawn (first line only)
    pub counter_left: f32,
    /// Width reserved for the counter, zero past the first line
    pub counter_width: f32,
    /// Width available to text after the counter reservation
    pub available: f32,
    /// Total justification stretch spread over `space_count` spaces
    pub extra_space: f32,
    /// Line was cut after a space or tab; false for a hard break
    pub trailing_space: bool,
    pub is_last: bool,
    /// Style in effect at `start`
    pub start_style: TextStyle,
}

impl LineResult {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_first(&self) -> bool {
        self.start == 0
    }

    /// Text height before spacing and paragraph offsets
    pub fn text_height(&self) -> f32 {
        (self.ascent + self.descent).max(self.special_height)
    }

    /// Ascent including embedded objects sitting on the baseline
    pub fn effective_ascent(&self) -> f32 {
        self.ascent.max(self.special_height - self.descent)
    }

    /// Cumulative justification stretch of the first `spaces` interior spaces
    ///
    /// Rounding error is carried forward, so each space gets
    /// `floor(extra / count)` or one more and the total never drifts by a
    /// full pixel.
    pub fn stretch_before(&self, spaces: usize) -> f32 {
        if self.space_count == 0 || self.extra_space <= 0.0 {
            return 0.0;
        }
        let spaces = spaces.min(self.space_count) as f32;
        (self.extra_space * spaces / self.space_count as f32).floor()
    }

    /// Stretch added to the `index`-th interior space (0-based)
    pub fn space_stretch(&self, index: usize) -> f32 {
        if index >= self.space_count {
            return 0.0;
        }
        self.stretch_before(index + 1) - self.stretch_before(index)
    }

    /// Last caret offset on this line
    ///
    /// The break space of a wrapped line is not visible at its end, so the
    /// caret stops before it; the paragraph's last line ends at its length.
    pub fn last_caret(&self) -> usize {
        if self.is_last || self.end == self.start {
            self.end
        } else {
            self.end - 1
        }
    }
}

/// Caret location within a line
#[derive(Debug, Clone, PartialEq)]
pub struct CaretMetrics {
    pub x: f32,
    /// Style of the character right after the caret
    pub style: TextStyle,
}

/// Measurement state as of a break opportunity
#[derive(Debug, Clone, Copy)]
struct Break {
    end: usize,
    width: f32,
    ascent: f32,
    descent: f32,
    special_height: f32,
    spaces: usize,
    measured: bool,
}

/// Computes one line at a time
pub struct LineBreaker<'a> {
    metrics: &'a dyn GlyphMetricsProvider,
    styles: &'a dyn StyleResolver,
    config: &'a FlowConfig,
}

impl<'a> LineBreaker<'a> {
    pub fn new(
        metrics: &'a dyn GlyphMetricsProvider,
        styles: &'a dyn StyleResolver,
        config: &'a FlowConfig,
    ) -> Self {
        Self { metrics, styles, config }
    }

    /// Width reserved for a paragraph's counter
    ///
    /// The larger of the rendered label and the counter's placeholder.
    pub fn counter_width(&self, document: &Document, id: ParagraphId) -> f32 {
        let style = document.resolved_style(id);
        let Some(counter) = &style.counter else {
            return 0.0;
        };
        let Some(label) = document.counter_label(id) else {
            return 0.0;
        };
        let rendered = self.metrics.text_width(&label, &style.base);
        let placeholder = if counter.placeholder_width > 0.0 {
            counter.placeholder_width
        } else {
            self.config.default_counter_width
        };
        rendered.max(placeholder)
    }

    /// Compute the line starting at `start`
    pub fn compute_line(
        &self,
        document: &Document,
        id: ParagraphId,
        start: usize,
        geometry: &LineGeometry,
    ) -> Result<LineResult> {
        let paragraph = document.paragraph(id)?;
        let pstyle = document.resolved_style(id);
        let chars = paragraph.chars();
        let len = chars.len();
        let start = start.min(len);

        let counter_width = if start == 0 { self.counter_width(document, id) } else { 0.0 };
        let available = (geometry.width - counter_width).max(0.0);

        let mut style = self.styles.effective_style(&pstyle.base, paragraph, start);
        let start_style = style.clone();

        let mut state = Break {
            end: start,
            width: 0.0,
            ascent: 0.0,
            descent: 0.0,
            special_height: 0.0,
            spaces: 0,
            measured: false,
        };
        let mut last_break: Option<Break> = None;
        let mut broke = None;

        for (pos, ch) in chars.iter().enumerate().skip(start) {
            if pos > start {
                if let Some(format) = &ch.format {
                    style = self.styles.apply(&style, format);
                }
            }

            let (advance, ascent, descent, special) = match &ch.content {
                CharContent::Glyph(c) => {
                    let m = self.metrics.measure(*c, &style);
                    (m.advance, m.ascent, m.descent, 0.0)
                }
                CharContent::Special(object) => (object.width, 0.0, 0.0, object.height),
            };

            // Break opportunity ending right before this character
            let trailing = last_break.filter(|b| b.end == pos);

            if ch.is_break_opportunity() {
                // Breaking after this run of spaces leaves the whole run out
                // of the visible width and the space count
                let before = trailing.unwrap_or(state);
                last_break = Some(Break {
                    end: pos + 1,
                    ascent: state.ascent.max(ascent),
                    descent: state.descent.max(descent),
                    measured: true,
                    ..before
                });
                if ch.is_space() {
                    state.spaces += 1;
                }
            } else if state.width + advance > available {
                if let Some(b) = last_break {
                    broke = Some((b, true));
                    break;
                }
            }

            state.width += advance;
            state.end = pos + 1;
            if matches!(ch.content, CharContent::Glyph(_)) {
                state.ascent = state.ascent.max(ascent);
                state.descent = state.descent.max(descent);
                state.measured = true;
            } else {
                state.special_height = state.special_height.max(special);
            }

            if ch.is_hard_break() && pos + 1 < len {
                let extent = match trailing {
                    Some(b) => Break {
                        end: pos + 1,
                        ascent: state.ascent,
                        descent: state.descent,
                        ..b
                    },
                    None => state,
                };
                broke = Some((extent, false));
                break;
            }
        }

        let (mut extent, trailing_space, is_last) = match broke {
            Some((b, trailing_space)) => (b, trailing_space, false),
            None => (state, false, true),
        };

        if !extent.measured {
            let (ascent, descent) = self.metrics.line_metrics(&start_style);
            extent.ascent = ascent;
            extent.descent = descent;
        }

        let slack = (available - extent.width).max(0.0);
        let (align_offset, extra_space) = match pstyle.alignment {
            Alignment::Left => (0.0, 0.0),
            Alignment::Center => (slack / 2.0, 0.0),
            Alignment::Right => (slack, 0.0),
            Alignment::Justify if trailing_space && extent.spaces > 0 => (0.0, slack),
            Alignment::Justify => (0.0, 0.0),
        };

        let line = LineResult {
            start,
            end: extent.end,
            width: extent.width,
            ascent: extent.ascent,
            descent: extent.descent,
            special_height: extent.special_height,
            space_count: extent.spaces,
            left: geometry.left + counter_width + align_offset,
            counter_left: geometry.left,
            counter_width,
            available,
            extra_space,
            trailing_space,
            is_last,
            start_style,
        };

        tracing::trace!(
            "Line {}..{} width={} avail={} spaces={}",
            line.start,
            line.end,
            line.width,
            line.available,
            line.space_count
        );

        Ok(line)
    }

    /// Pixel position of the caret before `offset` on `line`
    pub fn caret(
        &self,
        document: &Document,
        id: ParagraphId,
        line: &LineResult,
        offset: usize,
    ) -> Result<CaretMetrics> {
        let paragraph = document.paragraph(id)?;
        let pstyle = document.resolved_style(id);
        let chars = paragraph.chars();
        let offset = offset.clamp(line.start, line.end);

        let mut style = self.styles.effective_style(&pstyle.base, paragraph, line.start);
        let mut x = line.left;
        let mut spaces = 0;

        for pos in line.start..offset {
            let ch = &chars[pos];
            if pos > line.start {
                if let Some(format) = &ch.format {
                    style = self.styles.apply(&style, format);
                }
            }
            x += match &ch.content {
                CharContent::Glyph(c) => self.metrics.measure(*c, &style).advance,
                CharContent::Special(object) => object.width,
            };
            if ch.is_space() {
                x += line.space_stretch(spaces);
                spaces += 1;
            }
        }

        // Style of the character after the caret
        if offset > line.start && offset < chars.len() {
            if let Some(format) = &chars[offset].format {
                style = self.styles.apply(&style, format);
            }
        }

        Ok(CaretMetrics { x, style })
    }

    /// Caret x for every offset from `line.start` through `line.last_caret()`
    pub fn caret_positions(
        &self,
        document: &Document,
        id: ParagraphId,
        line: &LineResult,
    ) -> Result<Vec<f32>> {
        let paragraph = document.paragraph(id)?;
        let pstyle = document.resolved_style(id);
        let chars = paragraph.chars();

        let mut style = self.styles.effective_style(&pstyle.base, paragraph, line.start);
        let mut x = line.left;
        let mut spaces = 0;
        let mut positions = Vec::with_capacity(line.len() + 1);
        positions.push(x);

        for pos in line.start..line.last_caret() {
            let ch = &chars[pos];
            if pos > line.start {
                if let Some(format) = &ch.format {
                    style = self.styles.apply(&style, format);
                }
            }
            x += match &ch.content {
                CharContent::Glyph(c) => self.metrics.measure(*c, &style).advance,
                CharContent::Special(object) => object.width,
            };
            if ch.is_space() {
                x += line.space_stretch(spaces);
                spaces += 1;
            }
            positions.push(x);
        }

        Ok(positions)
    }
}
