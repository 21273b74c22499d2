//! Paragraph flow
//!
//! Stacks the lines of each paragraph down the current frame and moves on
//! to the next frame (appending pages when allowed) once a line no longer
//! fits. The same placement code replays layout for the cursor, so replayed
//! positions match the stored pass exactly.

use crate::config::FlowConfig;
use crate::document::{Document, LayoutMarkers, ParagraphId};
use crate::frame::{FrameGeometry, FrameGeometryProvider, PageManager};
use crate::line::{LineBreaker, LineGeometry, LineResult};
use crate::metrics::GlyphMetricsProvider;
use crate::style::{ParagraphStyle, StyleResolver};
use crate::{FlowError, Result};

/// External collaborators shared by the controller and the cursor
#[derive(Clone, Copy)]
pub struct LayoutEnv<'a> {
    pub metrics: &'a dyn GlyphMetricsProvider,
    pub styles: &'a dyn StyleResolver,
    pub config: &'a FlowConfig,
}

impl<'a> LayoutEnv<'a> {
    pub fn new(
        metrics: &'a dyn GlyphMetricsProvider,
        styles: &'a dyn StyleResolver,
        config: &'a FlowConfig,
    ) -> Self {
        Self { metrics, styles, config }
    }

    pub fn breaker(&self) -> LineBreaker<'a> {
        LineBreaker::new(self.metrics, self.styles, self.config)
    }
}

impl std::fmt::Debug for LayoutEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEnv").field("config", self.config).finish_non_exhaustive()
    }
}

/// A point in the flow: frame, page and vertical coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowPosition {
    pub frame: usize,
    pub page: usize,
    pub y: f32,
}

impl FlowPosition {
    /// Top of a frame
    pub fn top_of(frame: usize, geometry: &FrameGeometry) -> Self {
        Self { frame, page: geometry.page, y: geometry.top }
    }
}

/// A line with its vertical placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub line: LineResult,
    pub frame: usize,
    pub page: usize,
    /// Top of the line box
    pub y: f32,
    /// Full line box height including spacing and paragraph offsets
    pub height: f32,
    pub baseline: f32,
}

impl PlacedLine {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Position right below this line in the same frame
    pub fn after(&self) -> FlowPosition {
        FlowPosition { frame: self.frame, page: self.page, y: self.bottom() }
    }

    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.y && y < self.bottom()
    }
}

/// How a paragraph's layout ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphOutcome {
    /// Every character was laid out
    Complete,
    /// Frames ran out and the flow may not grow; text from `at_offset` on
    /// is not laid out
    Overflow { at_offset: usize },
}

/// Result of laying out one paragraph
#[derive(Debug, Clone)]
pub struct ParagraphLayout {
    pub paragraph: ParagraphId,
    pub lines: Vec<PlacedLine>,
    /// Where the next paragraph continues
    pub end: FlowPosition,
    pub outcome: ParagraphOutcome,
}

impl ParagraphLayout {
    pub fn is_overflow(&self) -> bool {
        matches!(self.outcome, ParagraphOutcome::Overflow { .. })
    }

    fn markers(&self) -> Option<LayoutMarkers> {
        let first = self.lines.first()?;
        let last = self.lines.last()?;
        Some(LayoutMarkers {
            start_page: first.page,
            end_page: last.page,
            start_frame: first.frame,
            end_frame: last.frame,
            start_y: first.y,
            end_y: last.bottom(),
            complete: !self.is_overflow(),
        })
    }
}

/// Summary of a top-down pass
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub paragraphs: usize,
    pub lines: usize,
    /// Pages holding laid-out text
    pub pages_used: usize,
    /// Paragraph where the pass stopped for lack of room
    pub overflow: Option<ParagraphId>,
    pub end: Option<FlowPosition>,
}

impl DocumentLayout {
    pub fn is_complete(&self) -> bool {
        self.overflow.is_none()
    }
}

/// Frame access during placement
///
/// Layout passes may grow the frame sequence; replays only read it.
pub(crate) trait FrameSource {
    fn provider(&self) -> &dyn FrameGeometryProvider;

    fn grow(&mut self) -> Option<usize>;
}

/// Frames that never grow
pub(crate) struct FixedFrames<'a>(pub &'a dyn FrameGeometryProvider);

impl FrameSource for FixedFrames<'_> {
    fn provider(&self) -> &dyn FrameGeometryProvider {
        self.0
    }

    fn grow(&mut self) -> Option<usize> {
        None
    }
}

struct GrowingFrames<'a, F>(&'a mut F);

impl<F> FrameSource for GrowingFrames<'_, F>
where
    F: FrameGeometryProvider + PageManager,
{
    fn provider(&self) -> &dyn FrameGeometryProvider {
        &*self.0
    }

    fn grow(&mut self) -> Option<usize> {
        self.0.append_page()
    }
}

/// Line placement for one paragraph
pub(crate) struct LineFlow<'a> {
    document: &'a Document,
    paragraph: ParagraphId,
    style: &'a ParagraphStyle,
    breaker: LineBreaker<'a>,
    env: LayoutEnv<'a>,
    len: usize,
}

impl<'a> LineFlow<'a> {
    pub(crate) fn new(
        env: LayoutEnv<'a>,
        document: &'a Document,
        paragraph: ParagraphId,
    ) -> Result<Self> {
        let len = document.paragraph(paragraph)?.len();
        Ok(Self {
            document,
            paragraph,
            style: document.resolved_style(paragraph),
            breaker: env.breaker(),
            env,
            len,
        })
    }

    pub(crate) fn breaker(&self) -> &LineBreaker<'a> {
        &self.breaker
    }

    /// Advance to the first frame after `frame`, growing the flow if needed
    fn next_frame<S: FrameSource>(&self, frame: usize, frames: &mut S) -> Option<FlowPosition> {
        let next = frame + 1;
        let index = if next < frames.provider().frame_count() {
            next
        } else {
            frames.grow()?
        };
        let geometry = frames.provider().frame(index)?;
        tracing::debug!("Flow moves to frame {} on page {}", index, geometry.page);
        Some(FlowPosition::top_of(index, &geometry))
    }

    /// Where the paragraph's first line may start, given where the previous
    /// paragraph ended
    ///
    /// Applies page-break hints; `None` when the break runs out of frames.
    pub(crate) fn start_position<S: FrameSource>(
        &self,
        from: FlowPosition,
        break_before: bool,
        frames: &mut S,
    ) -> Option<FlowPosition> {
        if !(break_before || self.style.page_break_before) {
            return Some(from);
        }
        match frames.provider().frame(from.frame) {
            Some(frame) if from.y > frame.top => self.next_frame(from.frame, frames),
            _ => Some(from),
        }
    }

    fn band(
        &self,
        frames: &dyn FrameGeometryProvider,
        index: usize,
        frame: &FrameGeometry,
        y: f32,
        height: f32,
        first: bool,
    ) -> LineGeometry {
        let (carve_left, carve_right) = if frame.has_intersections {
            (frames.left_indent_at(index, y, height), frames.right_indent_at(index, y, height))
        } else {
            (0.0, 0.0)
        };
        let first_indent = if first { self.style.first_line_indent } else { 0.0 };
        let left = frame.left + carve_left + self.style.left_indent + first_indent;
        let indents = self.style.left_indent + self.style.right_indent + first_indent;
        let width = frame.width - carve_left - carve_right - indents;
        LineGeometry { left, width }
    }

    fn line_height(&self, line: &LineResult) -> f32 {
        let mut height = line.text_height() + self.style.line_spacing;
        if line.is_first() {
            height += self.style.head_offset;
        }
        if line.is_last {
            height += self.style.foot_offset;
        }
        height
    }

    /// Height guess used to query carve-outs before the line is measured
    fn estimated_height(&self, offset: usize) -> f32 {
        let (ascent, descent) = self.env.metrics.line_metrics(&self.style.base);
        let mut height = ascent + descent + self.style.line_spacing;
        if offset == 0 {
            height += self.style.head_offset;
        }
        height
    }

    /// Place the line starting at `offset` at or after `pos`
    ///
    /// Returns `None` when no frame can take the line.
    pub(crate) fn place_line<S: FrameSource>(
        &self,
        offset: usize,
        pos: FlowPosition,
        frames: &mut S,
    ) -> Result<Option<PlacedLine>> {
        let mut pos = pos;

        loop {
            let Some(frame) = frames.provider().frame(pos.frame) else {
                return Ok(None);
            };
            if pos.y < frame.top {
                pos.y = frame.top;
            }
            pos.page = frame.page;

            let at_top = pos.y <= frame.top;
            let estimate = self.estimated_height(offset);
            let first = offset == 0;
            let mut geometry =
                self.band(frames.provider(), pos.frame, &frame, pos.y, estimate, first);

            if geometry.width <= 0.0 || frame.height <= 0.0 {
                tracing::debug!("Frame {} has no usable area at y={}", pos.frame, pos.y);
                match self.next_frame(pos.frame, frames) {
                    Some(next) => {
                        pos = next;
                        continue;
                    }
                    None => return Ok(None),
                }
            }

            let mut line =
                self.breaker.compute_line(self.document, self.paragraph, offset, &geometry)?;
            let mut height = self.line_height(&line);

            if frame.has_intersections && height > estimate {
                let taller =
                    self.band(frames.provider(), pos.frame, &frame, pos.y, height, first);
                if taller != geometry && taller.width > 0.0 {
                    geometry = taller;
                    line = self.breaker.compute_line(
                        self.document,
                        self.paragraph,
                        offset,
                        &geometry,
                    )?;
                    height = self.line_height(&line);
                }
            }

            if pos.y + height > frame.bottom() && !at_top {
                match self.next_frame(pos.frame, frames) {
                    Some(next) => {
                        pos = next;
                        continue;
                    }
                    None => return Ok(None),
                }
            }

            let head = if line.is_first() { self.style.head_offset } else { 0.0 };
            let baseline = pos.y + head + line.effective_ascent();
            return Ok(Some(PlacedLine {
                line,
                frame: pos.frame,
                page: pos.page,
                y: pos.y,
                height,
                baseline,
            }));
        }
    }

    /// Lay out the whole paragraph from `start` (page breaks already applied)
    pub(crate) fn flow<S: FrameSource>(
        &self,
        start: FlowPosition,
        frames: &mut S,
    ) -> Result<ParagraphLayout> {
        let mut lines: Vec<PlacedLine> = Vec::new();
        let mut pos = start;
        let mut offset = 0;

        loop {
            let Some(placed) = self.place_line(offset, pos, frames)? else {
                tracing::debug!("Paragraph {:?} overflows at offset {}", self.paragraph, offset);
                return Ok(ParagraphLayout {
                    paragraph: self.paragraph,
                    lines,
                    end: pos,
                    outcome: ParagraphOutcome::Overflow { at_offset: offset },
                });
            };

            offset = placed.line.end;
            pos = placed.after();
            let done = placed.line.is_last || offset >= self.len;
            lines.push(placed);
            if done {
                break;
            }
        }

        Ok(ParagraphLayout {
            paragraph: self.paragraph,
            lines,
            end: pos,
            outcome: ParagraphOutcome::Complete,
        })
    }
}

/// Whether the paragraph before `id` asks for a break after itself
pub(crate) fn break_after_previous(document: &Document, id: ParagraphId) -> bool {
    document
        .prev(id)
        .map(|prev| document.resolved_style(prev).page_break_after)
        .unwrap_or(false)
}

/// Start of the flow: top of the first frame
pub(crate) fn flow_origin(frames: &dyn FrameGeometryProvider) -> Option<FlowPosition> {
    frames.frame(0).map(|geometry| FlowPosition::top_of(0, &geometry))
}

/// Lays out paragraphs and records where they landed
#[derive(Debug, Clone, Copy)]
pub struct ParagraphFlowController<'a> {
    env: LayoutEnv<'a>,
}

impl<'a> ParagraphFlowController<'a> {
    pub fn new(env: LayoutEnv<'a>) -> Self {
        Self { env }
    }

    /// Lay out one paragraph starting at `start`
    ///
    /// `start` is where the previous paragraph ended; page-break hints are
    /// applied before the first line. The paragraph's layout markers are
    /// updated (cleared when not a single line fit).
    pub fn layout_paragraph<F>(
        &self,
        document: &mut Document,
        id: ParagraphId,
        start: FlowPosition,
        frames: &mut F,
    ) -> Result<ParagraphLayout>
    where
        F: FrameGeometryProvider + PageManager,
    {
        let layout = {
            let doc: &Document = document;
            if let Err(err @ FlowError::MalformedDocument { .. }) = doc.paragraph_style(id) {
                tracing::warn!("{}; using default style", err);
            }
            let flow = LineFlow::new(self.env, doc, id)?;
            let mut source = GrowingFrames(frames);
            match flow.start_position(start, break_after_previous(doc, id), &mut source) {
                Some(first) => flow.flow(first, &mut source)?,
                None => ParagraphLayout {
                    paragraph: id,
                    lines: Vec::new(),
                    end: start,
                    outcome: ParagraphOutcome::Overflow { at_offset: 0 },
                },
            }
        };
        document.set_markers(id, layout.markers());
        Ok(layout)
    }

    /// Top-down pass over the whole document
    ///
    /// After a complete pass, pages appended past the one holding the end
    /// of the text are released.
    pub fn layout_document<F>(
        &self,
        document: &mut Document,
        frames: &mut F,
    ) -> Result<DocumentLayout>
    where
        F: FrameGeometryProvider + PageManager,
    {
        let first = document.first();
        let start = flow_origin(&*frames);
        let report = self.layout_range(document, first, start, frames)?;
        tracing::info!(
            "Layout complete: {} paragraphs, {} lines, {} pages",
            report.paragraphs,
            report.lines,
            report.pages_used
        );
        Ok(report)
    }

    /// Re-lay out from `id` onward, resuming where its predecessor ended
    ///
    /// Falls back to a full pass when the predecessor has no markers.
    pub fn relayout_from<F>(
        &self,
        document: &mut Document,
        id: ParagraphId,
        frames: &mut F,
    ) -> Result<DocumentLayout>
    where
        F: FrameGeometryProvider + PageManager,
    {
        document.paragraph(id)?;
        let start = match document.prev(id) {
            None => flow_origin(&*frames),
            Some(prev) => match document.markers(prev) {
                Some(m) if m.complete => Some(FlowPosition {
                    frame: m.end_frame,
                    page: m.end_page,
                    y: m.end_y,
                }),
                _ => return self.layout_document(document, frames),
            },
        };
        tracing::debug!("Relayout from {:?}", id);
        self.layout_range(document, Some(id), start, frames)
    }

    fn layout_range<F>(
        &self,
        document: &mut Document,
        from: Option<ParagraphId>,
        start: Option<FlowPosition>,
        frames: &mut F,
    ) -> Result<DocumentLayout>
    where
        F: FrameGeometryProvider + PageManager,
    {
        let mut report = DocumentLayout {
            paragraphs: 0,
            lines: 0,
            pages_used: 0,
            overflow: None,
            end: start,
        };

        let Some(mut pos) = start else {
            // No frames at all: nothing can be placed
            if let Some(id) = from {
                document.invalidate_from(id);
            }
            report.overflow = from;
            return Ok(report);
        };

        let mut cursor = from;
        while let Some(id) = cursor {
            let layout = self.layout_paragraph(document, id, pos, frames)?;
            report.lines += layout.lines.len();
            if let Some(last) = layout.lines.last() {
                report.pages_used = report.pages_used.max(last.page + 1);
            }
            pos = layout.end;
            report.end = Some(pos);

            if layout.is_overflow() {
                report.overflow = Some(id);
                if !layout.lines.is_empty() {
                    report.paragraphs += 1;
                }
                if let Some(next) = document.next(id) {
                    document.invalidate_from(next);
                }
                break;
            }
            report.paragraphs += 1;
            cursor = document.next(id);
        }

        // Text now ends earlier than a previous pass may have grown the flow
        if report.overflow.is_none() {
            frames.release_pages(pos.page + 1);
        }

        Ok(report)
    }
}
