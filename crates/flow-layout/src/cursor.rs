//! Caret navigation
//!
//! [`FlowCursor`] holds a position in flowed text: the paragraph, the line
//! around the caret and the caret's offset and pixel coordinates. Only the
//! current line is kept; neighbouring lines are recomputed on demand by
//! replaying the paragraph's layout.
//!
//! The cursor borrows the document, so the document cannot change under
//! it. After an edit, build a new cursor.

use crate::document::{Document, ParagraphId};
use crate::flow::{
    FixedFrames, FlowPosition, LayoutEnv, LineFlow, PlacedLine, break_after_previous, flow_origin,
};
use crate::frame::FrameGeometryProvider;
use crate::style::TextStyle;
use crate::{FlowError, Result};

/// Snapshot of the caret for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretInfo {
    pub paragraph: ParagraphId,
    pub offset: usize,
    pub x: f32,
    /// Top of the caret's line box
    pub y: f32,
    pub height: f32,
    pub baseline: f32,
    pub frame: usize,
    pub page: usize,
}

/// Navigable position in laid-out text
pub struct FlowCursor<'a> {
    document: &'a Document,
    env: LayoutEnv<'a>,
    frames: &'a dyn FrameGeometryProvider,
    paragraph: ParagraphId,
    /// Where the paragraph's first line is placed from
    paragraph_start: FlowPosition,
    line: PlacedLine,
    text_pos: usize,
    x: f32,
    style: TextStyle,
    /// Column remembered across consecutive vertical moves
    target_x: Option<f32>,
    vertical: bool,
}

impl std::fmt::Debug for FlowCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCursor")
            .field("paragraph", &self.paragraph)
            .field("text_pos", &self.text_pos)
            .field("line", &(self.line.line.start..self.line.line.end))
            .field("x", &self.x)
            .field("y", &self.line.y)
            .field("target_x", &self.target_x)
            .finish_non_exhaustive()
    }
}

impl<'a> FlowCursor<'a> {
    /// Cursor at the start of `paragraph`
    ///
    /// With `from_start` the flow is replayed from the top of the document;
    /// otherwise the paragraph's stored layout markers are used.
    pub fn new(
        document: &'a Document,
        env: LayoutEnv<'a>,
        frames: &'a dyn FrameGeometryProvider,
        paragraph: ParagraphId,
        from_start: bool,
    ) -> Result<Self> {
        let start = paragraph_start(document, env, frames, paragraph, from_start)?;
        let flow = LineFlow::new(env, document, paragraph)?;
        let line = flow
            .place_line(0, start, &mut FixedFrames(frames))?
            .ok_or(FlowError::PositionNotLaidOut { paragraph })?;
        let caret = flow.breaker().caret(document, paragraph, &line.line, 0)?;

        Ok(Self {
            document,
            env,
            frames,
            paragraph,
            paragraph_start: start,
            line,
            text_pos: 0,
            x: caret.x,
            style: caret.style,
            target_x: None,
            vertical: false,
        })
    }

    /// Rebind to the start of `paragraph`
    pub fn init(&mut self, paragraph: ParagraphId, from_start: bool) -> Result<()> {
        *self = Self::new(self.document, self.env, self.frames, paragraph, from_start)?;
        Ok(())
    }

    pub fn paragraph(&self) -> ParagraphId {
        self.paragraph
    }

    pub fn text_pos(&self) -> usize {
        self.text_pos
    }

    pub fn line_start(&self) -> usize {
        self.line.line.start
    }

    pub fn line_end(&self) -> usize {
        self.line.line.end
    }

    pub fn line(&self) -> &PlacedLine {
        &self.line
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    /// Top of the current line box
    pub fn y(&self) -> f32 {
        self.line.y
    }

    pub fn baseline(&self) -> f32 {
        self.line.baseline
    }

    pub fn line_height(&self) -> f32 {
        self.line.height
    }

    pub fn frame(&self) -> usize {
        self.line.frame
    }

    pub fn page(&self) -> usize {
        self.line.page
    }

    /// Style of the character after the caret
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Caret sits at the last stop of its line
    pub fn is_line_end(&self) -> bool {
        self.text_pos == self.line.line.last_caret()
    }

    pub fn caret(&self) -> CaretInfo {
        CaretInfo {
            paragraph: self.paragraph,
            offset: self.text_pos,
            x: self.x,
            y: self.line.y,
            height: self.line.height,
            baseline: self.line.baseline,
            frame: self.line.frame,
            page: self.line.page,
        }
    }

    fn flow_for(&self, id: ParagraphId) -> Result<LineFlow<'a>> {
        LineFlow::new(self.env, self.document, id)
    }

    /// All laid-out lines of `id`, first line placed from `start`
    fn lines_of(&self, id: ParagraphId, start: FlowPosition) -> Result<Vec<PlacedLine>> {
        let layout = self.flow_for(id)?.flow(start, &mut FixedFrames(self.frames))?;
        if layout.lines.is_empty() {
            return Err(FlowError::PositionNotLaidOut { paragraph: id });
        }
        Ok(layout.lines)
    }

    /// Start position of another paragraph, from markers or a replay
    fn start_of(&self, id: ParagraphId) -> Result<FlowPosition> {
        match self.document.markers(id) {
            Some(_) => paragraph_start(self.document, self.env, self.frames, id, false),
            None => paragraph_start(self.document, self.env, self.frames, id, true),
        }
    }

    /// Start position of a paragraph that must have been laid out
    fn laid_out_start(&self, id: ParagraphId) -> Result<FlowPosition> {
        paragraph_start(self.document, self.env, self.frames, id, false)
    }

    fn set_pos(&mut self, offset: usize) -> Result<()> {
        let flow = self.flow_for(self.paragraph)?;
        let caret = flow.breaker().caret(self.document, self.paragraph, &self.line.line, offset)?;
        self.text_pos = offset;
        self.x = caret.x;
        self.style = caret.style;
        Ok(())
    }

    fn enter(
        &mut self,
        id: ParagraphId,
        start: FlowPosition,
        line: PlacedLine,
        offset: usize,
    ) -> Result<()> {
        self.paragraph = id;
        self.paragraph_start = start;
        self.line = line;
        self.set_pos(offset)
    }

    fn reset_vertical(&mut self) {
        self.vertical = false;
        self.target_x = None;
    }

    /// Line after the current one in the same paragraph
    fn next_line(&self) -> Result<Option<PlacedLine>> {
        if self.line.line.is_last {
            return Ok(None);
        }
        let flow = self.flow_for(self.paragraph)?;
        flow.place_line(self.line.line.end, self.line.after(), &mut FixedFrames(self.frames))
    }

    /// Line before the current one, found by replaying from paragraph start
    fn previous_line(&self) -> Result<Option<PlacedLine>> {
        let start = self.line.line.start;
        if start == 0 {
            return Ok(None);
        }
        let lines = self.lines_of(self.paragraph, self.paragraph_start)?;
        Ok(lines.into_iter().find(|l| l.line.end == start))
    }

    /// First-line start of the following paragraph, replaying when unmarked
    fn next_paragraph_start(&self, next: ParagraphId) -> Result<FlowPosition> {
        if self.document.markers(next).is_some() {
            return self.laid_out_start(next);
        }
        let lines = self.lines_of(self.paragraph, self.paragraph_start)?;
        let after = lines
            .last()
            .map(PlacedLine::after)
            .ok_or(FlowError::PositionNotLaidOut { paragraph: next })?;
        let flow = self.flow_for(next)?;
        let break_before = break_after_previous(self.document, next);
        flow.start_position(after, break_before, &mut FixedFrames(self.frames))
            .ok_or(FlowError::PositionNotLaidOut { paragraph: next })
    }

    fn first_line_of(&self, id: ParagraphId, start: FlowPosition) -> Result<PlacedLine> {
        self.flow_for(id)?
            .place_line(0, start, &mut FixedFrames(self.frames))?
            .ok_or(FlowError::PositionNotLaidOut { paragraph: id })
    }

    fn last_line_of(&self, id: ParagraphId, start: FlowPosition) -> Result<PlacedLine> {
        self.lines_of(id, start)?
            .pop()
            .ok_or(FlowError::PositionNotLaidOut { paragraph: id })
    }

    /// Move the caret within the current line
    pub fn goto_pos(&mut self, offset: usize) -> Result<bool> {
        let line = &self.line.line;
        if offset < line.start || offset > line.last_caret() {
            return Err(FlowError::OffsetOutOfRange { offset, len: line.last_caret() });
        }
        self.reset_vertical();
        let moved = offset != self.text_pos;
        self.set_pos(offset)?;
        Ok(moved)
    }

    /// One position right; crosses lines and paragraphs
    pub fn goto_right(&mut self) -> Result<bool> {
        self.reset_vertical();

        if self.text_pos < self.line.line.last_caret() {
            self.set_pos(self.text_pos + 1)?;
            return Ok(true);
        }

        if let Some(next) = self.next_line()? {
            let offset = next.line.start;
            let start = self.paragraph_start;
            self.enter(self.paragraph, start, next, offset)?;
            return Ok(true);
        }

        let Some(next_id) = self.document.next(self.paragraph) else {
            return Ok(false);
        };
        let start = self.next_paragraph_start(next_id)?;
        let line = self.first_line_of(next_id, start)?;
        self.enter(next_id, start, line, 0)?;
        Ok(true)
    }

    /// One position left; crosses lines and paragraphs
    pub fn goto_left(&mut self) -> Result<bool> {
        self.reset_vertical();

        if self.text_pos > self.line.line.start {
            self.set_pos(self.text_pos - 1)?;
            return Ok(true);
        }

        if let Some(prev) = self.previous_line()? {
            let offset = prev.line.last_caret();
            let start = self.paragraph_start;
            self.enter(self.paragraph, start, prev, offset)?;
            return Ok(true);
        }

        let Some(prev_id) = self.document.prev(self.paragraph) else {
            return Ok(false);
        };
        let start = self.start_of(prev_id)?;
        let line = self.last_line_of(prev_id, start)?;
        let offset = line.line.last_caret();
        self.enter(prev_id, start, line, offset)?;
        Ok(true)
    }

    /// One line down, keeping the column of the first vertical move
    pub fn goto_down(&mut self) -> Result<bool> {
        let target = self.begin_vertical();

        let (id, start, line) = match self.next_line()? {
            Some(line) => (self.paragraph, self.paragraph_start, line),
            None => {
                let Some(next_id) = self.document.next(self.paragraph) else {
                    return Ok(false);
                };
                let start = self.laid_out_start(next_id)?;
                (next_id, start, self.first_line_of(next_id, start)?)
            }
        };

        self.enter_at_column(id, start, line, target)?;
        Ok(true)
    }

    /// One line up, keeping the column of the first vertical move
    pub fn goto_up(&mut self) -> Result<bool> {
        let target = self.begin_vertical();

        let (id, start, line) = match self.previous_line()? {
            Some(line) => (self.paragraph, self.paragraph_start, line),
            None => {
                let Some(prev_id) = self.document.prev(self.paragraph) else {
                    return Ok(false);
                };
                let start = self.laid_out_start(prev_id)?;
                (prev_id, start, self.last_line_of(prev_id, start)?)
            }
        };

        self.enter_at_column(id, start, line, target)?;
        Ok(true)
    }

    fn begin_vertical(&mut self) -> f32 {
        if !self.vertical {
            self.vertical = true;
            self.target_x = Some(self.x);
        }
        self.target_x.unwrap_or(self.x)
    }

    /// Enter a line and walk right until reaching `target`
    fn enter_at_column(
        &mut self,
        id: ParagraphId,
        start: FlowPosition,
        line: PlacedLine,
        target: f32,
    ) -> Result<()> {
        let offset = line.line.start;
        self.enter(id, start, line, offset)?;
        let positions = self
            .flow_for(id)?
            .breaker()
            .caret_positions(self.document, id, &self.line.line)?;
        let step = positions
            .iter()
            .position(|&x| x >= target)
            .unwrap_or(positions.len().saturating_sub(1));
        if step > 0 {
            self.set_pos(offset + step)?;
        }
        Ok(())
    }

    pub fn goto_line_start(&mut self) -> Result<bool> {
        self.reset_vertical();
        let start = self.line.line.start;
        let moved = self.text_pos != start;
        self.set_pos(start)?;
        Ok(moved)
    }

    /// Last visible stop of the line (before a wrapped line's break space)
    pub fn goto_line_end(&mut self) -> Result<bool> {
        self.reset_vertical();
        let end = self.line.line.last_caret();
        let moved = self.text_pos != end;
        self.set_pos(end)?;
        Ok(moved)
    }

    pub fn goto_paragraph_start(&mut self) -> Result<bool> {
        self.reset_vertical();
        if self.text_pos == 0 {
            return Ok(false);
        }
        let start = self.paragraph_start;
        let line = self.first_line_of(self.paragraph, start)?;
        self.enter(self.paragraph, start, line, 0)?;
        Ok(true)
    }

    pub fn goto_paragraph_end(&mut self) -> Result<bool> {
        self.reset_vertical();
        let start = self.paragraph_start;
        let line = self.last_line_of(self.paragraph, start)?;
        let end = line.line.last_caret();
        if self.text_pos == end && self.line.line.start == line.line.start {
            return Ok(false);
        }
        self.enter(self.paragraph, start, line, end)?;
        Ok(true)
    }

    /// Place the caret at the text position closest to a point
    ///
    /// Paragraphs are scanned in document order. A paragraph without layout
    /// markers ends the scan with [`FlowError::PositionNotLaidOut`] unless a
    /// line at `y` was already found.
    pub fn goto_pixel(&mut self, x: f32, y: f32) -> Result<()> {
        self.reset_vertical();

        let mut fallback: Option<(ParagraphId, FlowPosition, PlacedLine)> = None;
        let mut hit: Option<(ParagraphId, FlowPosition, PlacedLine)> = None;

        for (id, paragraph) in self.document.iter() {
            let Some(markers) = paragraph.markers() else {
                if fallback.is_some() {
                    break;
                }
                return Err(FlowError::PositionNotLaidOut { paragraph: id });
            };
            let start = FlowPosition {
                frame: markers.start_frame,
                page: markers.start_page,
                y: markers.start_y,
            };
            // Single-frame paragraphs that cannot reach y need no replay
            let outside = y < markers.start_y || y >= markers.end_y;
            if markers.start_frame == markers.end_frame && outside {
                continue;
            }

            for line in self.lines_of(id, start)? {
                if !line.contains_y(y) {
                    continue;
                }
                let inside = self
                    .frames
                    .frame(line.frame)
                    .map(|f| x >= f.left && x <= f.right())
                    .unwrap_or(false);
                if inside {
                    hit = Some((id, start, line));
                    break;
                }
                if fallback.is_none() {
                    fallback = Some((id, start, line));
                }
            }
            if hit.is_some() {
                break;
            }
        }

        let Some((id, start, line)) = hit.or(fallback) else {
            return Err(FlowError::PositionNotFound { x, y });
        };

        let positions = self
            .flow_for(id)?
            .breaker()
            .caret_positions(self.document, id, &line.line)?;
        let step = closest_caret(&positions, x);
        let offset = line.line.start + step;
        self.enter(id, start, line, offset)
    }
}

/// Index of the caret stop nearest to `x`: past a character's midpoint the
/// caret goes after it
fn closest_caret(positions: &[f32], x: f32) -> usize {
    for (i, pair) in positions.windows(2).enumerate() {
        let mid = (pair[0] + pair[1]) / 2.0;
        if x < mid {
            return i;
        }
    }
    positions.len().saturating_sub(1)
}

/// Position the first line of `paragraph` is placed from
fn paragraph_start(
    document: &Document,
    env: LayoutEnv<'_>,
    frames: &dyn FrameGeometryProvider,
    paragraph: ParagraphId,
    from_start: bool,
) -> Result<FlowPosition> {
    document.paragraph(paragraph)?;

    if !from_start {
        let markers = document
            .markers(paragraph)
            .ok_or(FlowError::PositionNotLaidOut { paragraph })?;
        return Ok(FlowPosition {
            frame: markers.start_frame,
            page: markers.start_page,
            y: markers.start_y,
        });
    }

    let mut source = FixedFrames(frames);
    let mut pos = flow_origin(frames).ok_or(FlowError::PositionNotLaidOut { paragraph })?;
    let mut cursor = document.first();
    while let Some(id) = cursor {
        let flow = LineFlow::new(env, document, id)?;
        let start = flow
            .start_position(pos, break_after_previous(document, id), &mut source)
            .ok_or(FlowError::PositionNotLaidOut { paragraph })?;
        if id == paragraph {
            return Ok(start);
        }
        let layout = flow.flow(start, &mut source)?;
        if layout.is_overflow() {
            return Err(FlowError::PositionNotLaidOut { paragraph });
        }
        pos = layout.end;
        cursor = document.next(id);
    }
    Err(FlowError::UnknownParagraph(paragraph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowConfig;
    use crate::flow::ParagraphFlowController;
    use crate::frame::{PageSet, Rect};
    use crate::metrics::FixedMetrics;
    use crate::style::{CascadeResolver, StyleSheet};

    // 10px glyphs, 10px lines
    fn document(texts: &[&str]) -> (Document, Vec<ParagraphId>) {
        let mut sheet = StyleSheet::new();
        if let Some(style) = sheet.get_mut(0) {
            style.base.size = 10.0;
        }
        let mut doc = Document::new(sheet);
        let ids = texts.iter().map(|t| doc.append_paragraph(t, 0)).collect();
        (doc, ids)
    }

    fn pages(width: f32) -> PageSet {
        PageSet::new(1000.0, vec![Rect::new(0.0, 0.0, width, 500.0)], &FlowConfig::default())
    }

    fn laid_out(doc: &mut Document, frames: &mut PageSet, env: LayoutEnv<'_>) {
        ParagraphFlowController::new(env).layout_document(doc, frames).unwrap();
    }

    #[test]
    fn test_right_walks_lines_and_paragraphs() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb", "cc"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        for _ in 0..4 {
            assert!(cursor.goto_right().unwrap());
        }
        assert_eq!(cursor.text_pos(), 4);
        assert!(cursor.is_line_end());

        // Break space is skipped: next stop is the start of line two
        assert!(cursor.goto_right().unwrap());
        assert_eq!(cursor.text_pos(), 5);
        assert_eq!(cursor.line_start(), 5);
        assert_eq!(cursor.x(), 0.0);
        assert_eq!(cursor.y(), 10.0);

        for _ in 0..4 {
            cursor.goto_right().unwrap();
        }
        assert_eq!(cursor.text_pos(), 9);

        assert!(cursor.goto_right().unwrap());
        assert_eq!(cursor.paragraph(), ids[1]);
        assert_eq!(cursor.text_pos(), 0);
        assert_eq!(cursor.y(), 20.0);

        cursor.goto_right().unwrap();
        cursor.goto_right().unwrap();
        assert_eq!(cursor.text_pos(), 2);
        assert!(!cursor.goto_right().unwrap());
        assert_eq!(cursor.text_pos(), 2);
    }

    #[test]
    fn test_left_walks_back() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb", "cc"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[1], false).unwrap();
        assert!(cursor.goto_left().unwrap());
        assert_eq!(cursor.paragraph(), ids[0]);
        assert_eq!(cursor.text_pos(), 9);
        assert_eq!(cursor.x(), 40.0);

        for _ in 0..4 {
            cursor.goto_left().unwrap();
        }
        assert_eq!(cursor.text_pos(), 5);
        assert!(cursor.goto_left().unwrap());
        assert_eq!(cursor.text_pos(), 4);
        assert_eq!(cursor.line_start(), 0);

        for _ in 0..4 {
            cursor.goto_left().unwrap();
        }
        assert_eq!(cursor.text_pos(), 0);
        assert!(!cursor.goto_left().unwrap());
    }

    #[test]
    fn test_vertical_moves_keep_column() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaaaaaa", "bb", "cccccc"]);
        let mut frames = pages(100.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        cursor.goto_pos(6).unwrap();
        assert_eq!(cursor.x(), 60.0);

        assert!(cursor.goto_down().unwrap());
        assert_eq!(cursor.paragraph(), ids[1]);
        assert_eq!(cursor.text_pos(), 2);

        assert!(cursor.goto_down().unwrap());
        assert_eq!(cursor.paragraph(), ids[2]);
        assert_eq!(cursor.text_pos(), 6);
        assert!(!cursor.goto_down().unwrap());

        cursor.goto_up().unwrap();
        cursor.goto_up().unwrap();
        assert_eq!(cursor.paragraph(), ids[0]);
        assert_eq!(cursor.text_pos(), 6);
        assert!(!cursor.goto_up().unwrap());
    }

    #[test]
    fn test_horizontal_move_resets_column() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaaaaaa", "bb", "cccccc"]);
        let mut frames = pages(100.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        cursor.goto_pos(6).unwrap();
        cursor.goto_down().unwrap();
        cursor.goto_left().unwrap();
        assert_eq!(cursor.text_pos(), 1);

        cursor.goto_down().unwrap();
        assert_eq!(cursor.text_pos(), 1);
    }

    #[test]
    fn test_line_and_paragraph_bounds() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        assert!(!cursor.goto_line_start().unwrap());
        assert!(cursor.goto_line_end().unwrap());
        assert_eq!(cursor.text_pos(), 4);

        assert!(cursor.goto_paragraph_end().unwrap());
        assert_eq!(cursor.text_pos(), 9);
        assert_eq!(cursor.line_start(), 5);
        assert!(!cursor.goto_paragraph_end().unwrap());

        assert!(cursor.goto_line_start().unwrap());
        assert_eq!(cursor.text_pos(), 5);

        assert!(cursor.goto_paragraph_start().unwrap());
        assert_eq!(cursor.text_pos(), 0);
        assert_eq!(cursor.y(), 0.0);
    }

    #[test]
    fn test_goto_pos_bounds() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        cursor.goto_pos(3).unwrap();
        assert_eq!(cursor.x(), 30.0);
        assert!(matches!(cursor.goto_pos(7), Err(FlowError::OffsetOutOfRange { offset: 7, .. })));
        assert_eq!(cursor.text_pos(), 3);
    }

    #[test]
    fn test_goto_pixel_midpoint() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb", "cc"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        cursor.goto_pixel(23.0, 12.0).unwrap();
        assert_eq!(cursor.text_pos(), 7);
        cursor.goto_pixel(27.0, 12.0).unwrap();
        assert_eq!(cursor.text_pos(), 8);

        cursor.goto_pixel(500.0, 25.0).unwrap();
        assert_eq!(cursor.paragraph(), ids[1]);
        assert_eq!(cursor.text_pos(), 2);

        assert!(matches!(cursor.goto_pixel(10.0, 400.0), Err(FlowError::PositionNotFound { .. })));
    }

    #[test]
    fn test_requires_layout_without_replay() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (doc, ids) = document(&["aaaa bbbb", "cc"]);
        let frames = pages(50.0);

        let err = FlowCursor::new(&doc, env, &frames, ids[1], false).unwrap_err();
        assert!(matches!(err, FlowError::PositionNotLaidOut { .. }));

        // Replaying from the top needs no markers
        let cursor = FlowCursor::new(&doc, env, &frames, ids[1], true).unwrap();
        assert_eq!(cursor.y(), 20.0);
        assert_eq!(cursor.baseline(), 28.0);
    }

    #[test]
    fn test_caret_snapshot() {
        let (metrics, resolver, config) =
            (FixedMetrics::uniform(1.0), CascadeResolver, FlowConfig::default());
        let env = LayoutEnv::new(&metrics, &resolver, &config);
        let (mut doc, ids) = document(&["aaaa bbbb"]);
        let mut frames = pages(50.0);
        laid_out(&mut doc, &mut frames, env);

        let mut cursor = FlowCursor::new(&doc, env, &frames, ids[0], false).unwrap();
        cursor.goto_paragraph_end().unwrap();
        let caret = cursor.caret();
        assert_eq!(caret.offset, 9);
        assert_eq!(caret.x, 40.0);
        assert_eq!(caret.y, 10.0);
        assert_eq!(caret.height, 10.0);
        assert_eq!(caret.baseline, 18.0);
        assert_eq!(caret.page, 0);
    }
}
