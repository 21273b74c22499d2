//! Frames and pages
//!
//! Text flows through an ordered sequence of rectangular frames. Frames
//! belong to pages; pages are stacked vertically in one coordinate space,
//! so a y coordinate alone identifies a point in the document.

use crate::config::FlowConfig;

/// Rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Whether the horizontal band `[y, y + height)` overlaps this rect
    pub fn overlaps_band(&self, y: f32, height: f32) -> bool {
        y < self.bottom() && y + height > self.y
    }

    /// Same rect moved down by `dy`
    pub fn offset_y(&self, dy: f32) -> Self {
        Self { y: self.y + dy, ..*self }
    }
}

/// Geometry of one flow frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    /// Vertical space available for text
    pub height: f32,
    pub page: usize,
    /// Other frames carve into this one
    pub has_intersections: bool,
}

impl FrameGeometry {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Read access to the frame sequence
pub trait FrameGeometryProvider {
    fn frame(&self, index: usize) -> Option<FrameGeometry>;

    fn frame_count(&self) -> usize;

    /// Width carved from the frame's left edge over the band `[y, y + height)`
    fn left_indent_at(&self, _frame: usize, _y: f32, _height: f32) -> f32 {
        0.0
    }

    /// Width carved from the frame's right edge over the band `[y, y + height)`
    fn right_indent_at(&self, _frame: usize, _y: f32, _height: f32) -> f32 {
        0.0
    }
}

/// Creates pages when the frame sequence runs out
pub trait PageManager {
    /// Append a page and return the index of its first flow frame
    ///
    /// Returns `None` when the flow may not grow.
    fn append_page(&mut self) -> Option<usize>;

    /// Drop appended pages past the first `pages` after a complete pass
    fn release_pages(&mut self, _pages: usize) {}
}

#[derive(Debug, Clone)]
struct FlowFrame {
    rect: Rect,
    page: usize,
    /// Rectangles of other frames that text must run around
    obstacles: Vec<Rect>,
}

/// Frames grouped into pages, extendable from a page template
#[derive(Debug, Clone)]
pub struct PageSet {
    frames: Vec<FlowFrame>,
    /// Frame rects of a new page, relative to the page's top
    template: Vec<Rect>,
    page_height: f32,
    pages: usize,
    /// Pages given up front; never released
    fixed_pages: usize,
    auto_extend: bool,
    max_pages: usize,
}

impl PageSet {
    /// One page built from `template`
    pub fn new(page_height: f32, template: Vec<Rect>, config: &FlowConfig) -> Self {
        let mut set = Self {
            frames: Vec::new(),
            template,
            page_height,
            pages: 0,
            fixed_pages: 0,
            auto_extend: config.auto_extend,
            max_pages: config.max_pages.max(1),
        };
        set.push_template_page();
        set.fixed_pages = set.pages;
        set
    }

    /// Single-column pages of the given size and margin
    pub fn single_column(
        page_width: f32,
        page_height: f32,
        margin: f32,
        config: &FlowConfig,
    ) -> Self {
        let body = Rect::new(
            margin,
            margin,
            (page_width - 2.0 * margin).max(0.0),
            (page_height - 2.0 * margin).max(0.0),
        );
        Self::new(page_height, vec![body], config)
    }

    fn push_template_page(&mut self) -> Option<usize> {
        if self.template.is_empty() {
            return None;
        }
        let page = self.pages;
        let origin = page as f32 * self.page_height;
        let first = self.frames.len();
        for rect in &self.template {
            self.frames.push(FlowFrame {
                rect: rect.offset_y(origin),
                page,
                obstacles: Vec::new(),
            });
        }
        self.pages += 1;
        Some(first)
    }

    /// Add a frame at absolute coordinates on an existing or new page
    pub fn push_frame(&mut self, page: usize, rect: Rect) -> usize {
        self.pages = self.pages.max(page + 1);
        self.fixed_pages = self.fixed_pages.max(page + 1);
        self.frames.push(FlowFrame { rect, page, obstacles: Vec::new() });
        self.frames.len() - 1
    }

    /// Make text in `frame` run around `obstacle`
    pub fn add_obstacle(&mut self, frame: usize, obstacle: Rect) {
        if let Some(f) = self.frames.get_mut(frame) {
            f.obstacles.push(obstacle);
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn page_height(&self) -> f32 {
        self.page_height
    }

    pub fn set_auto_extend(&mut self, auto_extend: bool) {
        self.auto_extend = auto_extend;
    }

    /// Drop pages past `pages`, keeping at least one
    pub fn truncate_pages(&mut self, pages: usize) {
        let pages = pages.max(1);
        self.frames.retain(|f| f.page < pages);
        self.pages = self.pages.min(pages);
        self.fixed_pages = self.fixed_pages.min(self.pages);
    }

    fn carve(&self, frame: usize, y: f32, height: f32) -> (f32, f32) {
        let Some(f) = self.frames.get(frame) else {
            return (0.0, 0.0);
        };
        let center = f.rect.x + f.rect.width / 2.0;
        let mut left = 0.0f32;
        let mut right = 0.0f32;
        for obstacle in f.obstacles.iter().filter(|o| o.overlaps_band(y, height)) {
            if obstacle.x + obstacle.width / 2.0 < center {
                left = left.max(obstacle.right() - f.rect.x);
            } else {
                right = right.max(f.rect.right() - obstacle.x);
            }
        }
        (left.clamp(0.0, f.rect.width), right.clamp(0.0, f.rect.width))
    }
}

impl FrameGeometryProvider for PageSet {
    fn frame(&self, index: usize) -> Option<FrameGeometry> {
        self.frames.get(index).map(|f| FrameGeometry {
            left: f.rect.x,
            top: f.rect.y,
            width: f.rect.width,
            height: f.rect.height,
            page: f.page,
            has_intersections: !f.obstacles.is_empty(),
        })
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn left_indent_at(&self, frame: usize, y: f32, height: f32) -> f32 {
        self.carve(frame, y, height).0
    }

    fn right_indent_at(&self, frame: usize, y: f32, height: f32) -> f32 {
        self.carve(frame, y, height).1
    }
}

impl PageManager for PageSet {
    fn append_page(&mut self) -> Option<usize> {
        if !self.auto_extend || self.pages >= self.max_pages {
            tracing::debug!(
                "Page append refused (auto_extend={}, pages={})",
                self.auto_extend,
                self.pages
            );
            return None;
        }
        let first = self.push_template_page()?;
        tracing::debug!("Appended page {} (frame {})", self.pages - 1, first);
        Some(first)
    }

    fn release_pages(&mut self, pages: usize) {
        let keep = pages.max(self.fixed_pages);
        if keep < self.pages {
            tracing::debug!("Releasing pages {}..{}", keep, self.pages);
            self.truncate_pages(keep);
        }
    }
}
