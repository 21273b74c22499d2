//! fOS Flow Layout
//!
//! Line breaking, vertical flow and caret navigation for word-processor
//! documents:
//! - Paragraph store with stable ids and per-paragraph layout markers
//! - Line breaking with justification, alignment and counter reservation
//! - Paragraph flow across frames and pages, with auto-extension
//! - A navigable cursor with remembered column for vertical moves
//!
//! Font metrics, style resolution and frame geometry come from small traits
//! ([`GlyphMetricsProvider`], [`StyleResolver`], [`FrameGeometryProvider`])
//! so any text system can sit behind the engine.

pub mod config;
pub mod cursor;
pub mod document;
pub mod flow;
pub mod frame;
pub mod line;
pub mod metrics;
pub mod style;

pub use config::FlowConfig;
pub use cursor::{CaretInfo, FlowCursor};
pub use document::{
    CharContent, Document, EmbeddedObject, LayoutMarkers, Paragraph, ParagraphId, TextChar,
};
pub use flow::{
    DocumentLayout, FlowPosition, LayoutEnv, ParagraphFlowController, ParagraphLayout,
    ParagraphOutcome, PlacedLine,
};
pub use frame::{FrameGeometry, FrameGeometryProvider, PageManager, PageSet, Rect};
pub use line::{LineBreaker, LineGeometry, LineResult};
pub use metrics::{FixedMetrics, GlyphMetrics, GlyphMetricsProvider};
#[cfg(feature = "font-metrics")]
pub use metrics::FontFaceMetrics;
pub use style::{
    Alignment, CascadeResolver, Color, Counter, CounterKind, ParagraphStyle, StyleOverride,
    StyleResolver, StyleSheet, TextStyle, VerticalAlign,
};

/// Layout error types
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Paragraph {paragraph:?} references missing style {style}")]
    MalformedDocument { paragraph: ParagraphId, style: usize },

    #[error("Paragraph {paragraph:?} has not been laid out")]
    PositionNotLaidOut { paragraph: ParagraphId },

    #[error("Unknown paragraph: {0:?}")]
    UnknownParagraph(ParagraphId),

    #[error("Offset {offset} out of range (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("No laid-out text at ({x}, {y})")]
    PositionNotFound { x: f32, y: f32 },

    #[error("Failed to parse font: {0}")]
    FontParsing(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
