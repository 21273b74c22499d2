//! Layout scenarios
//!
//! End-to-end checks of breaking, flow and counters on small documents.
//! All documents use 10px glyphs (size 10, uniform advance) so widths can be
//! read off character counts.

use flow_layout::*;

fn sheet() -> StyleSheet {
    let mut sheet = StyleSheet::new();
    if let Some(style) = sheet.get_mut(0) {
        style.base.size = 10.0;
    }
    sheet
}

fn compute(doc: &Document, id: ParagraphId, start: usize, width: f32) -> LineResult {
    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let breaker = LineBreaker::new(&metrics, &CascadeResolver, &config);
    breaker
        .compute_line(doc, id, start, &LineGeometry { left: 0.0, width })
        .unwrap()
}

// ============================================================================
// BREAKING
// ============================================================================

#[test]
fn test_break_before_overflowing_word() {
    let mut doc = Document::new(sheet());
    let id = doc.append_paragraph("The quick brown fox jumps", 0);

    // Exactly "The quick brown"
    let line = compute(&doc, id, 0, 150.0);
    assert_eq!(line.end, 16);
    assert!(line.trailing_space);
    assert_eq!(line.width, 150.0);
    assert!(doc.get(id).unwrap().chars()[15].is_space());

    let text: String = doc.get(id).unwrap().text().chars().take(line.end).collect();
    assert_eq!(text.trim_end(), "The quick brown");

    let next = compute(&doc, id, line.end, 150.0);
    assert_eq!(next.start, 16);
    assert_eq!(next.end, 25);
    assert!(next.is_last);
}

#[test]
fn test_empty_paragraph_has_base_height() {
    let mut doc = Document::new(sheet());
    let id = doc.append_paragraph("", 0);

    let line = compute(&doc, id, 0, 100.0);
    assert!(line.is_empty());
    assert!(line.is_last);
    assert_eq!(line.text_height(), 10.0);

    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);
    let mut pages = PageSet::single_column(200.0, 200.0, 0.0, &config);
    ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages).unwrap();

    let markers = doc.markers(id).unwrap();
    assert_eq!(markers.end_y - markers.start_y, 10.0);
}

#[test]
fn test_unbreakable_token_is_one_line() {
    let token = "x".repeat(50);
    let mut doc = Document::new(sheet());
    let id = doc.append_paragraph(&token, 0);

    let line = compute(&doc, id, 0, 100.0);
    assert_eq!(line.end, 50);
    assert_eq!(line.width, 500.0);
    assert!(line.is_last);

    // A following word still breaks after the token
    let text = format!("{} yy", token);
    let id = doc.append_paragraph(&text, 0);
    let line = compute(&doc, id, 0, 100.0);
    assert_eq!(line.end, 51);
    let rest = compute(&doc, id, line.end, 100.0);
    assert_eq!((rest.start, rest.end), (51, 53));
}

// ============================================================================
// COUNTERS
// ============================================================================

#[test]
fn test_counter_reserved_on_first_line_only() {
    let mut styles = sheet();
    let mut listed = ParagraphStyle::named("List");
    listed.base.size = 10.0;
    listed.left_indent = 15.0;
    listed.counter = Some(Counter::numeric());
    let listed = styles.add(listed);

    let mut doc = Document::new(styles);
    let first = doc.append_paragraph("aaaa bbbb cccc", listed);
    let second = doc.append_paragraph("dddd", listed);
    assert_eq!(doc.counter_label(first).as_deref(), Some("1. "));
    assert_eq!(doc.counter_label(second).as_deref(), Some("2. "));

    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);
    let mut pages = PageSet::new(500.0, vec![Rect::new(20.0, 0.0, 115.0, 400.0)], &config);
    let controller = ParagraphFlowController::new(env);
    let origin = FlowPosition { frame: 0, page: 0, y: 0.0 };
    let layout = controller.layout_paragraph(&mut doc, first, origin, &mut pages).unwrap();

    assert_eq!(layout.lines.len(), 2);
    let head = &layout.lines[0].line;
    assert_eq!(head.counter_width, 30.0);
    assert_eq!(head.counter_left, 35.0);
    assert_eq!(head.left, 20.0 + 15.0 + 30.0);
    assert_eq!(head.end, 5);

    let tail = &layout.lines[1].line;
    assert_eq!(tail.counter_width, 0.0);
    assert_eq!(tail.left, 20.0 + 15.0);
}

#[test]
fn test_nested_counter_keeps_outer_numbering() {
    let mut styles = sheet();
    let mut outer = ParagraphStyle::named("Outer");
    outer.counter = Some(Counter::numeric());
    let outer = styles.add(outer);
    let mut inner = ParagraphStyle::named("Inner");
    let mut counter = Counter::numeric();
    counter.kind = CounterKind::LowerAlpha;
    counter.depth = 1;
    inner.counter = Some(counter);
    let inner = styles.add(inner);

    let mut doc = Document::new(styles);
    doc.append_paragraph("one", outer);
    let a = doc.append_paragraph("sub", inner);
    let b = doc.append_paragraph("sub", inner);
    let two = doc.append_paragraph("two", outer);

    assert_eq!(doc.counter_label(a).as_deref(), Some("a. "));
    assert_eq!(doc.counter_label(b).as_deref(), Some("b. "));
    assert_eq!(doc.counter_label(two).as_deref(), Some("2. "));
}

// ============================================================================
// FRAMES
// ============================================================================

#[test]
fn test_full_frame_moves_next_paragraph_on() {
    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);

    // Two columns, each exactly two lines tall
    let columns = vec![Rect::new(0.0, 0.0, 50.0, 20.0), Rect::new(60.0, 0.0, 50.0, 20.0)];
    let mut pages = PageSet::new(100.0, columns, &config);

    let mut doc = Document::new(sheet());
    let a = doc.append_paragraph("aaaa bbbb", 0);
    let b = doc.append_paragraph("cccc", 0);
    let c = doc.append_paragraph("dddd eeee", 0);

    let report = ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages).unwrap();
    assert!(report.is_complete());

    let first = doc.markers(a).unwrap();
    assert_eq!(first.end_frame, 0);
    assert_eq!(first.end_y, 20.0);

    let second = doc.markers(b).unwrap();
    assert_eq!(second.start_frame, 1);
    assert_eq!(second.start_y, 0.0);

    // Second column fills too: a new page is requested
    let third = doc.markers(c).unwrap();
    assert_eq!(third.start_frame, 1);
    assert_eq!(third.end_frame, 2);
    assert_eq!(third.end_page, 1);
    assert_eq!(pages.page_count(), 2);
}

#[test]
fn test_page_break_after_previous() {
    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);

    let mut styles = sheet();
    let mut closing = ParagraphStyle::named("Closing");
    closing.base.size = 10.0;
    closing.page_break_after = true;
    let closing = styles.add(closing);

    let mut doc = Document::new(styles);
    doc.append_paragraph("end of part", closing);
    let next = doc.append_paragraph("new part", 0);
    let mut pages = PageSet::single_column(200.0, 300.0, 0.0, &config);

    ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages).unwrap();
    let markers = doc.markers(next).unwrap();
    assert_eq!(markers.start_page, 1);
    assert_eq!(markers.start_y, 300.0);
}

// ============================================================================
// CURSOR OVER A FLOW
// ============================================================================

#[test]
fn test_cursor_crosses_pages() {
    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);
    let mut pages = PageSet::new(100.0, vec![Rect::new(0.0, 0.0, 50.0, 20.0)], &config);

    let mut doc = Document::new(sheet());
    let a = doc.append_paragraph("aaaa bbbb cccc", 0);
    ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages).unwrap();

    let mut cursor = FlowCursor::new(&doc, env, &pages, a, false).unwrap();
    cursor.goto_down().unwrap();
    assert_eq!(cursor.page(), 0);
    cursor.goto_down().unwrap();
    assert_eq!(cursor.page(), 1);
    assert_eq!(cursor.y(), 100.0);
    assert_eq!(cursor.line_start(), 10);

    cursor.goto_up().unwrap();
    assert_eq!(cursor.page(), 0);
    assert_eq!(cursor.y(), 10.0);
}

#[test]
fn test_replayed_start_matches_markers() {
    let metrics = FixedMetrics::uniform(1.0);
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &CascadeResolver, &config);
    let mut pages = PageSet::new(100.0, vec![Rect::new(0.0, 0.0, 50.0, 20.0)], &config);

    let mut doc = Document::new(sheet());
    doc.append_paragraph("aaaa bbbb", 0);
    doc.append_paragraph("cccc dddd eeee", 0);
    let last = doc.append_paragraph("ffff", 0);
    ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages).unwrap();

    let stored = FlowCursor::new(&doc, env, &pages, last, false).unwrap().caret();
    let replayed = FlowCursor::new(&doc, env, &pages, last, true).unwrap().caret();
    assert_eq!(stored, replayed);
    assert_eq!(stored.page, 2);
}
