//! Example: lay out a short document and walk it with a cursor
//!
//! Run with `RUST_LOG=flow_layout=debug` to watch frame and page moves.

use flow_layout::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut styles = StyleSheet::new();
    let mut heading = ParagraphStyle::named("Heading");
    heading.base.size = 18.0;
    heading.base.weight = 700;
    heading.foot_offset = 6.0;
    let heading = styles.add(heading);

    let mut body = ParagraphStyle::named("Body");
    body.alignment = Alignment::Justify;
    body.first_line_indent = 12.0;
    body.line_spacing = 2.0;
    let body = styles.add(body);

    let mut item = ParagraphStyle::named("Item");
    item.left_indent = 10.0;
    item.counter = Some(Counter::numeric());
    let item = styles.add(item);

    let mut doc = Document::new(styles);
    doc.append_paragraph("Flowed text", heading);
    let intro = doc.append_paragraph(
        "Lines are broken greedily at spaces, justified with the rounding error \
         carried from space to space, and stacked down each frame until the \
         frame is full.",
        body,
    );
    doc.append_paragraph("Frames run out", item);
    doc.append_paragraph("Pages are appended", item);
    doc.append_paragraph("Text keeps flowing", item);

    let metrics = FixedMetrics::default();
    let resolver = CascadeResolver;
    let config = FlowConfig::default();
    let env = LayoutEnv::new(&metrics, &resolver, &config);

    let mut pages = PageSet::single_column(240.0, 160.0, 20.0, &config);
    let report = ParagraphFlowController::new(env).layout_document(&mut doc, &mut pages)?;
    println!(
        "{} paragraphs, {} lines on {} pages",
        report.paragraphs, report.lines, report.pages_used
    );

    for (id, paragraph) in doc.iter() {
        let Some(markers) = paragraph.markers() else {
            println!("{:?}: not laid out", id);
            continue;
        };
        println!(
            "{:?} [{}] page {}..={} y {}..{}",
            id,
            doc.resolved_style(id).name,
            markers.start_page,
            markers.end_page,
            markers.start_y,
            markers.end_y
        );
    }

    let mut cursor = FlowCursor::new(&doc, env, &pages, intro, false)?;
    cursor.goto_pos(5)?;
    while cursor.goto_down()? {
        let caret = cursor.caret();
        println!(
            "caret at {:?}:{} x={:.1} y={:.1} page {}",
            caret.paragraph, caret.offset, caret.x, caret.y, caret.page
        );
    }

    Ok(())
}
