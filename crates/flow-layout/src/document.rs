//! Paragraph store
//!
//! Paragraphs live in a generational arena and are chained in document order
//! through `prev`/`next` links. Layout state is written back onto each
//! paragraph as [`LayoutMarkers`] by the flow controller.

use std::ops::Range;

use crate::style::{ParagraphStyle, StyleOverride, StyleSheet};
use crate::{FlowError, Result};

/// Stable paragraph handle
///
/// The generation changes when a slot is reused, so a handle to a removed
/// paragraph never resolves to its successor in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParagraphId {
    pub index: u32,
    pub generation: u32,
}

/// Inline object occupying space in a line without font metrics
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmbeddedObject {
    pub width: f32,
    pub height: f32,
}

/// What a character position holds
#[derive(Debug, Clone, PartialEq)]
pub enum CharContent {
    Glyph(char),
    Special(EmbeddedObject),
}

/// One character position in a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct TextChar {
    pub content: CharContent,
    /// Style change taking effect at this character
    pub format: Option<StyleOverride>,
}

impl TextChar {
    pub fn glyph(c: char) -> Self {
        Self { content: CharContent::Glyph(c), format: None }
    }

    pub fn special(object: EmbeddedObject) -> Self {
        Self { content: CharContent::Special(object), format: None }
    }

    pub fn is_space(&self) -> bool {
        matches!(self.content, CharContent::Glyph(' '))
    }

    /// A line may end right after this character
    pub fn is_break_opportunity(&self) -> bool {
        matches!(self.content, CharContent::Glyph(' ' | '\t'))
    }

    /// The line must end right after this character
    pub fn is_hard_break(&self) -> bool {
        matches!(self.content, CharContent::Glyph('\n'))
    }
}

/// Where a top-down layout pass placed a paragraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMarkers {
    pub start_page: usize,
    pub end_page: usize,
    pub start_frame: usize,
    pub end_frame: usize,
    /// Top of the first line (before any head offset)
    pub start_y: f32,
    /// Bottom of the last laid-out line
    pub end_y: f32,
    /// False when the pass overflowed inside this paragraph
    pub complete: bool,
}

/// A paragraph of text
#[derive(Debug, Clone)]
pub struct Paragraph {
    chars: Vec<TextChar>,
    style: usize,
    prev: Option<ParagraphId>,
    next: Option<ParagraphId>,
    markers: Option<LayoutMarkers>,
}

impl Paragraph {
    /// Unlinked paragraph holding `text` with style index `style`
    pub fn from_text(text: &str, style: usize) -> Self {
        Self {
            chars: text.chars().map(TextChar::glyph).collect(),
            style,
            prev: None,
            next: None,
            markers: None,
        }
    }

    pub fn chars(&self) -> &[TextChar] {
        &self.chars
    }

    pub fn char_at(&self, offset: usize) -> Option<&TextChar> {
        self.chars.get(offset)
    }

    /// Number of character positions
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn style_index(&self) -> usize {
        self.style
    }

    pub fn prev(&self) -> Option<ParagraphId> {
        self.prev
    }

    pub fn next(&self) -> Option<ParagraphId> {
        self.next
    }

    pub fn markers(&self) -> Option<&LayoutMarkers> {
        self.markers.as_ref()
    }

    /// Plain text; embedded objects show as U+FFFC
    pub fn text(&self) -> String {
        self.chars
            .iter()
            .map(|c| match c.content {
                CharContent::Glyph(g) => g,
                CharContent::Special(_) => '\u{FFFC}',
            })
            .collect()
    }

    /// Attach an override at `offset`, merged over any existing one there
    pub fn set_format(&mut self, offset: usize, format: StyleOverride) {
        if let Some(ch) = self.chars.get_mut(offset) {
            ch.format = Some(match ch.format.take() {
                Some(existing) => existing.merged(&format),
                None => format,
            });
        }
    }

    /// All overrides before `offset` folded into one
    fn accumulated_format(&self, offset: usize) -> StyleOverride {
        self.chars[..offset.min(self.chars.len())]
            .iter()
            .filter_map(|c| c.format.as_ref())
            .fold(StyleOverride::default(), |acc, f| acc.merged(f))
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    paragraph: Option<Paragraph>,
}

/// Ordered paragraph arena plus the style sheet it indexes into
#[derive(Debug, Default)]
pub struct Document {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    first: Option<ParagraphId>,
    last: Option<ParagraphId>,
    count: usize,
    styles: StyleSheet,
}

impl Document {
    pub fn new(styles: StyleSheet) -> Self {
        Self {
            slots: Vec::with_capacity(64),
            free_list: Vec::new(),
            first: None,
            last: None,
            count: 0,
            styles,
        }
    }

    pub fn styles(&self) -> &StyleSheet {
        &self.styles
    }

    /// Mutable style sheet; drops every paragraph's layout markers
    pub fn styles_mut(&mut self) -> &mut StyleSheet {
        if let Some(first) = self.first {
            self.invalidate_from(first);
        }
        &mut self.styles
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn first(&self) -> Option<ParagraphId> {
        self.first
    }

    pub fn last(&self) -> Option<ParagraphId> {
        self.last
    }

    pub fn get(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.paragraph.as_ref())
    }

    fn get_mut(&mut self, id: ParagraphId) -> Option<&mut Paragraph> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.paragraph.as_mut())
    }

    /// Like [`Document::get`] but reports stale handles
    pub fn paragraph(&self, id: ParagraphId) -> Result<&Paragraph> {
        self.get(id).ok_or(FlowError::UnknownParagraph(id))
    }

    fn paragraph_mut(&mut self, id: ParagraphId) -> Result<&mut Paragraph> {
        self.get_mut(id).ok_or(FlowError::UnknownParagraph(id))
    }

    pub fn next(&self, id: ParagraphId) -> Option<ParagraphId> {
        self.get(id).and_then(|p| p.next)
    }

    pub fn prev(&self, id: ParagraphId) -> Option<ParagraphId> {
        self.get(id).and_then(|p| p.prev)
    }

    /// Paragraphs in document order
    pub fn iter(&self) -> ParagraphIter<'_> {
        ParagraphIter { document: self, current: self.first }
    }

    fn alloc(&mut self, paragraph: Paragraph) -> ParagraphId {
        self.count += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.paragraph = Some(paragraph);
            ParagraphId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, paragraph: Some(paragraph) });
            ParagraphId { index, generation: 0 }
        }
    }

    /// Append a paragraph at the end of the document
    pub fn append_paragraph(&mut self, text: &str, style: usize) -> ParagraphId {
        let mut paragraph = Paragraph::from_text(text, style);
        paragraph.prev = self.last;
        let id = self.alloc(paragraph);

        if let Some(last_id) = self.last {
            if let Some(last) = self.get_mut(last_id) {
                last.next = Some(id);
            }
        } else {
            self.first = Some(id);
        }
        self.last = Some(id);
        id
    }

    /// Insert a new paragraph right after `after`
    pub fn insert_after(
        &mut self,
        after: ParagraphId,
        text: &str,
        style: usize,
    ) -> Result<ParagraphId> {
        let next = self.paragraph(after)?.next;
        let mut paragraph = Paragraph::from_text(text, style);
        paragraph.prev = Some(after);
        paragraph.next = next;
        let id = self.alloc(paragraph);

        self.paragraph_mut(after)?.next = Some(id);
        match next {
            Some(next_id) => self.paragraph_mut(next_id)?.prev = Some(id),
            None => self.last = Some(id),
        }
        self.invalidate_from(id);
        Ok(id)
    }

    /// Insert a new paragraph right before `before`
    pub fn insert_before(
        &mut self,
        before: ParagraphId,
        text: &str,
        style: usize,
    ) -> Result<ParagraphId> {
        match self.paragraph(before)?.prev {
            Some(prev) => self.insert_after(prev, text, style),
            None => {
                let mut paragraph = Paragraph::from_text(text, style);
                paragraph.next = Some(before);
                let id = self.alloc(paragraph);
                self.paragraph_mut(before)?.prev = Some(id);
                self.first = Some(id);
                self.invalidate_from(id);
                Ok(id)
            }
        }
    }

    /// Unlink and return a paragraph; its handle becomes stale
    pub fn remove(&mut self, id: ParagraphId) -> Result<Paragraph> {
        let (prev, next) = {
            let p = self.paragraph(id)?;
            (p.prev, p.next)
        };

        match prev {
            Some(prev_id) => self.paragraph_mut(prev_id)?.next = next,
            None => self.first = next,
        }
        match next {
            Some(next_id) => {
                self.paragraph_mut(next_id)?.prev = prev;
                self.invalidate_from(next_id);
            }
            None => self.last = prev,
        }

        let slot = &mut self.slots[id.index as usize];
        let mut paragraph = slot.paragraph.take().ok_or(FlowError::UnknownParagraph(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.count -= 1;

        paragraph.prev = None;
        paragraph.next = None;
        paragraph.markers = None;
        Ok(paragraph)
    }

    /// Split at `offset`; the tail becomes a new paragraph after `id`
    ///
    /// The tail keeps the character style that was in effect at the split.
    pub fn split_paragraph(&mut self, id: ParagraphId, offset: usize) -> Result<ParagraphId> {
        let (mut tail, carry, style) = {
            let p = self.paragraph_mut(id)?;
            check_offset(offset, p.len())?;
            let carry = p.accumulated_format(offset);
            (p.chars.split_off(offset), carry, p.style)
        };

        if let Some(first) = tail.first_mut() {
            let own = first.format.take().unwrap_or_default();
            let merged = carry.merged(&own);
            if merged != StyleOverride::default() {
                first.format = Some(merged);
            }
        }

        let new_id = self.insert_after(id, "", style)?;
        self.paragraph_mut(new_id)?.chars = tail;
        self.invalidate_from(id);
        Ok(new_id)
    }

    /// Append the following paragraph's text to `id` and remove it
    ///
    /// Returns false when `id` is the last paragraph.
    pub fn merge_with_next(&mut self, id: ParagraphId) -> Result<bool> {
        let Some(next_id) = self.paragraph(id)?.next else {
            return Ok(false);
        };

        let reset = {
            let p = self.paragraph(id)?;
            let carry = p.accumulated_format(p.len());
            reset_override(&carry, &self.resolved_style(id).base)
        };

        let mut removed = self.remove(next_id)?;
        if let Some(first) = removed.chars.first_mut() {
            let own = first.format.take().unwrap_or_default();
            let merged = reset.merged(&own);
            if merged != StyleOverride::default() {
                first.format = Some(merged);
            }
        }

        self.paragraph_mut(id)?.chars.append(&mut removed.chars);
        self.invalidate_from(id);
        Ok(true)
    }

    /// Insert plain text at `offset`
    pub fn insert_text(&mut self, id: ParagraphId, offset: usize, text: &str) -> Result<()> {
        let p = self.paragraph_mut(id)?;
        check_offset(offset, p.len())?;
        let tail = p.chars.split_off(offset);
        p.chars.extend(text.chars().map(TextChar::glyph));
        p.chars.extend(tail);
        self.invalidate_from(id);
        Ok(())
    }

    /// Insert an embedded object at `offset`
    pub fn insert_special(
        &mut self,
        id: ParagraphId,
        offset: usize,
        object: EmbeddedObject,
    ) -> Result<()> {
        let p = self.paragraph_mut(id)?;
        check_offset(offset, p.len())?;
        p.chars.insert(offset, TextChar::special(object));
        self.invalidate_from(id);
        Ok(())
    }

    /// Delete a character range
    ///
    /// Overrides on deleted characters are folded into the first surviving
    /// character after the range so later text keeps its style.
    pub fn delete_text(&mut self, id: ParagraphId, range: Range<usize>) -> Result<()> {
        let p = self.paragraph_mut(id)?;
        if range.start > range.end {
            return Err(FlowError::OffsetOutOfRange { offset: range.start, len: range.end });
        }
        check_offset(range.end, p.len())?;

        let removed: Vec<TextChar> = p.chars.drain(range.clone()).collect();
        let carry = removed
            .iter()
            .filter_map(|c| c.format.as_ref())
            .fold(StyleOverride::default(), |acc, f| acc.merged(f));
        if carry != StyleOverride::default() {
            if let Some(ch) = p.chars.get_mut(range.start) {
                let own = ch.format.take().unwrap_or_default();
                ch.format = Some(carry.merged(&own));
            }
        }
        self.invalidate_from(id);
        Ok(())
    }

    /// Attach a style override at `offset`
    pub fn set_format(
        &mut self,
        id: ParagraphId,
        offset: usize,
        format: StyleOverride,
    ) -> Result<()> {
        let p = self.paragraph_mut(id)?;
        if offset >= p.len() {
            return Err(FlowError::OffsetOutOfRange { offset, len: p.len() });
        }
        p.set_format(offset, format);
        self.invalidate_from(id);
        Ok(())
    }

    /// Remove the override at `offset`, if any
    pub fn clear_format(&mut self, id: ParagraphId, offset: usize) -> Result<()> {
        let p = self.paragraph_mut(id)?;
        if offset >= p.len() {
            return Err(FlowError::OffsetOutOfRange { offset, len: p.len() });
        }
        p.chars[offset].format = None;
        self.invalidate_from(id);
        Ok(())
    }

    /// Point a paragraph at another style sheet entry
    pub fn set_paragraph_style(&mut self, id: ParagraphId, style: usize) -> Result<()> {
        self.paragraph_mut(id)?.style = style;
        self.invalidate_from(id);
        Ok(())
    }

    /// Paragraph style, failing on an index missing from the sheet
    pub fn paragraph_style(&self, id: ParagraphId) -> Result<&ParagraphStyle> {
        let style = self.paragraph(id)?.style;
        self.styles
            .get(style)
            .ok_or(FlowError::MalformedDocument { paragraph: id, style })
    }

    /// Paragraph style, substituting the sheet's fallback on a bad index
    ///
    /// Silent; the layout pass reports the substitution once per paragraph.
    pub fn resolved_style(&self, id: ParagraphId) -> &ParagraphStyle {
        self.paragraph_style(id).unwrap_or_else(|_| self.styles.fallback())
    }

    /// Counter text for a paragraph, numbered within its run
    ///
    /// Deeper counters in between are skipped; a paragraph without a counter,
    /// or a different counter at the same depth, ends the run.
    pub fn counter_label(&self, id: ParagraphId) -> Option<String> {
        let counter = self.resolved_style(id).counter.as_ref()?;
        let mut index = 0u32;
        let mut cursor = self.prev(id);
        while let Some(prev_id) = cursor {
            match &self.resolved_style(prev_id).counter {
                Some(prev) if prev.depth > counter.depth => {}
                Some(prev) if counter.continues(prev) => index += 1,
                _ => break,
            }
            cursor = self.prev(prev_id);
        }
        Some(counter.label(index))
    }

    pub fn markers(&self, id: ParagraphId) -> Option<LayoutMarkers> {
        self.get(id).and_then(|p| p.markers)
    }

    pub(crate) fn set_markers(&mut self, id: ParagraphId, markers: Option<LayoutMarkers>) {
        if let Some(p) = self.get_mut(id) {
            p.markers = markers;
        }
    }

    /// Drop layout markers of `id` and every later paragraph
    pub fn invalidate_from(&mut self, id: ParagraphId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.get_mut(current) {
                Some(p) => {
                    p.markers = None;
                    cursor = p.next;
                }
                None => break,
            }
        }
    }
}

fn check_offset(offset: usize, len: usize) -> Result<()> {
    if offset > len {
        Err(FlowError::OffsetOutOfRange { offset, len })
    } else {
        Ok(())
    }
}

/// Override that restores every attribute `carry` sets to its `base` value
fn reset_override(carry: &StyleOverride, base: &crate::style::TextStyle) -> StyleOverride {
    StyleOverride {
        family: carry.family.as_ref().map(|_| base.family.clone()),
        size: carry.size.map(|_| base.size),
        weight: carry.weight.map(|_| base.weight),
        italic: carry.italic.map(|_| base.italic),
        underline: carry.underline.map(|_| base.underline),
        strikeout: carry.strikeout.map(|_| base.strikeout),
        color: carry.color.map(|_| base.color),
        background: carry.background.map(|_| base.background),
        vertical_align: carry.vertical_align.map(|_| base.vertical_align),
    }
}

/// Iterator over paragraphs in document order
pub struct ParagraphIter<'a> {
    document: &'a Document,
    current: Option<ParagraphId>,
}

impl<'a> Iterator for ParagraphIter<'a> {
    type Item = (ParagraphId, &'a Paragraph);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let paragraph = self.document.get(id)?;
        self.current = paragraph.next;
        Some((id, paragraph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Counter, CounterKind, StyleResolver, CascadeResolver};

    fn texts(doc: &Document) -> Vec<String> {
        doc.iter().map(|(_, p)| p.text()).collect()
    }

    #[test]
    fn test_append_and_order() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("one", 0);
        let b = doc.append_paragraph("two", 0);
        let c = doc.insert_after(a, "between", 0).unwrap();

        assert_eq!(texts(&doc), vec!["one", "between", "two"]);
        assert_eq!(doc.next(a), Some(c));
        assert_eq!(doc.prev(b), Some(c));
        assert_eq!(doc.first(), Some(a));
        assert_eq!(doc.last(), Some(b));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_insert_before_first() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("a", 0);
        let z = doc.insert_before(a, "z", 0).unwrap();
        assert_eq!(doc.first(), Some(z));
        assert_eq!(texts(&doc), vec!["z", "a"]);
    }

    #[test]
    fn test_remove_makes_handle_stale() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("a", 0);
        let b = doc.append_paragraph("b", 0);
        let c = doc.append_paragraph("c", 0);

        doc.remove(b).unwrap();
        assert_eq!(doc.next(a), Some(c));
        assert_eq!(doc.prev(c), Some(a));
        assert!(doc.get(b).is_none());

        // Slot reuse must not revive the old handle
        let d = doc.append_paragraph("d", 0);
        assert_eq!(d.index, b.index);
        assert_ne!(d.generation, b.generation);
        assert!(matches!(doc.paragraph(b), Err(FlowError::UnknownParagraph(_))));
    }

    #[test]
    fn test_split_and_merge() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("hello world", 0);
        let tail = doc.split_paragraph(a, 6).unwrap();
        assert_eq!(texts(&doc), vec!["hello ", "world"]);
        assert_eq!(doc.last(), Some(tail));

        assert!(doc.merge_with_next(a).unwrap());
        assert_eq!(texts(&doc), vec!["hello world"]);
        assert!(!doc.merge_with_next(a).unwrap());
    }

    #[test]
    fn test_split_carries_style() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("abcdef", 0);
        doc.set_format(a, 1, StyleOverride::weight(700)).unwrap();
        let tail = doc.split_paragraph(a, 3).unwrap();

        let base = doc.resolved_style(tail).base.clone();
        let style = CascadeResolver.effective_style(&base, doc.get(tail).unwrap(), 0);
        assert_eq!(style.weight, 700);
    }

    #[test]
    fn test_merge_resets_carried_style() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("bold", 0);
        doc.append_paragraph("plain", 0);
        doc.set_format(a, 0, StyleOverride::weight(700)).unwrap();
        doc.merge_with_next(a).unwrap();

        let p = doc.get(a).unwrap();
        let base = doc.resolved_style(a).base.clone();
        assert_eq!(CascadeResolver.effective_style(&base, p, 2).weight, 700);
        assert_eq!(CascadeResolver.effective_style(&base, p, 5).weight, 400);
    }

    #[test]
    fn test_text_edits() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("held", 0);
        doc.insert_text(a, 3, "lo wor").unwrap();
        assert_eq!(doc.get(a).unwrap().text(), "hello word");
        doc.delete_text(a, 5..10).unwrap();
        assert_eq!(doc.get(a).unwrap().text(), "hello");
        doc.insert_special(a, 5, EmbeddedObject { width: 10.0, height: 30.0 }).unwrap();
        assert_eq!(doc.get(a).unwrap().len(), 6);

        assert!(matches!(
            doc.insert_text(a, 99, "x"),
            Err(FlowError::OffsetOutOfRange { offset: 99, len: 6 })
        ));
    }

    #[test]
    fn test_malformed_style_falls_back() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("text", 42);
        assert!(matches!(
            doc.paragraph_style(a),
            Err(FlowError::MalformedDocument { style: 42, .. })
        ));
        assert_eq!(doc.resolved_style(a).name, "Standard");
    }

    #[test]
    fn test_counter_numbering() {
        let mut sheet = StyleSheet::new();
        let mut list = crate::style::ParagraphStyle::named("List");
        list.counter = Some(Counter::numeric());
        let list = sheet.add(list);
        let mut nested = crate::style::ParagraphStyle::named("Nested");
        let mut inner = Counter::numeric();
        inner.kind = CounterKind::LowerAlpha;
        inner.depth = 1;
        nested.counter = Some(inner);
        let nested = sheet.add(nested);

        let mut doc = Document::new(sheet);
        let first = doc.append_paragraph("one", list);
        let second = doc.append_paragraph("two", list);
        let sub = doc.append_paragraph("two-a", nested);
        let third = doc.append_paragraph("three", list);
        let plain = doc.append_paragraph("break", 0);
        let restart = doc.append_paragraph("again", list);

        assert_eq!(doc.counter_label(first).as_deref(), Some("1. "));
        assert_eq!(doc.counter_label(second).as_deref(), Some("2. "));
        assert_eq!(doc.counter_label(sub).as_deref(), Some("a. "));
        assert_eq!(doc.counter_label(third).as_deref(), Some("3. "));
        assert_eq!(doc.counter_label(plain), None);
        assert_eq!(doc.counter_label(restart).as_deref(), Some("1. "));
    }

    #[test]
    fn test_edit_invalidates_following_markers() {
        let mut doc = Document::new(StyleSheet::new());
        let a = doc.append_paragraph("a", 0);
        let b = doc.append_paragraph("b", 0);
        let markers = LayoutMarkers {
            start_page: 0,
            end_page: 0,
            start_frame: 0,
            end_frame: 0,
            start_y: 0.0,
            end_y: 10.0,
            complete: true,
        };
        doc.set_markers(a, Some(markers));
        doc.set_markers(b, Some(markers));

        doc.insert_text(a, 0, "x").unwrap();
        assert!(doc.markers(a).is_none());
        assert!(doc.markers(b).is_none());
    }
}
