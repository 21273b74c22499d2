//! Character and paragraph styles
//!
//! A paragraph carries an index into the document's [`StyleSheet`]. Characters
//! may carry a [`StyleOverride`] that changes some attributes from that
//! character onward. The [`StyleResolver`] folds overrides onto the base style.

use crate::document::Paragraph;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Vertical alignment of a run relative to the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerticalAlign {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

/// Fully resolved character style
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextStyle {
    /// Font family name
    pub family: String,
    /// Font size in points (treated as pixels by the layout)
    pub size: f32,
    /// CSS-like weight (400 = normal, 700 = bold)
    pub weight: u16,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub color: Color,
    pub background: Color,
    pub vertical_align: VerticalAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: String::from("Sans"),
            size: 12.0,
            weight: 400,
            italic: false,
            underline: false,
            strikeout: false,
            color: Color::BLACK,
            background: Color::TRANSPARENT,
            vertical_align: VerticalAlign::Normal,
        }
    }
}

impl TextStyle {
    /// Size actually used for glyph metrics (super/subscript shrink)
    pub fn effective_size(&self) -> f32 {
        match self.vertical_align {
            VerticalAlign::Normal => self.size,
            VerticalAlign::Superscript | VerticalAlign::Subscript => self.size * 2.0 / 3.0,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// Partial style change attached to a character
///
/// Every `None` attribute leaves the style in effect untouched.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleOverride {
    pub family: Option<String>,
    pub size: Option<f32>,
    pub weight: Option<u16>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikeout: Option<bool>,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub vertical_align: Option<VerticalAlign>,
}

impl StyleOverride {
    pub fn size(size: f32) -> Self {
        Self { size: Some(size), ..Default::default() }
    }

    pub fn weight(weight: u16) -> Self {
        Self { weight: Some(weight), ..Default::default() }
    }

    pub fn vertical_align(align: VerticalAlign) -> Self {
        Self { vertical_align: Some(align), ..Default::default() }
    }

    /// Merge `other` on top of `self` (attributes set in `other` win)
    pub fn merged(&self, other: &StyleOverride) -> StyleOverride {
        StyleOverride {
            family: other.family.clone().or_else(|| self.family.clone()),
            size: other.size.or(self.size),
            weight: other.weight.or(self.weight),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
            strikeout: other.strikeout.or(self.strikeout),
            color: other.color.or(self.color),
            background: other.background.or(self.background),
            vertical_align: other.vertical_align.or(self.vertical_align),
        }
    }

    /// Apply to a resolved style
    pub fn apply_to(&self, style: &mut TextStyle) {
        if let Some(family) = &self.family {
            style.family.clone_from(family);
        }
        if let Some(size) = self.size {
            style.size = size;
        }
        if let Some(weight) = self.weight {
            style.weight = weight;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.underline = underline;
        }
        if let Some(strikeout) = self.strikeout {
            style.strikeout = strikeout;
        }
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(background) = self.background {
            style.background = background;
        }
        if let Some(align) = self.vertical_align {
            style.vertical_align = align;
        }
    }
}

/// Horizontal alignment of a paragraph's lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Counter numbering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CounterKind {
    Numeric,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
    Bullet(char),
}

/// Counter or bullet drawn before a paragraph's first line
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counter {
    pub kind: CounterKind,
    /// First number of a run of numbered paragraphs
    pub start: u32,
    /// Text before the number, e.g. `(`
    pub left_text: String,
    /// Text after the number, e.g. `.`
    pub right_text: String,
    /// Nesting depth; numbering only continues across equal depths
    pub depth: u8,
    /// Minimum reserved width, so labels of a list line up
    pub placeholder_width: f32,
}

impl Counter {
    pub fn numeric() -> Self {
        Self {
            kind: CounterKind::Numeric,
            start: 1,
            left_text: String::new(),
            right_text: String::from(". "),
            depth: 0,
            placeholder_width: 0.0,
        }
    }

    pub fn bullet(symbol: char) -> Self {
        Self {
            kind: CounterKind::Bullet(symbol),
            start: 1,
            left_text: String::new(),
            right_text: String::from(" "),
            depth: 0,
            placeholder_width: 0.0,
        }
    }

    /// Whether `other` continues this counter's numbering
    pub fn continues(&self, other: &Counter) -> bool {
        self.kind == other.kind && self.depth == other.depth
    }

    /// Rendered label for the `index`-th paragraph of a run (0-based)
    pub fn label(&self, index: u32) -> String {
        let n = self.start.saturating_add(index);
        let body = match self.kind {
            CounterKind::Numeric => n.to_string(),
            CounterKind::LowerAlpha => alpha(n, b'a'),
            CounterKind::UpperAlpha => alpha(n, b'A'),
            CounterKind::LowerRoman => roman(n).to_lowercase(),
            CounterKind::UpperRoman => roman(n),
            CounterKind::Bullet(symbol) => symbol.to_string(),
        };
        format!("{}{}{}", self.left_text, body, self.right_text)
    }
}

/// Spreadsheet-style letters: 1 = a, 26 = z, 27 = aa
fn alpha(mut n: u32, base: u8) -> String {
    if n == 0 {
        return String::from("0");
    }
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push((base + (n % 26) as u8) as char);
        n /= 26;
    }
    out.iter().rev().collect()
}

fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if n == 0 {
        return String::from("0");
    }
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

/// Paragraph-level layout attributes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParagraphStyle {
    pub name: String,
    /// Character style before any override
    pub base: TextStyle,
    pub alignment: Alignment,
    pub left_indent: f32,
    pub right_indent: f32,
    /// Extra indent added on the first line only
    pub first_line_indent: f32,
    /// Added below every line
    pub line_spacing: f32,
    /// Added above the first line
    pub head_offset: f32,
    /// Added below the last line
    pub foot_offset: f32,
    pub counter: Option<Counter>,
    /// Start the paragraph in a fresh frame
    pub page_break_before: bool,
    /// Start the following paragraph in a fresh frame
    pub page_break_after: bool,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            name: String::from("Standard"),
            base: TextStyle::default(),
            alignment: Alignment::Left,
            left_indent: 0.0,
            right_indent: 0.0,
            first_line_indent: 0.0,
            line_spacing: 0.0,
            head_offset: 0.0,
            foot_offset: 0.0,
            counter: None,
            page_break_before: false,
            page_break_after: false,
        }
    }
}

impl ParagraphStyle {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

/// Ordered set of paragraph styles referenced by index
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleSheet {
    styles: Vec<ParagraphStyle>,
    /// Substituted when a paragraph references a missing style
    fallback: ParagraphStyle,
}

impl StyleSheet {
    /// Sheet holding only the default "Standard" style at index 0
    pub fn new() -> Self {
        Self {
            styles: vec![ParagraphStyle::default()],
            fallback: ParagraphStyle::default(),
        }
    }

    /// Add a style and return its index
    pub fn add(&mut self, style: ParagraphStyle) -> usize {
        self.styles.push(style);
        self.styles.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ParagraphStyle> {
        self.styles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ParagraphStyle> {
        self.styles.get_mut(index)
    }

    /// Index of the first style with this name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.styles.iter().position(|s| s.name == name)
    }

    pub fn fallback(&self) -> &ParagraphStyle {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// Resolves the character style in effect at a text offset
pub trait StyleResolver {
    /// Style in effect at `offset`: `base` folded with every override at or before it
    fn effective_style(&self, base: &TextStyle, paragraph: &Paragraph, offset: usize) -> TextStyle {
        let mut style = base.clone();
        for ch in paragraph.chars().iter().take(offset.saturating_add(1)) {
            if let Some(format) = &ch.format {
                style = self.apply(&style, format);
            }
        }
        style
    }

    /// Apply one override to the style in effect
    fn apply(&self, current: &TextStyle, format: &StyleOverride) -> TextStyle {
        let mut style = current.clone();
        format.apply_to(&mut style);
        style
    }
}

/// Left-to-right override cascade
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeResolver;

impl StyleResolver for CascadeResolver {}
