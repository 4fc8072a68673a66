use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::paragraph_type::ParagraphType;
use crate::style::{CharacterStyle, ParagraphStyle, StructuralStyle};

mod content;
mod inspect;

pub(crate) use content::prune_empty_spans;
pub(crate) use inspect::{SpanRun, collect_runs, run_before};
pub use inspect::{Position, StyledRun, style_label};

/// Half-open range `[start, end)` over the flattened document text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn collapsed(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn validate(&self, len: usize) -> Result<()> {
        if self.start > self.end {
            return Err(Error::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > len {
            return Err(Error::RangeOutOfBounds {
                start: self.start,
                end: self.end,
                len,
            });
        }
        Ok(())
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Handle to a span: the paragraph index followed by child indices from the
/// paragraph's top-level spans downwards. Parents are reached by dropping
/// the last index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpanPath {
    paragraph: usize,
    indices: Vec<usize>,
}

impl SpanPath {
    pub fn new(paragraph: usize, indices: Vec<usize>) -> Self {
        Self {
            paragraph,
            indices,
        }
    }

    pub fn top_level(paragraph: usize, index: usize) -> Self {
        Self::new(paragraph, vec![index])
    }

    pub fn paragraph(&self) -> usize {
        self.paragraph
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    /// Index of the span inside its owner's sequence.
    pub fn index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    pub fn parent(&self) -> Option<SpanPath> {
        if self.indices.len() <= 1 {
            return None;
        }
        let mut indices = self.indices.clone();
        indices.pop();
        Some(Self::new(self.paragraph, indices))
    }

    pub fn child(&self, index: usize) -> SpanPath {
        let mut indices = self.indices.clone();
        indices.push(index);
        Self::new(self.paragraph, indices)
    }

    pub fn next_sibling(&self) -> SpanPath {
        let mut indices = self.indices.clone();
        if let Some(last) = indices.last_mut() {
            *last += 1;
        }
        Self::new(self.paragraph, indices)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParagraphKey(u64);

static NEXT_PARAGRAPH_KEY: AtomicU64 = AtomicU64::new(1);

impl ParagraphKey {
    fn next() -> Self {
        ParagraphKey(NEXT_PARAGRAPH_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// A run of text with a character style, a structural style and nested
/// children. The span's full text is its own text followed by the full text
/// of each child.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: CharacterStyle,
    pub structural: StructuralStyle,
    pub children: Vec<Span>,
}

impl Span {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn styled(text: impl Into<String>, style: CharacterStyle) -> Self {
        Self {
            text: text.into(),
            style,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_style(mut self, style: CharacterStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_structural(mut self, structural: StructuralStyle) -> Self {
        self.structural = structural;
        self
    }

    pub fn with_children(mut self, children: Vec<Span>) -> Self {
        self.children = children;
        self
    }

    pub fn own_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn len(&self) -> usize {
        self.own_len() + self.children.iter().map(Span::len).sum::<usize>()
    }

    /// True when neither the span nor any descendant holds text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.children.iter().all(Span::is_empty)
    }

    pub fn full_text(&self) -> String {
        let mut out = String::new();
        self.push_full_text(&mut out);
        out
    }

    fn push_full_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.push_full_text(out);
        }
    }
}

#[derive(Clone, Debug)]
pub struct Paragraph {
    key: ParagraphKey,
    pub paragraph_type: ParagraphType,
    pub style: ParagraphStyle,
    pub spans: Vec<Span>,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

// The key identifies a paragraph instance; it takes no part in equality.
impl PartialEq for Paragraph {
    fn eq(&self, other: &Self) -> bool {
        self.paragraph_type == other.paragraph_type
            && self.style == other.style
            && self.spans == other.spans
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self {
            key: ParagraphKey::next(),
            paragraph_type: ParagraphType::Default,
            style: ParagraphStyle::default(),
            spans: Vec::new(),
        }
    }

    pub fn new_text(text: impl Into<String>) -> Self {
        Self::new().with_spans(vec![Span::new_text(text)])
    }

    pub fn with_spans(mut self, spans: Vec<Span>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_type(mut self, paragraph_type: ParagraphType) -> Self {
        self.paragraph_type = paragraph_type;
        self
    }

    pub fn with_style(mut self, style: ParagraphStyle) -> Self {
        self.style = style;
        self
    }

    pub fn key(&self) -> ParagraphKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(Span::is_empty)
    }

    pub fn is_blank(&self) -> bool {
        self.text().chars().all(char::is_whitespace)
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            span.push_full_text(&mut out);
        }
        out
    }

    /// Paragraph style including the indentation implied by the type.
    pub fn effective_style(&self) -> ParagraphStyle {
        self.paragraph_type.paragraph_style().merge(&self.style)
    }
}

/// Ordered paragraphs. The flattened text joins paragraphs with `'\n'`, so
/// every paragraph boundary occupies one offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paragraphs(mut self, paragraphs: Vec<Paragraph>) -> Self {
        self.paragraphs = paragraphs;
        self
    }

    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn len(&self) -> usize {
        let text: usize = self.paragraphs.iter().map(Paragraph::len).sum();
        text + self.paragraphs.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Makes sure there is a paragraph to put text into.
    pub fn ensure_initialized(&mut self) {
        if self.paragraphs.is_empty() {
            self.paragraphs.push(Paragraph::new());
        }
    }

    /// Offset of the first character of `paragraph`.
    pub fn paragraph_start(&self, paragraph: usize) -> usize {
        self.paragraphs
            .iter()
            .take(paragraph)
            .map(|paragraph| paragraph.len() + 1)
            .sum()
    }

    /// Range covered by a paragraph's text, without its line break.
    pub fn paragraph_range(&self, paragraph: usize) -> Option<TextRange> {
        let len = self.paragraphs.get(paragraph)?.len();
        let start = self.paragraph_start(paragraph);
        Some(TextRange::new(start, start + len))
    }

    /// Maps a document offset to `(paragraph index, offset in paragraph)`.
    /// The offset of a line break belongs to the paragraph it ends.
    pub(crate) fn locate(&self, offset: usize) -> Result<(usize, usize)> {
        let mut start = 0;
        for (idx, paragraph) in self.paragraphs.iter().enumerate() {
            let len = paragraph.len();
            if offset <= start + len {
                return Ok((idx, offset - start));
            }
            start += len + 1;
        }
        Err(Error::RangeOutOfBounds {
            start: offset,
            end: offset,
            len: self.len(),
        })
    }

    pub fn span(&self, path: &SpanPath) -> Option<&Span> {
        let paragraph = self.paragraphs.get(path.paragraph())?;
        let (first, rest) = path.indices().split_first()?;
        let mut span = paragraph.spans.get(*first)?;
        for idx in rest {
            span = span.children.get(*idx)?;
        }
        Some(span)
    }

    pub fn span_mut(&mut self, path: &SpanPath) -> Option<&mut Span> {
        let paragraph = self.paragraphs.get_mut(path.paragraph())?;
        let (first, rest) = path.indices().split_first()?;
        let mut span = paragraph.spans.get_mut(*first)?;
        for idx in rest {
            span = span.children.get_mut(*idx)?;
        }
        Some(span)
    }

    /// The sequence that owns the span at `path`: the paragraph's top-level
    /// spans or the parent's children.
    pub(crate) fn owner_mut(&mut self, path: &SpanPath) -> Option<&mut Vec<Span>> {
        match path.parent() {
            Some(parent) => self.span_mut(&parent).map(|span| &mut span.children),
            None => self
                .paragraphs
                .get_mut(path.paragraph())
                .map(|paragraph| &mut paragraph.spans),
        }
    }
}

#[cfg(test)]
#[path = "document/content_tests.rs"]
mod content_tests;
