use std::mem;

use super::inspect::{collect_runs, run_before};
use super::{Document, Paragraph, Span, SpanPath, TextRange};
use crate::error::Result;

impl Document {
    /// Splits the span at `path` at `at` characters into its full text.
    ///
    /// The left half stays at `path`, the right half becomes its next
    /// sibling. Splitting inside the span's own text moves the remainder and
    /// all children to the right half; splitting inside a child splits that
    /// child first and moves the trailing children. Returns `None` when `at`
    /// lies on either edge of the span, where there is nothing to split.
    pub fn split_span_at(&mut self, path: &SpanPath, at: usize) -> Option<(SpanPath, SpanPath)> {
        let index = path.index()?;
        let right = split_off_span(self.span_mut(path)?, at)?;
        self.owner_mut(path)?.insert(index + 1, right);
        Some((path.clone(), path.next_sibling()))
    }

    /// Deletes the span at `path` if it has no text and no children.
    pub fn remove_empty(&mut self, path: &SpanPath) -> bool {
        let Some(index) = path.index() else {
            return false;
        };
        let Some(owner) = self.owner_mut(path) else {
            return false;
        };
        match owner.get(index) {
            Some(span) if span.text.is_empty() && span.children.is_empty() => {
                owner.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Folds the only child of a span without own text into the span.
    pub fn merge_single_child(&mut self, path: &SpanPath) -> bool {
        self.span_mut(path).is_some_and(absorb_single_child)
    }

    /// Drops empty spans of a paragraph and joins neighbours that carry the
    /// same styles.
    pub fn merge_adjacent(&mut self, paragraph: usize) {
        if let Some(paragraph) = self.paragraphs.get_mut(paragraph) {
            prune_empty_spans(&mut paragraph.spans);
            merge_adjacent_spans(&mut paragraph.spans);
        }
    }

    /// Makes `offset` a boundary between top-level spans of its paragraph.
    /// Returns the paragraph index and the index of the first top-level span
    /// at or after the offset.
    pub(crate) fn split_at_offset(&mut self, offset: usize) -> Result<(usize, usize)> {
        let (paragraph, local) = self.locate(offset)?;
        let index = split_spans_at(&mut self.paragraphs[paragraph].spans, local);
        Ok((paragraph, index))
    }

    /// Inserts text without line breaks, extending the span left of
    /// `offset` (or the first span at a paragraph start).
    pub(crate) fn insert_plain_text(&mut self, offset: usize, text: &str) -> Result<()> {
        let (paragraph, local) = self.locate(offset)?;
        let runs = collect_runs(&self.paragraphs[paragraph]);
        if let Some(run) = run_before(&runs, local) {
            let path = SpanPath::new(paragraph, run.indices.clone());
            let at = local - run.start;
            if let Some(span) = self.span_mut(&path) {
                let byte_idx = char_to_byte_idx(&span.text, at);
                span.text.insert_str(byte_idx, text);
            }
            return Ok(());
        }
        let spans = &mut self.paragraphs[paragraph].spans;
        let index = split_spans_at(spans, local);
        spans.insert(index, Span::new_text(text));
        Ok(())
    }

    /// Inserts a ready-made span as a new top-level span at `offset`.
    pub(crate) fn insert_span(&mut self, offset: usize, span: Span) -> Result<()> {
        let (paragraph, index) = self.split_at_offset(offset)?;
        self.paragraphs[paragraph].spans.insert(index, span);
        Ok(())
    }

    /// Breaks the paragraph containing `offset` in two. The new paragraph
    /// keeps the paragraph style and continues a list.
    pub(crate) fn split_paragraph(&mut self, offset: usize) -> Result<usize> {
        let (index, boundary) = self.split_at_offset(offset)?;
        let paragraph = &mut self.paragraphs[index];
        let trailing = paragraph.spans.split_off(boundary);
        let next = Paragraph::new()
            .with_type(paragraph.paragraph_type.next_variant())
            .with_style(paragraph.style)
            .with_spans(trailing);
        prune_empty_spans(&mut paragraph.spans);
        self.paragraphs.insert(index + 1, next);
        Ok(index + 1)
    }

    /// Removes the text in `range`. Removing a line break joins the two
    /// paragraphs; the first one keeps its type and style.
    pub(crate) fn delete_text(&mut self, range: TextRange) -> Result<()> {
        range.validate(self.len())?;
        if range.is_collapsed() {
            return Ok(());
        }
        let (first, start) = self.split_at_offset(range.start)?;
        let (last, end) = self.split_at_offset(range.end)?;
        if first == last {
            self.paragraphs[first].spans.drain(start..end);
        } else {
            let tail = self.paragraphs[last].spans.split_off(end);
            self.paragraphs.drain(first + 1..=last);
            let paragraph = &mut self.paragraphs[first];
            paragraph.spans.truncate(start);
            paragraph.spans.extend(tail);
        }
        self.merge_adjacent(first);
        Ok(())
    }
}

/// Cuts `span` at `at` and returns the right half.
fn split_off_span(span: &mut Span, at: usize) -> Option<Span> {
    if at == 0 || at >= span.len() {
        return None;
    }
    let own_len = span.own_len();
    if at < own_len {
        let (left, right) = split_text(&span.text, at);
        span.text = left;
        return Some(Span {
            text: right,
            style: span.style.clone(),
            structural: span.structural.clone(),
            children: mem::take(&mut span.children),
        });
    }

    let mut cursor = own_len;
    let mut boundary = span.children.len();
    let mut inner = None;
    for (idx, child) in span.children.iter().enumerate() {
        if at == cursor {
            boundary = idx;
            break;
        }
        let child_len = child.len();
        if at < cursor + child_len {
            inner = Some((idx, at - cursor));
            break;
        }
        cursor += child_len;
    }
    if let Some((idx, local)) = inner {
        if let Some(right) = split_off_span(&mut span.children[idx], local) {
            span.children.insert(idx + 1, right);
        }
        boundary = idx + 1;
    }

    Some(Span {
        text: String::new(),
        style: span.style.clone(),
        structural: span.structural.clone(),
        children: span.children.split_off(boundary),
    })
}

/// Splits a span sequence at `local` characters and returns the index of
/// the first span after the boundary.
pub(crate) fn split_spans_at(spans: &mut Vec<Span>, local: usize) -> usize {
    let mut cursor = 0;
    for idx in 0..spans.len() {
        if local == cursor {
            return idx;
        }
        let len = spans[idx].len();
        if local < cursor + len {
            if let Some(right) = split_off_span(&mut spans[idx], local - cursor) {
                spans.insert(idx + 1, right);
            }
            return idx + 1;
        }
        cursor += len;
    }
    spans.len()
}

pub(crate) fn absorb_single_child(span: &mut Span) -> bool {
    if !span.text.is_empty() || span.children.len() != 1 {
        return false;
    }
    let Some(child) = span.children.pop() else {
        return false;
    };
    span.text = child.text;
    span.style = span.style.merge(&child.style);
    if !child.structural.is_default() {
        span.structural = child.structural;
    }
    span.children = child.children;
    true
}

pub(crate) fn prune_empty_spans(spans: &mut Vec<Span>) {
    spans.retain_mut(|span| {
        prune_empty_spans(&mut span.children);
        !(span.text.is_empty() && span.children.is_empty())
    });
}

pub(crate) fn merge_adjacent_spans(spans: &mut Vec<Span>) {
    for span in spans.iter_mut() {
        merge_adjacent_spans(&mut span.children);
    }
    let mut i = 0;
    while i + 1 < spans.len() {
        if can_merge_spans(&spans[i], &spans[i + 1]) {
            let right = spans.remove(i + 1);
            let left = &mut spans[i];
            left.text.push_str(&right.text);
            left.children = right.children;
        } else {
            i += 1;
        }
    }
}

fn can_merge_spans(left: &Span, right: &Span) -> bool {
    left.style == right.style && left.structural == right.structural && left.children.is_empty()
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub(crate) fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    (text[..byte_idx].to_string(), text[byte_idx..].to_string())
}
