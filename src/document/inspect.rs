use std::fmt::Write as _;

use super::{Document, Paragraph, Span, SpanPath, TextRange};
use crate::error::Result;
use crate::paragraph_type::ParagraphType;
use crate::style::{CharacterStyle, StructuralStyle};

/// Where a document offset lands in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub paragraph: usize,
    /// Deepest span whose own text holds the offset; `None` in a paragraph
    /// without text.
    pub span: Option<SpanPath>,
    /// Offset inside the span's own text, or inside the paragraph when
    /// there is no span.
    pub offset: usize,
}

/// Text of a paragraph with its effective styles, independent of how the
/// span tree is shaped.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: CharacterStyle,
    pub structural: StructuralStyle,
}

/// Own text of one span, positioned inside its paragraph, with the styles
/// it inherits from its ancestors applied.
#[derive(Clone, Debug)]
pub(crate) struct SpanRun {
    pub indices: Vec<usize>,
    pub start: usize,
    pub end: usize,
    pub style: CharacterStyle,
    pub structural: StructuralStyle,
}

impl SpanRun {
    pub fn has_text(&self) -> bool {
        self.end > self.start
    }
}

/// Runs of every span of a paragraph in pre-order, which is also offset
/// order.
pub(crate) fn collect_runs(paragraph: &Paragraph) -> Vec<SpanRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    let mut indices = Vec::new();
    collect_span_runs(
        &paragraph.spans,
        &mut indices,
        &mut cursor,
        &CharacterStyle::default(),
        &StructuralStyle::Default,
        &mut runs,
    );
    runs
}

fn collect_span_runs(
    spans: &[Span],
    indices: &mut Vec<usize>,
    cursor: &mut usize,
    inherited_style: &CharacterStyle,
    inherited_structural: &StructuralStyle,
    runs: &mut Vec<SpanRun>,
) {
    for (idx, span) in spans.iter().enumerate() {
        indices.push(idx);
        let style = inherited_style.merge(&span.style);
        let structural = if span.structural.is_default() {
            inherited_structural.clone()
        } else {
            span.structural.clone()
        };
        let start = *cursor;
        *cursor += span.own_len();
        runs.push(SpanRun {
            indices: indices.clone(),
            start,
            end: *cursor,
            style: style.clone(),
            structural: structural.clone(),
        });
        collect_span_runs(&span.children, indices, cursor, &style, &structural, runs);
        indices.pop();
    }
}

/// The run holding the character left of `local`. At the start of a
/// paragraph this is the run holding the first character.
pub(crate) fn run_before(runs: &[SpanRun], local: usize) -> Option<&SpanRun> {
    runs.iter()
        .filter(|run| run.has_text())
        .find(|run| run.start < local && local <= run.end)
        .or_else(|| {
            runs.iter()
                .find(|run| run.has_text() && run.start == local)
        })
}

impl Paragraph {
    pub fn styled_runs(&self) -> Vec<StyledRun> {
        let mut merged: Vec<StyledRun> = Vec::new();
        for run in collect_runs(self).into_iter().filter(SpanRun::has_text) {
            let Some(span) = span_at(&self.spans, &run.indices) else {
                continue;
            };
            if let Some(last) = merged.last_mut() {
                if last.style == run.style && last.structural == run.structural {
                    last.text.push_str(&span.text);
                    continue;
                }
            }
            merged.push(StyledRun {
                text: span.text.clone(),
                style: run.style,
                structural: run.structural,
            });
        }
        merged
    }
}

fn span_at<'a>(spans: &'a [Span], indices: &[usize]) -> Option<&'a Span> {
    let (first, rest) = indices.split_first()?;
    let mut span = spans.get(*first)?;
    for idx in rest {
        span = span.children.get(*idx)?;
    }
    Some(span)
}

impl Document {
    /// Resolves an offset to the deepest span holding it. At the end of a
    /// paragraph the last span with text is returned, positioned after its
    /// last character. Offset 0 of a document without paragraphs resolves
    /// to paragraph 0 with no span.
    pub fn resolve(&self, offset: usize) -> Result<Position> {
        if offset == 0 && self.paragraphs.is_empty() {
            return Ok(Position {
                paragraph: 0,
                span: None,
                offset: 0,
            });
        }
        let (paragraph, local) = self.locate(offset)?;
        let runs = collect_runs(&self.paragraphs[paragraph]);
        let mut with_text = runs.iter().filter(|run| run.has_text());
        let containing = with_text
            .clone()
            .find(|run| run.start <= local && local < run.end)
            .or_else(|| with_text.next_back());
        Ok(match containing {
            Some(run) => Position {
                paragraph,
                span: Some(SpanPath::new(paragraph, run.indices.clone())),
                offset: (local - run.start).min(run.end - run.start),
            },
            None => Position {
                paragraph,
                span: None,
                offset: local,
            },
        })
    }

    /// Every span, at any depth, whose text overlaps `range`, in document
    /// order.
    pub fn spans_intersecting(&self, range: TextRange) -> Result<Vec<SpanPath>> {
        range.validate(self.len())?;
        let mut result = Vec::new();
        if range.is_collapsed() {
            return Ok(result);
        }
        let mut start = 0;
        for (idx, paragraph) in self.paragraphs.iter().enumerate() {
            let len = paragraph.len();
            if start >= range.end {
                break;
            }
            if start + len > range.start {
                let mut indices = Vec::new();
                let mut cursor = start;
                collect_intersecting(
                    &paragraph.spans,
                    idx,
                    &mut indices,
                    &mut cursor,
                    range,
                    &mut result,
                );
            }
            start += len + 1;
        }
        Ok(result)
    }

    /// Indented dump of the span tree, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for (idx, paragraph) in self.paragraphs.iter().enumerate() {
            let _ = write!(out, "paragraph {idx}");
            match &paragraph.paragraph_type {
                ParagraphType::Default => {}
                ParagraphType::OrderedList(list) => {
                    let _ = write!(out, " [ordered {}]", list.number);
                }
                ParagraphType::UnorderedList(_) => out.push_str(" [unordered]"),
            }
            out.push('\n');
            for span in &paragraph.spans {
                outline_span(span, 1, &mut out);
            }
        }
        out
    }
}

fn collect_intersecting(
    spans: &[Span],
    paragraph: usize,
    indices: &mut Vec<usize>,
    cursor: &mut usize,
    range: TextRange,
    result: &mut Vec<SpanPath>,
) {
    for (idx, span) in spans.iter().enumerate() {
        let start = *cursor;
        let len = span.len();
        indices.push(idx);
        if len > 0 && start < range.end && start + len > range.start {
            result.push(SpanPath::new(paragraph, indices.clone()));
            let mut child_cursor = start + span.own_len();
            collect_intersecting(
                &span.children,
                paragraph,
                indices,
                &mut child_cursor,
                range,
                result,
            );
        }
        indices.pop();
        *cursor = start + len;
    }
}

fn outline_span(span: &Span, depth: usize, out: &mut String) {
    let _ = write!(out, "{}span {:?}", "  ".repeat(depth), span.text);
    let labels = style_label(&span.style, &span.structural);
    if !labels.is_empty() {
        let _ = write!(out, " {labels}");
    }
    out.push('\n');
    for child in &span.children {
        outline_span(child, depth + 1, out);
    }
}

/// Short human readable description of a span's styles.
pub fn style_label(style: &CharacterStyle, structural: &StructuralStyle) -> String {
    let mut labels: Vec<String> = Vec::new();
    if let Some(level) = style.heading_level() {
        labels.push(format!("H{level}"));
    } else if style.is_bold() {
        labels.push("Bold".to_string());
    }
    if style.is_italic() {
        labels.push("Italic".to_string());
    }
    if style.is_underlined() {
        labels.push("Underline".to_string());
    }
    if style.is_struck_through() {
        labels.push("Strikethrough".to_string());
    }
    if let Some(shift) = style.baseline_shift {
        labels.push(format!("{shift:?}"));
    }
    if style.heading_level().is_none() {
        if let Some(size) = style.font_size {
            labels.push(format!("Size({}em)", size.as_em()));
        }
    }
    if let Some(color) = style.color {
        labels.push(format!("Color(#{:02x}{:02x}{:02x})", color.r, color.g, color.b));
    }
    if let Some(color) = style.background {
        labels.push(format!(
            "Background(#{:02x}{:02x}{:02x})",
            color.r, color.g, color.b
        ));
    }
    match structural {
        StructuralStyle::Default => {}
        StructuralStyle::Link { url } => labels.push(format!("Link({url})")),
        StructuralStyle::Code => labels.push("Code".to_string()),
    }
    labels.join(" ")
}
