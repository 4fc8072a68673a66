//! Terminal preview of a document as styled `ratatui` lines.
//!
//! Every paragraph is word-wrapped to the requested width. List paragraphs
//! get their start marker in front of the first line and a hanging indent on
//! the following ones.

use ratatui::{
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::document::{Document, Paragraph, StyledRun};
use crate::style::{Color, StructuralStyle, TextAlign};

pub fn render_document(document: &Document, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(width.max(1));
    for paragraph in &document.paragraphs {
        renderer.render_paragraph(paragraph);
    }
    renderer.finish()
}

/// Terminal style of a run: weight, slant and decorations become
/// modifiers, colors are kept as RGB.
pub fn run_style(run: &StyledRun) -> Style {
    let mut style = Style::default();
    if run.style.is_bold() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if run.style.is_italic() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if run.style.is_underlined() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if run.style.is_struck_through() {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if let Some(color) = run.style.color {
        style = style.fg(term_color(color));
    }
    if let Some(color) = run.style.background {
        style = style.bg(term_color(color));
    }
    match run.structural {
        StructuralStyle::Link { .. } => style.add_modifier(Modifier::UNDERLINED).fg(TermColor::Blue),
        StructuralStyle::Code => style.add_modifier(Modifier::DIM),
        StructuralStyle::Default => style,
    }
}

fn term_color(color: Color) -> TermColor {
    TermColor::Rgb(color.r, color.g, color.b)
}

struct Renderer {
    wrap_width: usize,
    lines: Vec<Line<'static>>,
}

impl Renderer {
    fn new(wrap_width: usize) -> Self {
        Self {
            wrap_width,
            lines: Vec::new(),
        }
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph) {
        let style = paragraph.effective_style();
        let indent = style.text_indent.unwrap_or_default();
        let first_indent = " ".repeat(indent.first_line.max(0.0) as usize);
        let rest_indent = " ".repeat(indent.rest_line.max(0.0) as usize);

        let mut first_prefix = vec![LineSegment::plain(first_indent)];
        if let Some(marker) = paragraph.paragraph_type.start_marker() {
            let marker_run = StyledRun {
                text: marker.text,
                style: marker.style,
                structural: StructuralStyle::Default,
            };
            first_prefix.push(LineSegment {
                style: run_style(&marker_run),
                text: marker_run.text,
            });
        }
        let rest_prefix = vec![LineSegment::plain(rest_indent)];

        let mut fragments = Vec::new();
        for run in paragraph.styled_runs() {
            tokenize_text(&run.text, run_style(&run), &mut fragments);
        }
        let outputs = wrap_fragments(&fragments, &first_prefix, &rest_prefix, self.wrap_width);
        self.consume_lines(outputs, style.text_align);
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>, align: Option<TextAlign>) {
        for output in outputs {
            let padding = match align {
                Some(TextAlign::Center) => self.wrap_width.saturating_sub(output.width) / 2,
                Some(TextAlign::Right | TextAlign::End) => {
                    self.wrap_width.saturating_sub(output.width)
                }
                _ => 0,
            };
            let mut spans: Vec<Span<'static>> = Vec::with_capacity(output.spans.len() + 1);
            if padding > 0 {
                spans.push(Span::raw(" ".repeat(padding)));
            }
            for segment in output.spans {
                spans.push(Span::styled(segment.text, segment.style));
            }
            self.lines.push(Line::from(spans));
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        self.lines
    }
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

impl LineSegment {
    fn plain(text: String) -> Self {
        Self {
            text,
            style: Style::default(),
        }
    }
}

struct LineOutput {
    spans: Vec<LineSegment>,
    width: usize,
}

#[derive(Clone)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

fn tokenize_text(text: &str, style: Style, fragments: &mut Vec<Fragment>) {
    let mut builder: Option<TokenBuilder> = None;
    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        let expanded = if ch == '\t' { "    ".chars().collect() } else { vec![ch] };
        for actual in expanded {
            let kind = if actual.is_whitespace() {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            };
            match builder.as_mut() {
                Some(current) if current.kind == kind => current.push_char(actual),
                _ => {
                    if let Some(existing) = builder.take() {
                        fragments.push(existing.finish());
                    }
                    let mut fresh = TokenBuilder::new(style, kind);
                    fresh.push_char(actual);
                    builder = Some(fresh);
                }
            }
        }
    }
    if let Some(token) = builder {
        fragments.push(token.finish());
    }
}

struct TokenBuilder {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
}

impl TokenBuilder {
    fn new(style: Style, kind: FragmentKind) -> Self {
        Self {
            text: String::new(),
            style,
            kind,
            width: 0,
        }
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            style: self.style,
            kind: self.kind,
            width: self.width,
        }
    }
}

/// Greedy word wrap. Whitespace is held back until the next word so lines
/// never start with the space that caused the break.
fn wrap_fragments(
    fragments: &[Fragment],
    first_prefix: &[LineSegment],
    continuation_prefix: &[LineSegment],
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment.kind {
            FragmentKind::Whitespace => pending_whitespace.push(fragment.clone()),
            FragmentKind::Word => {
                let whitespace_width: usize =
                    pending_whitespace.iter().map(|item| item.width).sum();
                if builder.width > builder.prefix_width
                    && builder.width + whitespace_width + fragment.width > width
                {
                    pending_whitespace.clear();
                    outputs.push(builder.build_line());
                    builder = LineBuilder::new(continuation_prefix);
                }
                for whitespace in pending_whitespace.drain(..) {
                    builder.append(whitespace);
                }
                builder.append(fragment.clone());
            }
        }
    }

    for whitespace in pending_whitespace.drain(..) {
        builder.append(whitespace);
    }
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    width: usize,
    prefix_len: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &[LineSegment]) -> Self {
        let segments: Vec<LineSegment> = prefix
            .iter()
            .filter(|segment| !segment.text.is_empty())
            .cloned()
            .collect();
        let prefix_width = segments
            .iter()
            .map(|segment| visible_width(&segment.text))
            .sum();
        Self {
            prefix_len: segments.len(),
            segments,
            width: prefix_width,
            prefix_width,
        }
    }

    fn append(&mut self, fragment: Fragment) {
        if fragment.text.is_empty() {
            return;
        }
        self.width += fragment.width;
        let past_prefix = self.segments.len() > self.prefix_len;
        match self.segments.last_mut() {
            Some(last) if past_prefix && last.style == fragment.style => {
                last.text.push_str(&fragment.text);
            }
            _ => self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
            }),
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment::plain(String::new()));
        }
        LineOutput {
            spans: self.segments,
            width: self.width,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Span as DocSpan;
    use crate::paragraph_type::ParagraphType;
    use crate::style::{CharacterStyle, ParagraphStyle};

    fn line_text(line: &Line<'_>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    fn document(paragraphs: Vec<Paragraph>) -> Document {
        Document::new().with_paragraphs(paragraphs)
    }

    #[test]
    fn one_line_per_paragraph() {
        let doc = document(vec![
            Paragraph::new_text("first"),
            Paragraph::new(),
            Paragraph::new_text("third"),
        ]);
        let lines = render_document(&doc, 40);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["first", "", "third"]);
    }

    #[test]
    fn long_paragraphs_wrap_at_word_boundaries() {
        let doc = document(vec![Paragraph::new_text("alpha beta gamma delta")]);
        let lines = render_document(&doc, 11);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn list_items_hang_under_their_marker() {
        let doc = document(vec![
            Paragraph::new_text("one two three").with_type(ParagraphType::ordered(1)),
            Paragraph::new_text("bullet").with_type(ParagraphType::unordered()),
        ]);
        let lines = render_document(&doc, 12);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec![" 1. one two", "    three", "  • bullet"]);
    }

    #[test]
    fn body_text_joins_into_one_span_after_the_marker() {
        let doc = document(vec![
            Paragraph::new_text("one two").with_type(ParagraphType::unordered()),
        ]);
        let lines = render_document(&doc, 40);
        assert_eq!(line_text(&lines[0]), "  • one two");
        let body = lines[0].spans.last().map(|span| span.content.as_ref());
        assert_eq!(body, Some("one two"));
    }

    #[test]
    fn character_styles_map_to_modifiers() {
        let doc = document(vec![Paragraph::new().with_spans(vec![
            DocSpan::styled("bold", CharacterStyle::bold()),
            DocSpan::new_text(" "),
            DocSpan::new_text("link").with_structural(StructuralStyle::link("https://a.example")),
        ])]);
        let lines = render_document(&doc, 40);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content.as_ref(), "bold");
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        let link = spans
            .iter()
            .find(|span| span.content.as_ref() == "link")
            .expect("link span is rendered");
        assert!(link.style.add_modifier.contains(Modifier::UNDERLINED));
        assert_eq!(link.style.fg, Some(TermColor::Blue));
    }

    #[test]
    fn centered_paragraphs_are_padded() {
        let doc = document(vec![
            Paragraph::new_text("mid").with_style(ParagraphStyle::aligned(TextAlign::Center)),
        ]);
        let lines = render_document(&doc, 9);
        assert_eq!(line_text(&lines[0]), "   mid");
    }

    #[test]
    fn empty_document_renders_one_blank_line() {
        let lines = render_document(&Document::new(), 10);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "");
    }
}
