//! Markdown decoding and encoding.
//!
//! Decoding walks the pulldown-cmark event stream. Source lines map to
//! paragraphs: the line breaks between the end of the previous content and
//! the start of the next block become paragraph boundaries, so blank lines
//! survive as empty paragraphs.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::html::tokens::{MarkupToken, tokenize_fragment};
use super::{Codec, Decoded, tag_style};
use crate::config::RichTextConfig;
use crate::document::{Document, Paragraph, Span, SpanPath, StyledRun};
use crate::error::DecodeIssue;
use crate::paragraph_type::ParagraphType;
use crate::style::{CharacterStyle, StructuralStyle};

#[derive(Clone, Debug, Default)]
pub struct MarkdownCodec {
    config: RichTextConfig,
}

impl MarkdownCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RichTextConfig) -> Self {
        Self { config }
    }
}

impl Codec for MarkdownCodec {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn decode(&self, input: &str) -> Decoded {
        let mut decoder = Decoder::new(input, &self.config);
        for (event, range) in Parser::new_ext(input, Options::ENABLE_STRIKETHROUGH).into_offset_iter()
        {
            tracing::trace!(target: "richdoc::markdown", ?event, ?range, "event");
            decoder.event(event, range);
        }
        decoder.finish()
    }

    fn encode(&self, document: &Document) -> String {
        encode_document(document)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Block {
    Inline,
    Code,
    Html,
}

struct Decoder<'a> {
    source: &'a str,
    config: &'a RichTextConfig,
    document: Document,
    current: Option<SpanPath>,
    /// One entry per open node; `Some` when the node opened a span.
    frames: Vec<Option<SpanPath>>,
    /// Type of the next item of each open list.
    lists: Vec<ParagraphType>,
    html_spans: Vec<(String, Option<SpanPath>)>,
    /// Byte offset where the last consumed content ended.
    last_end: usize,
    block: Block,
    html_lines: usize,
    code_break: bool,
    issues: Vec<DecodeIssue>,
}

impl<'a> Decoder<'a> {
    fn new(source: &'a str, config: &'a RichTextConfig) -> Self {
        let mut document = Document::new();
        document.ensure_initialized();
        Self {
            source,
            config,
            document,
            current: None,
            frames: Vec::new(),
            lists: Vec::new(),
            html_spans: Vec::new(),
            last_end: 0,
            block: Block::Inline,
            html_lines: 0,
            code_break: false,
            issues: Vec::new(),
        }
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range.start),
            Event::End(tag) => {
                self.end(tag);
                self.advance(range.end);
            }
            Event::Text(text) => {
                if self.block == Block::Code {
                    self.code_text(&text);
                } else {
                    self.append_text(&text);
                }
                self.advance(range.end);
            }
            Event::Code(code) => {
                self.attach(Span::new_text(code.to_string()).with_structural(StructuralStyle::Code));
                self.advance(range.end);
            }
            Event::InlineHtml(html) => {
                self.inline_html(&html);
                self.advance(range.end);
            }
            Event::Html(html) => {
                self.html_block(&html);
                self.advance(range.end);
            }
            Event::SoftBreak | Event::HardBreak => {
                self.line_break();
                self.last_end = self.last_end.max(range.end);
            }
            Event::Rule => {
                self.block_start(range.start);
                self.unsupported("hr");
                self.advance(range.end);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>, start: usize) {
        let opened = match tag {
            Tag::Paragraph => {
                self.block_start(start);
                None
            }
            Tag::Heading { level, .. } => {
                self.block_start(start);
                Some(self.open_span(
                    CharacterStyle::heading(level as u8),
                    StructuralStyle::Default,
                ))
            }
            Tag::List(first) => {
                self.block_start(start);
                let item = match first {
                    Some(number) => ParagraphType::ordered_with(
                        u32::try_from(number).unwrap_or(u32::MAX),
                        self.config,
                    ),
                    None => ParagraphType::unordered_with(self.config),
                };
                self.lists.push(item);
                None
            }
            Tag::Item => {
                self.block_start(start);
                self.start_item(start);
                None
            }
            Tag::CodeBlock(_) => {
                self.block_start(start);
                self.block = Block::Code;
                self.code_break = false;
                self.unsupported("pre");
                None
            }
            Tag::HtmlBlock => {
                self.block_start(start);
                self.block = Block::Html;
                self.html_lines = 0;
                None
            }
            Tag::BlockQuote { .. } => {
                self.block_start(start);
                self.unsupported("blockquote");
                None
            }
            Tag::Emphasis => Some(self.open_span(CharacterStyle::italic(), StructuralStyle::Default)),
            Tag::Strong => Some(self.open_span(CharacterStyle::bold(), StructuralStyle::Default)),
            Tag::Strikethrough => Some(self.open_span(
                CharacterStyle::strikethrough(),
                StructuralStyle::Default,
            )),
            Tag::Link { dest_url, .. } => Some(self.open_span(
                CharacterStyle::default(),
                StructuralStyle::link(dest_url.to_string()),
            )),
            Tag::Image { .. } => {
                self.unsupported("img");
                None
            }
            other => {
                tracing::debug!(target: "richdoc::markdown", tag = ?other, "unsupported node");
                None
            }
        };
        self.frames.push(opened);
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::List(_) => {
                self.lists.pop();
            }
            TagEnd::CodeBlock | TagEnd::HtmlBlock => self.block = Block::Inline,
            _ => {}
        }
        if let Some(Some(path)) = self.frames.pop() {
            self.close_span(path);
        }
    }

    fn finish(mut self) -> Decoded {
        let trailing = self
            .source
            .get(self.last_end..)
            .map_or(0, |rest| rest.matches('\n').count());
        for _ in 0..trailing {
            self.document.add_paragraph(Paragraph::new());
        }
        for issue in &self.issues {
            tracing::debug!(target: "richdoc::markdown", %issue, "recovered");
        }
        Decoded {
            document: self.document,
            issues: self.issues,
        }
    }

    /// Moves past content ending at `end`. Trailing line breaks stay
    /// unconsumed so the next block can count them.
    fn advance(&mut self, end: usize) {
        let end = self
            .source
            .get(..end)
            .map_or(end, |consumed| consumed.trim_end_matches(['\n', '\r']).len());
        self.last_end = self.last_end.max(end);
    }

    /// Every line break between the previous content and `start` begins a
    /// new paragraph.
    fn block_start(&mut self, start: usize) {
        let breaks = self
            .source
            .get(self.last_end..start)
            .map_or(0, |gap| gap.matches('\n').count());
        for _ in 0..breaks {
            self.document.add_paragraph(Paragraph::new());
        }
        self.last_end = self.last_end.max(start);
        self.current = None;
    }

    /// Ordered items take the number written in their own marker.
    fn start_item(&mut self, start: usize) {
        let Some(next) = self.lists.last_mut() else {
            return;
        };
        let mut item = next.clone();
        if let ParagraphType::OrderedList(list) = &mut item {
            if let Some(number) = self.source.get(start..).and_then(marker_number) {
                list.number = number;
            }
        }
        *next = item.next_variant();
        if let Some(paragraph) = self.document.paragraphs.last_mut() {
            paragraph.paragraph_type = item;
        }
    }

    fn line_break(&mut self) {
        let style = self
            .document
            .paragraphs
            .last()
            .map(|paragraph| paragraph.style)
            .unwrap_or_default();
        self.document.add_paragraph(Paragraph::new().with_style(style));
        self.current = None;
    }

    /// A `<br>` typed at the start of an empty line keeps that line.
    fn html_break(&mut self) {
        let paragraphs = &self.document.paragraphs;
        let last_empty = paragraphs.last().is_some_and(Paragraph::is_empty);
        let before_last_empty = paragraphs.len() >= 2 && paragraphs[paragraphs.len() - 2].is_empty();
        if last_empty && !before_last_empty {
            self.line_break();
        }
        self.line_break();
    }

    fn append_text(&mut self, text: &str) {
        if let Some(path) = self.current.clone() {
            if let Some(span) = self.document.span_mut(&path) {
                if span.children.is_empty() {
                    span.text.push_str(text);
                } else {
                    span.children.push(Span::new_text(text));
                }
                return;
            }
        }
        let path = self.push_top_level(Span::new_text(text));
        self.current = Some(path);
    }

    fn code_text(&mut self, text: &str) {
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                if self.code_break {
                    self.line_break();
                }
                self.code_break = true;
            }
            if !line.is_empty() {
                if self.code_break {
                    self.line_break();
                    self.code_break = false;
                }
                self.append_text(line);
            }
        }
    }

    fn inline_html(&mut self, html: &str) {
        for token in tokenize_fragment(html) {
            match token {
                MarkupToken::Open { name, .. } if name == "br" => self.html_break(),
                MarkupToken::Open { name, .. } => {
                    let opened = match tag_style(&name) {
                        Some(style) => Some(self.open_span(style, StructuralStyle::Default)),
                        None => {
                            self.unsupported(&name);
                            None
                        }
                    };
                    self.html_spans.push((name, opened));
                }
                MarkupToken::Close(name) => self.close_html(&name),
                MarkupToken::Text(text) => self.append_text(&text),
            }
        }
    }

    /// Closes the innermost inline element called `name` and everything
    /// opened after it.
    fn close_html(&mut self, name: &str) {
        let Some(position) = self.html_spans.iter().rposition(|(open, _)| open == name) else {
            return;
        };
        for (_, path) in self.html_spans.split_off(position).into_iter().rev() {
            if let Some(path) = path {
                self.close_span(path);
            }
        }
    }

    /// Raw HTML blocks keep their line structure. Tags are dropped; a line
    /// holding a single `<br>` is an empty line.
    fn html_block(&mut self, html: &str) {
        for line in html.lines() {
            if self.html_lines > 0 {
                self.line_break();
            }
            self.html_lines += 1;

            let tokens = tokenize_fragment(line.trim());
            if let [MarkupToken::Open { name, .. }, MarkupToken::Close(_)] = tokens.as_slice() {
                if name == "br" {
                    continue;
                }
            }
            for token in tokens {
                match token {
                    MarkupToken::Text(text) => self.append_text(&text),
                    MarkupToken::Open { name, .. } if name == "br" => self.line_break(),
                    MarkupToken::Open { name, .. } => self.unsupported(&name),
                    MarkupToken::Close(_) => {}
                }
            }
        }
    }

    /// Adds `span` under the current span without making it current.
    fn attach(&mut self, span: Span) -> SpanPath {
        match self.current.clone() {
            Some(parent_path) => match self.document.span_mut(&parent_path) {
                Some(parent) => {
                    parent.children.push(span);
                    parent_path.child(parent.children.len() - 1)
                }
                None => self.push_top_level(span),
            },
            None => self.push_top_level(span),
        }
    }

    fn open_span(&mut self, style: CharacterStyle, structural: StructuralStyle) -> SpanPath {
        let path = self.attach(Span::new().with_style(style).with_structural(structural));
        self.current = Some(path.clone());
        path
    }

    fn close_span(&mut self, path: SpanPath) {
        if self.document.span(&path).is_some_and(Span::is_empty) {
            if let (Some(index), Some(owner)) = (path.index(), self.document.owner_mut(&path)) {
                if index < owner.len() {
                    owner.remove(index);
                }
            }
        } else {
            self.document.merge_single_child(&path);
        }
        let in_last_paragraph = path.paragraph() + 1 == self.document.paragraphs.len();
        self.current = path.parent().filter(|_| in_last_paragraph);
    }

    fn push_top_level(&mut self, span: Span) -> SpanPath {
        self.document.ensure_initialized();
        let paragraph = self.document.paragraphs.len() - 1;
        let spans = &mut self.document.paragraphs[paragraph].spans;
        spans.push(span);
        SpanPath::top_level(paragraph, spans.len() - 1)
    }

    fn unsupported(&mut self, element: &str) {
        tracing::debug!(target: "richdoc::markdown", element, "unsupported element");
        self.issues
            .push(DecodeIssue::UnsupportedElement(element.to_string()));
    }
}

/// Number of an ordered item marker such as `3.` or `3)`.
fn marker_number(item: &str) -> Option<u32> {
    let digits: String = item
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Minimum size in em of each heading level.
const HEADING_LADDER: [f32; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];

/// Characters that always need a backslash in Markdown text.
const ESCAPED: &[char] = &['\\', '*', '_', '~', '`', '[', ']', '<'];

/// Characters that start a block construct at the beginning of a line.
const LINE_START: &[char] = &['#', '-', '+', '>', '='];

fn encode_document(document: &Document) -> String {
    let mut lines = Vec::with_capacity(document.paragraphs.len());
    let mut previous_blank = false;
    for paragraph in &document.paragraphs {
        let blank = paragraph.is_empty() && !paragraph.paragraph_type.is_list();
        if blank {
            lines.push(if previous_blank {
                "<br>".to_string()
            } else {
                String::new()
            });
        } else {
            lines.push(encode_paragraph(paragraph));
        }
        previous_blank = blank;
    }
    lines.join("\n")
}

fn encode_paragraph(paragraph: &Paragraph) -> String {
    let mut out = match &paragraph.paragraph_type {
        ParagraphType::OrderedList(list) => format!("{}. ", list.number),
        ParagraphType::UnorderedList(_) => "- ".to_string(),
        ParagraphType::Default => String::new(),
    };

    let mut runs = paragraph.styled_runs();
    if let Some(level) = runs.first().and_then(|run| heading_rank(&run.style)) {
        out.push_str(&"#".repeat(level));
        out.push(' ');
        let heading = CharacterStyle::heading(level as u8);
        for run in &mut runs {
            run.style = run.style.unmerge(&heading);
        }
    }
    out.push_str(&encode_runs(&runs));
    out
}

/// Heading level of a bold run, picked by the largest ladder step its font
/// size reaches.
fn heading_rank(style: &CharacterStyle) -> Option<usize> {
    if !style.is_bold() {
        return None;
    }
    let size = style.font_size?.as_em();
    HEADING_LADDER
        .iter()
        .position(|step| size >= *step)
        .map(|index| index + 1)
}

fn encode_runs(runs: &[StyledRun]) -> String {
    let mut writer = InlineWriter::default();
    let mut index = 0;
    while index < runs.len() {
        let run = &runs[index];
        match &run.structural {
            StructuralStyle::Link { url } => {
                let end = runs[index..]
                    .iter()
                    .position(|other| other.structural != run.structural)
                    .map_or(runs.len(), |len| index + len);
                writer.link(&runs[index..end], url);
                index = end;
            }
            StructuralStyle::Code => {
                writer.code(&run.text, &markers(&run.style));
                index += 1;
            }
            StructuralStyle::Default => {
                writer.text(&run.text, &markers(&run.style));
                index += 1;
            }
        }
    }
    writer.finish()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
    Bold,
    Italic,
    Strike,
    Underline,
}

impl Marker {
    const ALL: [Marker; 4] = [
        Marker::Bold,
        Marker::Italic,
        Marker::Strike,
        Marker::Underline,
    ];

    fn open(self) -> &'static str {
        match self {
            Marker::Bold => "**",
            Marker::Italic => "*",
            Marker::Strike => "~~",
            Marker::Underline => "<u>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Marker::Underline => "</u>",
            other => other.open(),
        }
    }

    fn applies(self, style: &CharacterStyle) -> bool {
        match self {
            Marker::Bold => style.is_bold(),
            Marker::Italic => style.is_italic(),
            Marker::Strike => style.is_struck_through(),
            Marker::Underline => style.is_underlined(),
        }
    }
}

fn markers(style: &CharacterStyle) -> Vec<Marker> {
    Marker::ALL
        .into_iter()
        .filter(|marker| marker.applies(style))
        .collect()
}

/// Writes inline text, opening and closing emphasis markers as the wanted
/// set changes. Markers never hug whitespace: it is moved outside them.
#[derive(Default)]
struct InlineWriter {
    out: String,
    open: Vec<Marker>,
    /// Link text; block markers cannot start here.
    nested: bool,
}

impl InlineWriter {
    fn text(&mut self, text: &str, wanted: &[Marker]) {
        self.close_unwanted(wanted);
        let body = text.trim_start();
        self.out.push_str(&text[..text.len() - body.len()]);
        if body.is_empty() {
            return;
        }
        self.open_missing(wanted);
        let at_line_start = !self.nested && self.out.is_empty();
        self.out.push_str(&escape_text(body, at_line_start));
    }

    fn code(&mut self, text: &str, wanted: &[Marker]) {
        self.close_unwanted(wanted);
        self.open_missing(wanted);
        self.out.push_str(&code_span(text));
    }

    /// Writes consecutive runs sharing one link target. Markers every run
    /// carries go outside the brackets.
    fn link(&mut self, runs: &[StyledRun], url: &str) {
        let outer: Vec<Marker> = Marker::ALL
            .into_iter()
            .filter(|marker| runs.iter().all(|run| marker.applies(&run.style)))
            .collect();
        self.close_unwanted(&outer);
        self.open_missing(&outer);

        let mut inner = InlineWriter {
            nested: true,
            ..InlineWriter::default()
        };
        for run in runs {
            let wanted: Vec<Marker> = markers(&run.style)
                .into_iter()
                .filter(|marker| !outer.contains(marker))
                .collect();
            inner.text(&run.text, &wanted);
        }

        self.out.push('[');
        self.out.push_str(&inner.finish());
        self.out.push_str("](");
        self.out.push_str(&link_destination(url));
        self.out.push(')');
    }

    fn close_unwanted(&mut self, wanted: &[Marker]) {
        let Some(first) = self.open.iter().position(|marker| !wanted.contains(marker)) else {
            return;
        };
        let trailing = self.out.split_off(self.out.trim_end().len());
        for marker in self.open.drain(first..).rev() {
            self.out.push_str(marker.close());
        }
        self.out.push_str(&trailing);
    }

    fn open_missing(&mut self, wanted: &[Marker]) {
        for marker in Marker::ALL {
            if wanted.contains(&marker) && !self.open.contains(&marker) {
                self.out.push_str(marker.open());
                self.open.push(marker);
            }
        }
    }

    fn finish(mut self) -> String {
        self.close_unwanted(&[]);
        self.out
    }
}

fn escape_text(text: &str, at_line_start: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let digits = chars.iter().take_while(|ch| ch.is_ascii_digit()).count();
    let mut out = String::with_capacity(text.len() + 4);
    for (idx, &ch) in chars.iter().enumerate() {
        let block_marker = at_line_start
            && ((idx == 0 && LINE_START.contains(&ch))
                || (digits > 0 && idx == digits && matches!(ch, '.' | ')')));
        let entity = ch == '&'
            && chars
                .get(idx + 1)
                .is_some_and(|next| next.is_ascii_alphanumeric() || *next == '#');
        if block_marker || entity || ESCAPED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn code_span(text: &str) -> String {
    let longest = text
        .split(|ch: char| ch != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest + 1);
    let padded = longest > 0
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if padded {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn link_destination(url: &str) -> String {
    if url.is_empty() || url.contains(|ch: char| ch.is_whitespace() || ch == '(' || ch == ')') {
        format!("<{}>", url.replace('<', "\\<").replace('>', "\\>"))
    } else {
        url.to_string()
    }
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod markdown_tests;
