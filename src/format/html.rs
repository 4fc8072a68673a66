//! HTML decoding and encoding.

use super::{Codec, Decoded, HEADING_TAGS, css, tag_style};
use crate::config::RichTextConfig;
use crate::document::{Document, Paragraph, Span, SpanPath, prune_empty_spans};
use crate::error::DecodeIssue;
use crate::paragraph_type::ParagraphType;
use crate::style::{
    BaselineShift, CharacterStyle, Color, FontSize, FontWeight, StructuralStyle,
};

pub(crate) mod tokens;

use tokens::{MarkupToken, tokenize};

pub(crate) const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "canvas",
    "dd",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "li",
    "main",
    "nav",
    "noscript",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tfoot",
    "ul",
    "video",
];

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text is never document content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "meta", "title", "style", "script", "noscript", "link", "base", "template",
];

/// Elements that only wrap the document and carry no formatting.
const TRANSPARENT_ELEMENTS: &[&str] = &["html", "body"];

#[derive(Clone, Debug, Default)]
pub struct HtmlCodec {
    config: RichTextConfig,
}

impl HtmlCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RichTextConfig) -> Self {
        Self { config }
    }
}

impl Codec for HtmlCodec {
    fn name(&self) -> &'static str {
        "html"
    }

    fn decode(&self, input: &str) -> Decoded {
        let mut issues = Vec::new();
        let tokens = tokenize(input, &mut issues);
        let mut decoder = Decoder::new(&self.config, issues);
        for token in tokens {
            match token {
                MarkupToken::Open { name, attributes } => decoder.open(name, attributes),
                MarkupToken::Close(name) => decoder.close(&name),
                MarkupToken::Text(text) => decoder.text(&text),
            }
        }
        decoder.finish()
    }

    fn encode(&self, document: &Document) -> String {
        encode_document(document)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

struct OpenTag {
    name: String,
    /// Span this element created, restored to its parent on close.
    span: Option<SpanPath>,
}

struct Decoder<'a> {
    config: &'a RichTextConfig,
    document: Document,
    open: Vec<OpenTag>,
    current: Option<SpanPath>,
    last_closed: Option<String>,
    lists: Vec<ListKind>,
    counter: u32,
    last_char: Option<char>,
    issues: Vec<DecodeIssue>,
}

impl<'a> Decoder<'a> {
    fn new(config: &'a RichTextConfig, issues: Vec<DecodeIssue>) -> Self {
        Self {
            config,
            document: Document::new(),
            open: Vec::new(),
            current: None,
            last_closed: None,
            lists: Vec::new(),
            counter: 1,
            last_char: None,
            issues,
        }
    }

    fn text(&mut self, raw: &str) {
        let last_open = self.open.last().map(|tag| tag.name.as_str());
        if matches!(last_open, Some("ul") | Some("ol")) {
            return;
        }
        if self
            .open
            .iter()
            .any(|tag| SKIPPED_ELEMENTS.contains(&tag.name.as_str()))
        {
            return;
        }

        let trim_start = matches!(self.last_char, None | Some(' ') | Some('\n'));
        let text = collapse_whitespace(raw, trim_start);
        if text.is_empty() {
            return;
        }

        if self.after_block() {
            if text.trim().is_empty() {
                return;
            }
            self.start_paragraph(Paragraph::new());
        }
        self.last_char = text.chars().last();
        self.append_text(text);
    }

    fn open(&mut self, name: String, attributes: Vec<(String, String)>) {
        let last_open = self.open.last().map(|tag| tag.name.clone());
        self.open.push(OpenTag {
            name: name.clone(),
            span: None,
        });

        if name == "ul" || name == "ol" {
            self.lists.push(if name == "ol" {
                ListKind::Ordered
            } else {
                ListKind::Unordered
            });
            return;
        }
        if TRANSPARENT_ELEMENTS.contains(&name.as_str())
            || SKIPPED_ELEMENTS.contains(&name.as_str())
        {
            self.last_closed = None;
            return;
        }

        let declarations = attributes
            .iter()
            .find(|(attribute, _)| attribute == "style")
            .map(|(_, value)| css::parse_declarations(value))
            .unwrap_or_default();
        let tag = tag_style(&name);
        let style = match &tag {
            Some(tag) => css::character_style(&declarations).merge(tag),
            None => css::character_style(&declarations),
        };

        let is_block = BLOCK_ELEMENTS.contains(&name.as_str());
        let last_is_block = last_open
            .as_deref()
            .is_some_and(|tag| BLOCK_ELEMENTS.contains(&tag));
        let current_is_blank = self
            .document
            .paragraphs
            .last()
            .is_some_and(Paragraph::is_blank);

        if name == "li" && last_is_block && current_is_blank {
            let paragraph_type = self.item_type(last_open.as_deref());
            if let Some(paragraph) = self.document.paragraphs.last_mut() {
                if !paragraph.paragraph_type.is_list() {
                    paragraph.paragraph_type = paragraph_type;
                    paragraph.style = paragraph.style.merge(&css::paragraph_style(&declarations));
                }
            }
        }

        if is_block && (!last_is_block || !current_is_blank) {
            self.last_char = Some(' ');
            let paragraph_type = if name == "li" {
                self.item_type(last_open.as_deref())
            } else {
                ParagraphType::Default
            };
            self.start_paragraph(
                Paragraph::new()
                    .with_type(paragraph_type)
                    .with_style(css::paragraph_style(&declarations)),
            );
            if !style.is_empty() {
                let path = self.push_span(Span::new().with_style(style));
                self.set_open_span(path);
            }
        } else if name == "br" {
            self.last_char = Some(' ');
            let style = self
                .document
                .paragraphs
                .last()
                .map(|paragraph| paragraph.style)
                .unwrap_or_default();
            self.start_paragraph(Paragraph::new().with_style(style));
        } else {
            if self.after_block() {
                self.start_paragraph(Paragraph::new());
            }
            let structural = match name.as_str() {
                "a" => StructuralStyle::link(
                    attributes
                        .iter()
                        .find(|(attribute, _)| attribute == "href")
                        .map(|(_, value)| value.as_str())
                        .unwrap_or_default(),
                ),
                "code" | "code-span" => StructuralStyle::Code,
                _ => StructuralStyle::Default,
            };
            if tag.is_none() && structural.is_default() && name != "span" && !is_block {
                tracing::debug!(target: "richdoc::html", element = %name, "unsupported element");
                self.issues.push(DecodeIssue::UnsupportedElement(name.clone()));
            }
            let path = self.push_span(
                Span::new()
                    .with_style(style)
                    .with_structural(structural),
            );
            self.set_open_span(path);
        }

        self.last_closed = None;
    }

    fn close(&mut self, name: &str) {
        let Some(tag) = self.open.pop() else {
            return;
        };
        self.last_closed = Some(name.to_string());

        if name == "ul" || name == "ol" {
            self.lists.pop();
            if !self.lists.contains(&ListKind::Ordered) {
                self.counter = 1;
            }
            return;
        }
        if let Some(path) = tag.span {
            let in_last_paragraph =
                path.paragraph() + 1 == self.document.paragraphs.len();
            self.current = path.parent().filter(|_| in_last_paragraph);
        }
    }

    fn finish(mut self) -> Decoded {
        for paragraph in &mut self.document.paragraphs {
            prune_empty_spans(&mut paragraph.spans);
        }
        self.document
            .paragraphs
            .retain(|paragraph| !paragraph.is_blank());
        for issue in &self.issues {
            tracing::debug!(target: "richdoc::html", %issue, "recovered");
        }
        Decoded {
            document: self.document,
            issues: self.issues,
        }
    }

    fn after_block(&self) -> bool {
        self.last_closed
            .as_deref()
            .is_some_and(|tag| BLOCK_ELEMENTS.contains(&tag))
    }

    fn start_paragraph(&mut self, paragraph: Paragraph) {
        self.last_closed = None;
        self.current = None;
        self.document.add_paragraph(paragraph);
    }

    fn item_type(&mut self, parent: Option<&str>) -> ParagraphType {
        match parent {
            Some("ol") => {
                let number = self.counter;
                self.counter = self.counter.saturating_add(1);
                ParagraphType::ordered_with(number, self.config)
            }
            Some("ul") => ParagraphType::unordered_with(self.config),
            _ => ParagraphType::Default,
        }
    }

    /// Adds text to the current span, or starts a top-level span when
    /// there is none.
    fn append_text(&mut self, text: String) {
        self.document.ensure_initialized();
        if let Some(path) = self.current.clone() {
            if let Some(span) = self.document.span_mut(&path) {
                if span.children.is_empty() {
                    span.text.push_str(&text);
                } else {
                    span.children.push(Span::new_text(text));
                }
                return;
            }
        }
        let path = self.push_top_level(Span::new_text(text));
        self.current = Some(path);
    }

    /// Nests `span` under the current span and makes it current.
    fn push_span(&mut self, span: Span) -> SpanPath {
        self.document.ensure_initialized();
        let path = match self.current.clone() {
            Some(parent_path) => match self.document.span_mut(&parent_path) {
                Some(parent) => {
                    parent.children.push(span);
                    parent_path.child(parent.children.len() - 1)
                }
                None => self.push_top_level(span),
            },
            None => self.push_top_level(span),
        };
        self.current = Some(path.clone());
        path
    }

    fn push_top_level(&mut self, span: Span) -> SpanPath {
        self.document.ensure_initialized();
        let paragraph = self.document.paragraphs.len() - 1;
        let spans = &mut self.document.paragraphs[paragraph].spans;
        spans.push(span);
        SpanPath::top_level(paragraph, spans.len() - 1)
    }

    fn set_open_span(&mut self, path: SpanPath) {
        if let Some(tag) = self.open.last_mut() {
            tag.span = Some(path);
        }
    }
}

/// Collapses whitespace runs, line breaks included, to a single space.
fn collapse_whitespace(input: &str, trim_start: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_space = trim_start;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

fn encode_document(document: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for paragraph in &document.paragraphs {
        let list = match paragraph.paragraph_type {
            ParagraphType::OrderedList(_) => Some("ol"),
            ParagraphType::UnorderedList(_) => Some("ul"),
            ParagraphType::Default => None,
        };
        if open_list != list {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{tag}>"));
            }
            if let Some(tag) = list {
                out.push_str(&format!("<{tag}>"));
            }
            open_list = list;
        }

        if list.is_none() && paragraph.is_empty() {
            out.push_str("<br>");
            continue;
        }

        let tag = if list.is_some() { "li" } else { "p" };
        let declarations = css::paragraph_declarations(&paragraph.style);
        out.push('<');
        out.push_str(tag);
        if !declarations.is_empty() {
            push_attribute(&mut out, "style", &css::format_declarations(&declarations));
        }
        out.push('>');
        for span in &paragraph.spans {
            encode_span(span, &[], &mut out);
        }
        out.push_str(&format!("</{tag}>"));
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{tag}>"));
    }
    out
}

fn encode_span(span: &Span, parent_tags: &[&'static str], out: &mut String) {
    if span.is_empty() {
        return;
    }

    let (element, attributes): (&str, Vec<(&str, &str)>) = match &span.structural {
        StructuralStyle::Link { url } => ("a", vec![("href", url.as_str()), ("target", "_blank")]),
        StructuralStyle::Code => ("code", Vec::new()),
        StructuralStyle::Default => ("span", Vec::new()),
    };
    let (tags, rest) = formatting_tags(&span.style);
    let tags: Vec<&'static str> = tags
        .into_iter()
        .filter(|tag| !parent_tags.contains(tag))
        .collect();
    let declarations = css::character_declarations(&rest);
    let needs_element = element != "span" || !attributes.is_empty() || !declarations.is_empty();

    if needs_element {
        out.push('<');
        out.push_str(element);
        for (name, value) in &attributes {
            push_attribute(out, name, value);
        }
        if !declarations.is_empty() {
            push_attribute(out, "style", &css::format_declarations(&declarations));
        }
        out.push('>');
    }
    for tag in &tags {
        out.push_str(&format!("<{tag}>"));
    }

    out.push_str(&escape_html(&span.text));
    let mut inherited = parent_tags.to_vec();
    inherited.extend(tags.iter().copied());
    for child in &span.children {
        encode_span(child, &inherited, out);
    }

    for tag in tags.iter().rev() {
        out.push_str(&format!("</{tag}>"));
    }
    if needs_element {
        out.push_str(&format!("</{element}>"));
    }
}

/// Splits a character style into the formatting elements that express it
/// and the remainder, which is written as CSS.
fn formatting_tags(style: &CharacterStyle) -> (Vec<&'static str>, CharacterStyle) {
    let mut tags = Vec::new();
    let mut rest = style.clone();

    if let Some(level) = style.heading_level() {
        tags.push(HEADING_TAGS[usize::from(level) - 1]);
        rest.font_weight = None;
        rest.font_size = None;
    } else if style.font_weight == Some(FontWeight::BOLD) {
        tags.push("b");
        rest.font_weight = None;
    }
    if style.is_italic() {
        tags.push("i");
        rest.font_style = None;
    }
    if let Some(decoration) = style.text_decoration {
        if decoration.underline {
            tags.push("u");
        }
        if decoration.line_through {
            tags.push("s");
        }
        rest.text_decoration = None;
    }
    match style.baseline_shift {
        Some(BaselineShift::Subscript) => tags.push("sub"),
        Some(BaselineShift::Superscript) => tags.push("sup"),
        None => {}
    }
    rest.baseline_shift = None;
    if style.background == Some(Color::YELLOW) {
        tags.push("mark");
        rest.background = None;
    }
    if rest.font_size == Some(FontSize::Em(0.8)) {
        tags.push("small");
        rest.font_size = None;
    }
    (tags, rest)
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod html_tests;
