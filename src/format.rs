//! Conversion between documents and their textual representations.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::RichTextConfig;
use crate::document::Document;
use crate::error::{DecodeIssue, Error};
use crate::style::CharacterStyle;

pub mod css;
pub mod html;
pub mod markdown;

pub use html::HtmlCodec;
pub use markdown::MarkdownCodec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Html,
    Markdown,
}

impl Format {
    /// Picks the format from a file extension. Anything that is not
    /// Markdown is read as HTML.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("md") | Some("markdown") | Some("mkd") | Some("mdown") | Some("mdtxt") => {
                Format::Markdown
            }
            _ => Format::Html,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Markdown => "markdown",
        }
    }

    pub fn codec(self, config: RichTextConfig) -> Box<dyn Codec> {
        match self {
            Format::Html => Box::new(HtmlCodec::with_config(config)),
            Format::Markdown => Box::new(MarkdownCodec::with_config(config)),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Format::Html),
            "markdown" | "md" => Ok(Format::Markdown),
            _ => Err(Error::UnknownFormat(name.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded document together with the input problems the decoder
/// recovered from.
#[derive(Clone, Debug, Default)]
pub struct Decoded {
    pub document: Document,
    pub issues: Vec<DecodeIssue>,
}

pub trait Codec {
    fn name(&self) -> &'static str;

    /// Never fails: malformed input is repaired and reported in
    /// [`Decoded::issues`].
    fn decode(&self, input: &str) -> Decoded;

    fn encode(&self, document: &Document) -> String;
}

impl Document {
    pub fn decode(format: Format, input: &str) -> Document {
        format.codec(RichTextConfig::default()).decode(input).document
    }

    pub fn encode(&self, format: Format) -> String {
        format.codec(RichTextConfig::default()).encode(self)
    }
}

pub(crate) const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Character style of the inline formatting elements both markup formats
/// understand.
pub(crate) fn tag_style(name: &str) -> Option<CharacterStyle> {
    let style = match name {
        "b" | "strong" => CharacterStyle::bold(),
        "i" | "em" => CharacterStyle::italic(),
        "u" | "ins" => CharacterStyle::underline(),
        "s" | "strike" | "del" => CharacterStyle::strikethrough(),
        "sub" => CharacterStyle::subscript(),
        "sup" => CharacterStyle::superscript(),
        "mark" => CharacterStyle::mark(),
        "small" => CharacterStyle::small(),
        _ => {
            let level = HEADING_TAGS.iter().position(|tag| *tag == name)?;
            CharacterStyle::heading(level as u8 + 1)
        }
    };
    Some(style)
}
