//! Formatted-text documents: a tree of styled spans grouped into
//! paragraphs, range based style editing, and HTML and Markdown codecs.

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod format;
pub mod paragraph_type;
pub mod render;
pub mod style;

pub use config::RichTextConfig;
pub use document::{
    Document, Paragraph, ParagraphKey, Position, Span, SpanPath, StyledRun, TextRange, style_label,
};
pub use editor::{DocumentEditor, PendingStyle};
pub use error::{DecodeIssue, Error, Result};
pub use format::{Codec, Decoded, Format, HtmlCodec, MarkdownCodec};
pub use paragraph_type::ParagraphType;
pub use style::{
    BaselineShift, CharacterStyle, Color, FontSize, FontStyle, FontWeight, ParagraphStyle,
    StructuralStyle, TextAlign, TextDecoration, TextIndent,
};
