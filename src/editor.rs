use crate::config::RichTextConfig;
use crate::document::{Document, Span, SpanRun, TextRange, collect_runs};
use crate::error::Result;
use crate::style::{CharacterStyle, StructuralStyle};

mod styles;

/// Style typed text will receive at an offset, set by styling a collapsed
/// range or by deleting styled text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingStyle {
    pub offset: usize,
    pub character: CharacterStyle,
    pub structural: StructuralStyle,
}

/// Owns a document and applies range based edits to it.
///
/// Offsets address the flattened document text (paragraphs joined by
/// `'\n'`) and count characters. Every operation validates its range before
/// touching the tree, so a failed call leaves the document unchanged.
#[derive(Clone, Debug)]
pub struct DocumentEditor {
    document: Document,
    config: RichTextConfig,
    pending: Option<PendingStyle>,
}

impl DocumentEditor {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, RichTextConfig::default())
    }

    pub fn with_config(mut document: Document, config: RichTextConfig) -> Self {
        document.ensure_initialized();
        Self {
            document,
            config,
            pending: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &RichTextConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn pending_style(&self) -> Option<&PendingStyle> {
        self.pending.as_ref()
    }

    /// Inserts `text` at `offset`. Line breaks split paragraphs.
    ///
    /// Text takes the pending style when one is set at `offset`; otherwise
    /// it extends the span left of the offset.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<()> {
        TextRange::collapsed(offset).validate(self.document.len())?;
        let pending = self.pending.take().filter(|pending| pending.offset == offset);
        if text.is_empty() {
            self.pending = pending;
            return Ok(());
        }

        let mut cursor = offset;
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                self.document.split_paragraph(cursor)?;
                cursor += 1;
            }
            if line.is_empty() {
                continue;
            }
            match &pending {
                Some(style) => {
                    let span = Span::styled(line, style.character.clone())
                        .with_structural(style.structural.clone());
                    self.document.insert_span(cursor, span)?;
                }
                None => self.document.insert_plain_text(cursor, line)?,
            }
            cursor += line.chars().count();
        }

        tracing::debug!(
            target: "richdoc::editor",
            offset,
            inserted = cursor - offset,
            styled = pending.is_some(),
            "insert_text"
        );
        Ok(())
    }

    /// Removes the text in `range`. The style of the first removed
    /// character becomes the pending style at `range.start`, so text typed
    /// there keeps it even when nothing styled is left.
    pub fn delete_range(&mut self, range: TextRange) -> Result<()> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            return Ok(());
        }
        let removed_style = self.run_at(range.start)?;
        self.document.delete_text(range)?;
        self.pending = removed_style.map(|run| PendingStyle {
            offset: range.start,
            character: run.style,
            structural: run.structural,
        });
        tracing::debug!(
            target: "richdoc::editor",
            start = range.start,
            end = range.end,
            "delete_range"
        );
        Ok(())
    }

    /// Run holding the character at `offset`, if that is not a line break.
    fn run_at(&self, offset: usize) -> Result<Option<SpanRun>> {
        let (paragraph, local) = self.document.locate(offset)?;
        Ok(collect_runs(&self.document.paragraphs[paragraph])
            .into_iter()
            .find(|run| run.has_text() && run.start <= local && local < run.end))
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
