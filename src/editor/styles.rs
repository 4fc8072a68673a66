use super::{DocumentEditor, PendingStyle};
use crate::document::{SpanPath, SpanRun, TextRange, collect_runs, run_before};
use crate::error::Result;
use crate::paragraph_type::ParagraphType;
use crate::style::{CharacterStyle, ParagraphStyle, StructuralStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Change {
    Add,
    Remove,
}

impl DocumentEditor {
    pub fn add_character_style(&mut self, range: TextRange, style: &CharacterStyle) -> Result<()> {
        self.change_character_style(range, style, Change::Add)
    }

    pub fn remove_character_style(
        &mut self,
        range: TextRange,
        style: &CharacterStyle,
    ) -> Result<()> {
        self.change_character_style(range, style, Change::Remove)
    }

    /// Marks the range as a link or code. Spans nested inside a newly
    /// marked span lose their own structural style.
    pub fn add_structural_style(
        &mut self,
        range: TextRange,
        structural: &StructuralStyle,
    ) -> Result<()> {
        self.change_structural_style(range, structural, Change::Add)
    }

    /// Reverts spans whose structural style equals `structural` back to
    /// plain text. A link to another target is left alone.
    pub fn remove_structural_style(
        &mut self,
        range: TextRange,
        structural: &StructuralStyle,
    ) -> Result<()> {
        self.change_structural_style(range, structural, Change::Remove)
    }

    pub fn set_paragraph_style(&mut self, range: TextRange, style: ParagraphStyle) -> Result<()> {
        self.update_paragraph_styles(range, |_| style)
    }

    pub fn add_paragraph_style(&mut self, range: TextRange, style: &ParagraphStyle) -> Result<()> {
        self.update_paragraph_styles(range, |current| current.merge(style))
    }

    pub fn remove_paragraph_style(
        &mut self,
        range: TextRange,
        style: &ParagraphStyle,
    ) -> Result<()> {
        self.update_paragraph_styles(range, |current| current.unmerge(style))
    }

    /// Gives every paragraph touched by `range` the type `paragraph_type`.
    /// Consecutive list items are numbered from the given item onwards.
    pub fn set_paragraph_type(
        &mut self,
        range: TextRange,
        paragraph_type: ParagraphType,
    ) -> Result<()> {
        let paragraphs = self.paragraphs_in(range)?;
        let mut next = paragraph_type;
        for idx in paragraphs.iter().copied() {
            let following = next.next_variant();
            self.document.paragraphs[idx].paragraph_type = next;
            next = following;
        }
        tracing::debug!(
            target: "richdoc::editor",
            start = range.start,
            end = range.end,
            paragraphs = paragraphs.len(),
            "set_paragraph_type"
        );
        Ok(())
    }

    /// Effective character style of the range. A collapsed range reports the
    /// pending style at that offset, or the style of the text left of it.
    /// Otherwise the style shared by every character is returned, or the
    /// empty style when the characters differ.
    pub fn character_style_at(&self, range: TextRange) -> Result<CharacterStyle> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            if let Some(pending) = self.pending_at(range.start) {
                return Ok(pending.character.clone());
            }
            return Ok(self
                .run_left_of(range.start)?
                .map(|run| run.style)
                .unwrap_or_default());
        }
        Ok(shared(self.runs_in(range).into_iter().map(|run| run.style)).unwrap_or_default())
    }

    pub fn structural_style_at(&self, range: TextRange) -> Result<StructuralStyle> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            if let Some(pending) = self.pending_at(range.start) {
                return Ok(pending.structural.clone());
            }
            return Ok(self
                .run_left_of(range.start)?
                .map(|run| run.structural)
                .unwrap_or_default());
        }
        Ok(
            shared(self.runs_in(range).into_iter().map(|run| run.structural))
                .unwrap_or_default(),
        )
    }

    pub fn paragraph_style_at(&self, range: TextRange) -> Result<ParagraphStyle> {
        let paragraphs = self.paragraphs_in(range)?;
        Ok(shared(
            paragraphs
                .into_iter()
                .map(|idx| self.document.paragraphs[idx].style),
        )
        .unwrap_or_default())
    }

    pub fn paragraph_type_at(&self, range: TextRange) -> Result<ParagraphType> {
        let paragraphs = self.paragraphs_in(range)?;
        Ok(shared(
            paragraphs
                .into_iter()
                .map(|idx| self.document.paragraphs[idx].paragraph_type.clone()),
        )
        .unwrap_or_default())
    }

    fn change_character_style(
        &mut self,
        range: TextRange,
        style: &CharacterStyle,
        change: Change,
    ) -> Result<()> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            let mut pending = self.pending_or_current(range.start)?;
            pending.character = match change {
                Change::Add => pending.character.merge(style),
                Change::Remove => pending.character.unmerge(style),
            };
            self.pending = Some(pending);
            return Ok(());
        }

        let paths = self.isolate(range)?;
        for path in &paths {
            if let Some(span) = self.document.span_mut(path) {
                span.style = match change {
                    Change::Add => span.style.merge(style),
                    Change::Remove => span.style.unmerge(style),
                };
            }
        }
        tracing::debug!(
            target: "richdoc::editor",
            start = range.start,
            end = range.end,
            spans = paths.len(),
            ?change,
            "character style"
        );
        Ok(())
    }

    fn change_structural_style(
        &mut self,
        range: TextRange,
        structural: &StructuralStyle,
        change: Change,
    ) -> Result<()> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            let mut pending = self.pending_or_current(range.start)?;
            match change {
                Change::Add => pending.structural = structural.clone(),
                Change::Remove if pending.structural == *structural => {
                    pending.structural = StructuralStyle::Default;
                }
                Change::Remove => {}
            }
            self.pending = Some(pending);
            return Ok(());
        }

        let paths = self.isolate(range)?;
        for path in &paths {
            let Some(span) = self.document.span_mut(path) else {
                continue;
            };
            match change {
                Change::Add if path.depth() == 1 => span.structural = structural.clone(),
                Change::Add => span.structural = StructuralStyle::Default,
                Change::Remove if span.structural == *structural => {
                    span.structural = StructuralStyle::Default;
                }
                Change::Remove => {}
            }
        }
        tracing::debug!(
            target: "richdoc::editor",
            start = range.start,
            end = range.end,
            spans = paths.len(),
            ?change,
            "structural style"
        );
        Ok(())
    }

    fn update_paragraph_styles(
        &mut self,
        range: TextRange,
        update: impl Fn(&ParagraphStyle) -> ParagraphStyle,
    ) -> Result<()> {
        for idx in self.paragraphs_in(range)? {
            let paragraph = &mut self.document.paragraphs[idx];
            paragraph.style = update(&paragraph.style);
        }
        Ok(())
    }

    /// Splits spans so that no span straddles a range boundary and returns
    /// every span inside the range.
    fn isolate(&mut self, range: TextRange) -> Result<Vec<SpanPath>> {
        self.document.split_at_offset(range.start)?;
        self.document.split_at_offset(range.end)?;
        self.document.spans_intersecting(range)
    }

    /// Indices of the paragraphs whose text, including the trailing line
    /// break, overlaps `range`. A collapsed range touches the paragraph
    /// holding the offset.
    fn paragraphs_in(&self, range: TextRange) -> Result<Vec<usize>> {
        range.validate(self.document.len())?;
        if range.is_collapsed() {
            let (paragraph, _) = self.document.locate(range.start)?;
            return Ok(vec![paragraph]);
        }
        let mut result = Vec::new();
        let mut start = 0;
        for (idx, paragraph) in self.document.paragraphs.iter().enumerate() {
            if start >= range.end {
                break;
            }
            let end = start + paragraph.len() + 1;
            if end > range.start {
                result.push(idx);
            }
            start = end;
        }
        Ok(result)
    }

    fn pending_at(&self, offset: usize) -> Option<&PendingStyle> {
        self.pending
            .as_ref()
            .filter(|pending| pending.offset == offset)
    }

    fn pending_or_current(&self, offset: usize) -> Result<PendingStyle> {
        if let Some(pending) = self.pending_at(offset) {
            return Ok(pending.clone());
        }
        let run = self.run_left_of(offset)?;
        Ok(PendingStyle {
            offset,
            character: run.as_ref().map(|run| run.style.clone()).unwrap_or_default(),
            structural: run.map(|run| run.structural).unwrap_or_default(),
        })
    }

    fn run_left_of(&self, offset: usize) -> Result<Option<SpanRun>> {
        let (paragraph, local) = self.document.locate(offset)?;
        let runs = collect_runs(&self.document.paragraphs[paragraph]);
        Ok(run_before(&runs, local).cloned())
    }

    /// Runs with text overlapping `range`. Line breaks carry no style and
    /// are skipped.
    fn runs_in(&self, range: TextRange) -> Vec<SpanRun> {
        let mut result = Vec::new();
        let mut start = 0;
        for paragraph in &self.document.paragraphs {
            if start >= range.end {
                break;
            }
            for run in collect_runs(paragraph) {
                let run_start = start + run.start;
                let run_end = start + run.end;
                if run.has_text() && run_start < range.end && run_end > range.start {
                    result.push(run);
                }
            }
            start += paragraph.len() + 1;
        }
        result
    }
}

/// The value every item shares, `None` when they differ or there are none.
fn shared<T: PartialEq>(mut values: impl Iterator<Item = T>) -> Option<T> {
    let first = values.next()?;
    for value in values {
        if value != first {
            return None;
        }
    }
    Some(first)
}
