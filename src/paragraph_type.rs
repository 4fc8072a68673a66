use unicode_width::UnicodeWidthStr;

use crate::config::RichTextConfig;
use crate::document::Span;
use crate::style::{CharacterStyle, ParagraphStyle, TextIndent};

/// Block role of a paragraph.
///
/// List variants carry a start marker (`"3. "`, `"• "`) that is rendered in
/// front of the paragraph. The marker is not part of the paragraph's spans
/// and does not occupy document offsets. Its width and the hanging indent it
/// implies are derived on every read.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ParagraphType {
    #[default]
    Default,
    OrderedList(OrderedList),
    UnorderedList(UnorderedList),
}

#[derive(Clone, Debug)]
pub struct OrderedList {
    pub number: u32,
    pub indent: u16,
    pub start_marker_style: CharacterStyle,
}

// Items of the same list compare equal regardless of their number.
impl PartialEq for OrderedList {
    fn eq(&self, other: &Self) -> bool {
        self.indent == other.indent
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnorderedList {
    pub indent: u16,
    pub marker: char,
    pub start_marker_style: CharacterStyle,
}

impl ParagraphType {
    pub fn ordered(number: u32) -> Self {
        Self::ordered_with(number, &RichTextConfig::default())
    }

    pub fn ordered_with(number: u32, config: &RichTextConfig) -> Self {
        ParagraphType::OrderedList(OrderedList {
            number,
            indent: config.ordered_list_indent,
            start_marker_style: CharacterStyle::default(),
        })
    }

    pub fn unordered() -> Self {
        Self::unordered_with(&RichTextConfig::default())
    }

    pub fn unordered_with(config: &RichTextConfig) -> Self {
        ParagraphType::UnorderedList(UnorderedList {
            indent: config.unordered_list_indent,
            marker: config.unordered_list_marker,
            start_marker_style: CharacterStyle::default(),
        })
    }

    pub fn is_list(&self) -> bool {
        !matches!(self, ParagraphType::Default)
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            ParagraphType::OrderedList(list) => Some(list.number),
            _ => None,
        }
    }

    /// The type a paragraph following this one inherits.
    pub fn next_variant(&self) -> ParagraphType {
        match self {
            ParagraphType::Default => ParagraphType::Default,
            ParagraphType::OrderedList(list) => ParagraphType::OrderedList(OrderedList {
                number: list.number.saturating_add(1),
                indent: list.indent,
                start_marker_style: list.start_marker_style.clone(),
            }),
            ParagraphType::UnorderedList(list) => ParagraphType::UnorderedList(list.clone()),
        }
    }

    pub fn start_marker_text(&self) -> Option<String> {
        match self {
            ParagraphType::Default => None,
            ParagraphType::OrderedList(list) => Some(format!("{}. ", list.number)),
            ParagraphType::UnorderedList(list) => Some(format!("{} ", list.marker)),
        }
    }

    pub fn start_marker(&self) -> Option<Span> {
        let text = self.start_marker_text()?;
        let style = match self {
            ParagraphType::OrderedList(list) => list.start_marker_style.clone(),
            ParagraphType::UnorderedList(list) => list.start_marker_style.clone(),
            ParagraphType::Default => CharacterStyle::default(),
        };
        Some(Span::styled(text, style))
    }

    /// Display width of the start marker in terminal cells.
    pub fn start_marker_width(&self) -> u16 {
        self.start_marker_text()
            .map(|text| UnicodeWidthStr::width(text.as_str()) as u16)
            .unwrap_or(0)
    }

    pub fn indent(&self) -> u16 {
        match self {
            ParagraphType::Default => 0,
            ParagraphType::OrderedList(list) => list.indent,
            ParagraphType::UnorderedList(list) => list.indent,
        }
    }

    /// Hanging indent: the marker sits in front of the first line, the
    /// remaining lines align with the text after it.
    pub fn paragraph_style(&self) -> ParagraphStyle {
        if !self.is_list() {
            return ParagraphStyle::default();
        }
        let indent = f32::from(self.indent());
        ParagraphStyle {
            text_indent: Some(TextIndent {
                first_line: indent - f32::from(self.start_marker_width()),
                rest_line: indent,
            }),
            ..ParagraphStyle::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_items_count_up() {
        let first = ParagraphType::ordered(1);
        let third = first.next_variant().next_variant();
        assert_eq!(third.number(), Some(3));
        assert_eq!(third.start_marker_text().as_deref(), Some("3. "));
    }

    #[test]
    fn ordered_equality_ignores_number() {
        assert_eq!(ParagraphType::ordered(1), ParagraphType::ordered(7));
        let config = RichTextConfig::default().with_list_indent(8);
        assert_ne!(
            ParagraphType::ordered(1),
            ParagraphType::ordered_with(1, &config)
        );
        assert_ne!(ParagraphType::ordered(1), ParagraphType::unordered());
    }

    #[test]
    fn unordered_next_variant_is_identical() {
        let item = ParagraphType::unordered();
        assert_eq!(item.next_variant(), item);
        assert_eq!(item.start_marker_text().as_deref(), Some("• "));
    }

    #[test]
    fn marker_width_drives_hanging_indent() {
        let item = ParagraphType::ordered(12);
        assert_eq!(item.start_marker_width(), 4);
        let indent = item
            .paragraph_style()
            .text_indent
            .expect("list items are indented");
        assert_eq!(indent.rest_line, 4.0);
        assert_eq!(indent.first_line, 0.0);

        assert_eq!(ParagraphType::Default.start_marker_width(), 0);
        assert!(ParagraphType::Default.paragraph_style().is_empty());
    }

    #[test]
    fn start_marker_is_a_styled_span() {
        let mut item = ParagraphType::ordered(2);
        if let ParagraphType::OrderedList(list) = &mut item {
            list.start_marker_style = CharacterStyle::bold();
        }
        let marker = item.start_marker().expect("ordered items have a marker");
        assert_eq!(marker.text, "2. ");
        assert_eq!(marker.style, CharacterStyle::bold());
        assert!(ParagraphType::Default.start_marker().is_none());
    }
}
