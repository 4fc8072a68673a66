/// Settings for the list paragraphs created by decoders and the editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RichTextConfig {
    /// Indentation of ordered list items, in terminal cells.
    pub ordered_list_indent: u16,
    /// Indentation of unordered list items, in terminal cells.
    pub unordered_list_indent: u16,
    pub unordered_list_marker: char,
}

impl Default for RichTextConfig {
    fn default() -> Self {
        Self {
            ordered_list_indent: 4,
            unordered_list_indent: 4,
            unordered_list_marker: '•',
        }
    }
}

impl RichTextConfig {
    pub fn with_list_indent(mut self, indent: u16) -> Self {
        self.ordered_list_indent = indent;
        self.unordered_list_indent = indent;
        self
    }
}
