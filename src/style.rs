//! Style values attached to spans and paragraphs.
//!
//! Every attribute is optional. `None` means "inherit": merging a style into
//! another only overrides the attributes the merged style actually sets.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const GRAY: Color = Color::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Set of line decorations. Merging two decorations yields their union.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextDecoration {
    pub underline: bool,
    pub line_through: bool,
}

impl TextDecoration {
    pub const NONE: TextDecoration = TextDecoration {
        underline: false,
        line_through: false,
    };
    pub const UNDERLINE: TextDecoration = TextDecoration {
        underline: true,
        line_through: false,
    };
    pub const LINE_THROUGH: TextDecoration = TextDecoration {
        underline: false,
        line_through: true,
    };

    pub fn union(self, other: TextDecoration) -> TextDecoration {
        TextDecoration {
            underline: self.underline || other.underline,
            line_through: self.line_through || other.line_through,
        }
    }

    pub fn minus(self, other: TextDecoration) -> TextDecoration {
        TextDecoration {
            underline: self.underline && !other.underline,
            line_through: self.line_through && !other.line_through,
        }
    }

    pub fn contains(self, other: TextDecoration) -> bool {
        self.union(other) == self
    }

    pub fn is_none(self) -> bool {
        !self.underline && !self.line_through
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaselineShift {
    Subscript,
    Superscript,
}

/// Font size relative to the surrounding text (`Em`) or absolute (`Px`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FontSize {
    Em(f32),
    Px(f32),
}

impl FontSize {
    pub const BASE_PX: f32 = 16.0;

    pub fn as_em(self) -> f32 {
        match self {
            FontSize::Em(value) => value,
            FontSize::Px(value) => value / Self::BASE_PX,
        }
    }
}

const HEADING_SIZES: [f32; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];
const SMALL_SIZE: f32 = 0.8;

/// Inline formatting of a span.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharacterStyle {
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_decoration: Option<TextDecoration>,
    pub baseline_shift: Option<BaselineShift>,
    pub font_size: Option<FontSize>,
    pub font_family: Option<String>,
    pub color: Option<Color>,
    pub background: Option<Color>,
}

impl CharacterStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        Self {
            font_weight: Some(FontWeight::BOLD),
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            font_style: Some(FontStyle::Italic),
            ..Self::default()
        }
    }

    pub fn underline() -> Self {
        Self {
            text_decoration: Some(TextDecoration::UNDERLINE),
            ..Self::default()
        }
    }

    pub fn strikethrough() -> Self {
        Self {
            text_decoration: Some(TextDecoration::LINE_THROUGH),
            ..Self::default()
        }
    }

    pub fn subscript() -> Self {
        Self {
            baseline_shift: Some(BaselineShift::Subscript),
            ..Self::default()
        }
    }

    pub fn superscript() -> Self {
        Self {
            baseline_shift: Some(BaselineShift::Superscript),
            ..Self::default()
        }
    }

    pub fn mark() -> Self {
        Self {
            background: Some(Color::YELLOW),
            ..Self::default()
        }
    }

    pub fn small() -> Self {
        Self {
            font_size: Some(FontSize::Em(SMALL_SIZE)),
            ..Self::default()
        }
    }

    /// Heading preset for levels 1 to 6. Other levels clamp into that range.
    pub fn heading(level: u8) -> Self {
        let index = usize::from(level.clamp(1, 6)) - 1;
        Self {
            font_weight: Some(FontWeight::BOLD),
            font_size: Some(FontSize::Em(HEADING_SIZES[index])),
            ..Self::default()
        }
    }

    /// The heading level whose preset this style carries, if any.
    pub fn heading_level(&self) -> Option<u8> {
        if self.font_weight != Some(FontWeight::BOLD) {
            return None;
        }
        let FontSize::Em(size) = self.font_size? else {
            return None;
        };
        HEADING_SIZES
            .iter()
            .position(|candidate| *candidate == size)
            .map(|index| index as u8 + 1)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_font_size(mut self, size: FontSize) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight
            .is_some_and(|weight| weight > FontWeight::NORMAL)
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == Some(FontStyle::Italic)
    }

    pub fn is_underlined(&self) -> bool {
        self.text_decoration
            .is_some_and(|decoration| decoration.underline)
    }

    pub fn is_struck_through(&self) -> bool {
        self.text_decoration
            .is_some_and(|decoration| decoration.line_through)
    }

    /// Returns `self` with every attribute `other` sets applied on top.
    pub fn merge(&self, other: &CharacterStyle) -> CharacterStyle {
        let text_decoration = match (self.text_decoration, other.text_decoration) {
            (Some(mine), Some(theirs)) => Some(mine.union(theirs)),
            (mine, theirs) => theirs.or(mine),
        };
        CharacterStyle {
            font_weight: other.font_weight.or(self.font_weight),
            font_style: other.font_style.or(self.font_style),
            text_decoration,
            baseline_shift: other.baseline_shift.or(self.baseline_shift),
            font_size: other.font_size.or(self.font_size),
            font_family: other.font_family.clone().or_else(|| self.font_family.clone()),
            color: other.color.or(self.color),
            background: other.background.or(self.background),
        }
    }

    /// Clears every attribute `other` sets. Decorations are subtracted
    /// individually.
    pub fn unmerge(&self, other: &CharacterStyle) -> CharacterStyle {
        let text_decoration = match (self.text_decoration, other.text_decoration) {
            (Some(mine), Some(theirs)) => Some(mine.minus(theirs)).filter(|rest| !rest.is_none()),
            (mine, _) => mine,
        };
        CharacterStyle {
            font_weight: clear_if_set(self.font_weight, other.font_weight),
            font_style: clear_if_set(self.font_style, other.font_style),
            text_decoration,
            baseline_shift: clear_if_set(self.baseline_shift, other.baseline_shift),
            font_size: clear_if_set(self.font_size, other.font_size),
            font_family: if other.font_family.is_some() {
                None
            } else {
                self.font_family.clone()
            },
            color: clear_if_set(self.color, other.color),
            background: clear_if_set(self.background, other.background),
        }
    }
}

fn clear_if_set<T>(mine: Option<T>, theirs: Option<T>) -> Option<T> {
    if theirs.is_some() { None } else { mine }
}

/// Structural role of a span. At most one per span; it decides which
/// element a span serializes to, independent of its character style.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StructuralStyle {
    #[default]
    Default,
    Link {
        url: String,
    },
    Code,
}

impl StructuralStyle {
    pub fn link(url: impl Into<String>) -> Self {
        StructuralStyle::Link { url: url.into() }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, StructuralStyle::Default)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
    Center,
    Justify,
    Start,
    End,
}

/// Indentation in terminal cells.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextIndent {
    pub first_line: f32,
    pub rest_line: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParagraphStyle {
    pub text_align: Option<TextAlign>,
    pub line_height: Option<f32>,
    pub text_indent: Option<TextIndent>,
}

impl ParagraphStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aligned(align: TextAlign) -> Self {
        Self {
            text_align: Some(align),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&self, other: &ParagraphStyle) -> ParagraphStyle {
        ParagraphStyle {
            text_align: other.text_align.or(self.text_align),
            line_height: other.line_height.or(self.line_height),
            text_indent: other.text_indent.or(self.text_indent),
        }
    }

    pub fn unmerge(&self, other: &ParagraphStyle) -> ParagraphStyle {
        ParagraphStyle {
            text_align: clear_if_set(self.text_align, other.text_align),
            line_height: clear_if_set(self.line_height, other.line_height),
            text_indent: clear_if_set(self.text_indent, other.text_indent),
        }
    }
}
