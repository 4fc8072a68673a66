//! Inline `style` attribute handling: parsing declarations and mapping them
//! to and from character and paragraph styles.

use crate::style::{
    BaselineShift, CharacterStyle, Color, FontSize, FontStyle, FontWeight, ParagraphStyle,
    TextAlign, TextDecoration, TextIndent,
};

/// Declarations of a `style` attribute in source order. Property names are
/// lowercased; values are trimmed.
pub fn parse_declarations(input: &str) -> Vec<(String, String)> {
    input
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property, value.to_string()))
        })
        .collect()
}

pub fn format_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn character_style(declarations: &[(String, String)]) -> CharacterStyle {
    let mut style = CharacterStyle::default();
    for (property, value) in declarations {
        let keyword = value.to_ascii_lowercase();
        match property.as_str() {
            "font-weight" => style.font_weight = parse_font_weight(&keyword),
            "font-style" => {
                style.font_style = match keyword.as_str() {
                    "italic" | "oblique" => Some(FontStyle::Italic),
                    "normal" => Some(FontStyle::Normal),
                    _ => None,
                }
            }
            "text-decoration" | "text-decoration-line" => {
                let mut decoration = TextDecoration::NONE;
                for part in keyword.split_whitespace() {
                    match part {
                        "underline" => decoration.underline = true,
                        "line-through" => decoration.line_through = true,
                        _ => {}
                    }
                }
                style.text_decoration = Some(decoration).filter(|decoration| !decoration.is_none());
            }
            "vertical-align" => {
                style.baseline_shift = match keyword.as_str() {
                    "sub" => Some(BaselineShift::Subscript),
                    "super" => Some(BaselineShift::Superscript),
                    _ => None,
                }
            }
            "font-size" => style.font_size = parse_font_size(&keyword),
            "font-family" => {
                style.font_family = Some(value.trim_matches(|c| c == '"' || c == '\'').to_string())
            }
            "color" => style.color = parse_color(&keyword),
            "background" | "background-color" => style.background = parse_color(&keyword),
            _ => tracing::trace!(target: "richdoc::css", property = %property, "ignored declaration"),
        }
    }
    style
}

/// Declarations describing every attribute `style` sets.
pub fn character_declarations(style: &CharacterStyle) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Some(weight) = style.font_weight {
        out.push(("font-weight".to_string(), weight.0.to_string()));
    }
    if let Some(font_style) = style.font_style {
        let value = match font_style {
            FontStyle::Italic => "italic",
            FontStyle::Normal => "normal",
        };
        out.push(("font-style".to_string(), value.to_string()));
    }
    if let Some(decoration) = style.text_decoration {
        let mut parts = Vec::new();
        if decoration.underline {
            parts.push("underline");
        }
        if decoration.line_through {
            parts.push("line-through");
        }
        if !parts.is_empty() {
            out.push(("text-decoration".to_string(), parts.join(" ")));
        }
    }
    if let Some(shift) = style.baseline_shift {
        let value = match shift {
            BaselineShift::Subscript => "sub",
            BaselineShift::Superscript => "super",
        };
        out.push(("vertical-align".to_string(), value.to_string()));
    }
    if let Some(size) = style.font_size {
        out.push(("font-size".to_string(), format_font_size(size)));
    }
    if let Some(family) = &style.font_family {
        out.push(("font-family".to_string(), family.clone()));
    }
    if let Some(color) = style.color {
        out.push(("color".to_string(), format_color(color)));
    }
    if let Some(color) = style.background {
        out.push(("background-color".to_string(), format_color(color)));
    }
    out
}

pub fn paragraph_style(declarations: &[(String, String)]) -> ParagraphStyle {
    let mut style = ParagraphStyle::default();
    for (property, value) in declarations {
        let value = value.to_ascii_lowercase();
        match property.as_str() {
            "text-align" => {
                style.text_align = match value.as_str() {
                    "left" => Some(TextAlign::Left),
                    "right" => Some(TextAlign::Right),
                    "center" => Some(TextAlign::Center),
                    "justify" => Some(TextAlign::Justify),
                    "start" => Some(TextAlign::Start),
                    "end" => Some(TextAlign::End),
                    _ => None,
                }
            }
            "line-height" => style.line_height = parse_number(&value),
            "text-indent" => {
                if let Some(first_line) = parse_length(&value) {
                    let indent = style.text_indent.unwrap_or_default();
                    style.text_indent = Some(TextIndent {
                        first_line,
                        ..indent
                    });
                }
            }
            "padding-left" => {
                if let Some(rest_line) = parse_length(&value) {
                    let indent = style.text_indent.unwrap_or_default();
                    style.text_indent = Some(TextIndent { rest_line, ..indent });
                }
            }
            _ => tracing::trace!(target: "richdoc::css", property = %property, "ignored declaration"),
        }
    }
    style
}

pub fn paragraph_declarations(style: &ParagraphStyle) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Some(align) = style.text_align {
        let value = match align {
            TextAlign::Left => "left",
            TextAlign::Right => "right",
            TextAlign::Center => "center",
            TextAlign::Justify => "justify",
            TextAlign::Start => "start",
            TextAlign::End => "end",
        };
        out.push(("text-align".to_string(), value.to_string()));
    }
    if let Some(height) = style.line_height {
        out.push(("line-height".to_string(), height.to_string()));
    }
    if let Some(indent) = style.text_indent {
        out.push(("text-indent".to_string(), format!("{}px", indent.first_line)));
        out.push(("padding-left".to_string(), format!("{}px", indent.rest_line)));
    }
    out
}

fn parse_font_weight(value: &str) -> Option<FontWeight> {
    match value {
        "normal" => Some(FontWeight::NORMAL),
        "bold" | "bolder" => Some(FontWeight::BOLD),
        "lighter" => Some(FontWeight(300)),
        _ => value.parse::<u16>().ok().map(FontWeight),
    }
}

pub fn parse_font_size(value: &str) -> Option<FontSize> {
    let value = value.trim();
    if let Some(number) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return number.trim().parse().ok().map(FontSize::Em);
    }
    if let Some(number) = value.strip_suffix("px") {
        return number.trim().parse().ok().map(FontSize::Px);
    }
    if let Some(number) = value.strip_suffix("pt") {
        return number
            .trim()
            .parse::<f32>()
            .ok()
            .map(|pt| FontSize::Px(pt * 4.0 / 3.0));
    }
    if let Some(number) = value.strip_suffix('%') {
        return number
            .trim()
            .parse::<f32>()
            .ok()
            .map(|percent| FontSize::Em(percent / 100.0));
    }
    match value {
        "small" => Some(FontSize::Em(0.8)),
        "medium" => Some(FontSize::Em(1.0)),
        "large" => Some(FontSize::Em(1.2)),
        _ => None,
    }
}

pub fn format_font_size(size: FontSize) -> String {
    match size {
        FontSize::Em(value) => format!("{value}em"),
        FontSize::Px(value) => format!("{value}px"),
    }
}

fn parse_number(value: &str) -> Option<f32> {
    value.trim().parse().ok()
}

fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value
        .strip_suffix("px")
        .or_else(|| value.strip_suffix("ch"))
        .unwrap_or(value);
    number.trim().parse().ok()
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a handful
/// of color names.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_color(hex);
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let channel = |part: &str| part.parse::<u8>().ok();
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(channel(r)?, channel(g)?, channel(b)?)),
            [r, g, b, a] => {
                let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
                Some(Color::rgba(
                    channel(r)?,
                    channel(g)?,
                    channel(b)?,
                    (alpha * 255.0).round() as u8,
                ))
            }
            _ => None,
        };
    }
    match value.as_str() {
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "red" => Some(Color::RED),
        "green" => Some(Color::GREEN),
        "blue" => Some(Color::BLUE),
        "yellow" => Some(Color::YELLOW),
        "gray" | "grey" => Some(Color::GRAY),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let digit = |idx: usize| u8::from_str_radix(hex.get(idx..idx + 1)?, 16).ok();
    let pair = |idx: usize| u8::from_str_radix(hex.get(idx..idx + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => Some(Color::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Color::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        _ => None,
    }
}

pub fn format_color(color: Color) -> String {
    if color.a == 255 {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    } else {
        let alpha = (f32::from(color.a) / 255.0 * 100.0).round() / 100.0;
        format!("rgba({}, {}, {}, {alpha})", color.r, color.g, color.b)
    }
}
