use crate::schema::paint::Fill;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }

    /// Cache key used to remember which fonts the host already loaded
    pub fn key(&self) -> String {
        format!("{}::{}", self.family, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignHorizontal {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignVertical {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    Strikethrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextCase {
    #[default]
    Original,
    Upper,
    Lower,
    Title,
    SmallCaps,
    SmallCapsForced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineHeightUnit {
    #[default]
    Auto,
    Pixels,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineHeight {
    pub unit: LineHeightUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl LineHeight {
    pub fn is_auto(&self) -> bool {
        self.unit == LineHeightUnit::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LetterSpacingUnit {
    Pixels,
    #[default]
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LetterSpacing {
    pub unit: LetterSpacingUnit,
    pub value: f64,
}

impl LetterSpacing {
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HyperlinkType {
    Url,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    #[serde(rename = "type")]
    pub link_type: HyperlinkType,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextTruncation {
    #[default]
    Disabled,
    Ending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAutoResize {
    None,
    #[default]
    WidthAndHeight,
    Height,
    Truncate,
}

/// Style override for the half-open character range `[start, end)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_case: Option<TextCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<TextDecoration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<LineHeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<LetterSpacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Fill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
}

impl TextSegment {
    pub fn is_empty_range(&self) -> bool {
        self.end <= self.start
    }
}

/// TEXT-only attributes, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_horizontal: Option<TextAlignHorizontal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align_vertical: Option<TextAlignVertical>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<TextDecoration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_case: Option<TextCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<LineHeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<LetterSpacing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_indent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_truncation: Option<TextTruncation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_auto_resize: Option<TextAutoResize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_segments: Option<Vec<TextSegment>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_font_key() {
        assert_eq!(FontName::new("Inter", "Bold").key(), "Inter::Bold");
    }

    #[test]
    fn test_line_height_auto_has_no_value() {
        let auto: LineHeight = serde_json::from_value(json!({"unit": "AUTO"})).unwrap();
        assert!(auto.is_auto());
        assert_eq!(serde_json::to_value(auto).unwrap(), json!({"unit": "AUTO"}));

        let px: LineHeight =
            serde_json::from_value(json!({"unit": "PIXELS", "value": 20})).unwrap();
        assert!(!px.is_auto());
        assert_eq!(px.value, Some(20.0));
    }

    #[test]
    fn test_segment_parses_half_open_range() {
        let segment: TextSegment = serde_json::from_value(json!({
            "start": 0,
            "end": 5,
            "fontSize": 18,
            "textDecoration": "UNDERLINE"
        }))
        .unwrap();
        assert_eq!(segment.start, 0);
        assert_eq!(segment.end, 5);
        assert_eq!(segment.font_size, Some(18.0));
        assert!(!segment.is_empty_range());
    }
}
