use crate::error::{BridgeError, Result};
use crate::scene::paint::Paint;
use crate::schema::paint::Rgb;
use crate::schema::text::{
    FontName, Hyperlink, LetterSpacing, LineHeight, TextAlignHorizontal, TextAlignVertical,
    TextAutoResize, TextCase, TextDecoration, TextTruncation,
};

pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Resolved style of a single character
#[derive(Debug, Clone, PartialEq)]
pub struct CharStyle {
    pub font_name: FontName,
    pub font_size: f64,
    pub text_case: TextCase,
    pub text_decoration: TextDecoration,
    pub line_height: LineHeight,
    pub letter_spacing: LetterSpacing,
    pub fills: Vec<Paint>,
    pub hyperlink: Option<Hyperlink>,
}

impl Default for CharStyle {
    fn default() -> Self {
        Self {
            font_name: FontName::new("Inter", "Regular"),
            font_size: DEFAULT_FONT_SIZE,
            text_case: TextCase::default(),
            text_decoration: TextDecoration::default(),
            line_height: LineHeight::default(),
            letter_spacing: LetterSpacing::default(),
            fills: vec![Paint::solid(Rgb::BLACK)],
            hyperlink: None,
        }
    }
}

/// Text payload of a live TEXT node
///
/// Styles are stored per character so that any half-open range can be
/// restyled independently and queried back one index at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextContent {
    characters: Vec<char>,
    styles: Vec<CharStyle>,
    base: CharStyle,
    pub align_horizontal: TextAlignHorizontal,
    pub align_vertical: TextAlignVertical,
    pub paragraph_indent: f64,
    pub paragraph_spacing: f64,
    pub truncation: TextTruncation,
    pub max_lines: Option<u32>,
    pub auto_resize: TextAutoResize,
}

impl TextContent {
    pub fn characters(&self) -> String {
        self.characters.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Replace the characters; every character takes the node-level style
    pub fn set_characters(&mut self, characters: &str) {
        self.characters = characters.chars().collect();
        self.styles = vec![self.base.clone(); self.characters.len()];
    }

    /// Node-level style: the one covering the most characters, the earliest
    /// on a tie, or the base style when empty
    pub fn node_style(&self) -> &CharStyle {
        let mut tally: Vec<(&CharStyle, usize)> = Vec::new();
        for style in &self.styles {
            match tally.iter_mut().find(|(seen, _)| *seen == style) {
                Some((_, count)) => *count += 1,
                None => tally.push((style, 1)),
            }
        }

        let mut best: Option<(&CharStyle, usize)> = None;
        for (style, count) in tally {
            match best {
                Some((_, top)) if top >= count => {}
                _ => best = Some((style, count)),
            }
        }
        best.map_or(&self.base, |(style, _)| style)
    }

    pub fn style_at(&self, index: usize) -> Option<&CharStyle> {
        self.styles.get(index)
    }

    /// Apply `update` to the node-level style and to every character
    pub fn update_all(&mut self, update: impl Fn(&mut CharStyle)) {
        update(&mut self.base);
        for style in &mut self.styles {
            update(style);
        }
    }

    /// Apply `update` to each character in `[start, end)`
    pub fn update_range(
        &mut self,
        start: usize,
        end: usize,
        update: impl Fn(&mut CharStyle),
    ) -> Result<()> {
        if start >= end || end > self.characters.len() {
            return Err(BridgeError::invalid(
                "text range",
                format!("[{}, {}) outside 0..{}", start, end, self.characters.len()),
            ));
        }
        for style in &mut self.styles[start..end] {
            update(style);
        }
        Ok(())
    }

    pub fn set_font_name(&mut self, font: &FontName) {
        self.update_all(|style| style.font_name = font.clone());
    }

    pub fn set_fills(&mut self, fills: &[Paint]) {
        self.update_all(|style| style.fills = fills.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_characters_uses_base_style() {
        let mut text = TextContent::default();
        text.update_all(|style| style.font_size = 20.0);
        text.set_characters("hello");
        assert_eq!(text.len(), 5);
        assert!((0..5).all(|i| text.style_at(i).unwrap().font_size == 20.0));
    }

    #[test]
    fn test_update_range_is_half_open() {
        let mut text = TextContent::default();
        text.set_characters("abcdef");
        text.update_range(2, 4, |style| style.font_size = 30.0).unwrap();
        let sizes: Vec<f64> = (0..6).map(|i| text.style_at(i).unwrap().font_size).collect();
        assert_eq!(sizes, vec![12.0, 12.0, 30.0, 30.0, 12.0, 12.0]);
    }

    #[test]
    fn test_update_range_rejects_out_of_bounds() {
        let mut text = TextContent::default();
        text.set_characters("abc");
        assert!(text.update_range(1, 10, |_| {}).is_err());
        assert!(text.update_range(2, 2, |_| {}).is_err());
    }

    #[test]
    fn test_node_style_is_the_most_common() {
        let mut text = TextContent::default();
        text.set_characters("Sale ends today");
        text.update_range(0, 4, |style| style.font_size = 32.0).unwrap();
        assert_eq!(text.node_style().font_size, DEFAULT_FONT_SIZE);

        text.update_range(4, 12, |style| style.font_size = 32.0).unwrap();
        assert_eq!(text.node_style().font_size, 32.0);
    }

    #[test]
    fn test_node_style_tie_takes_the_earliest() {
        let mut text = TextContent::default();
        text.set_characters("abcd");
        text.update_range(0, 2, |style| style.font_size = 20.0).unwrap();
        assert_eq!(text.node_style().font_size, 20.0);
    }

    #[test]
    fn test_node_style_of_empty_text() {
        let text = TextContent::default();
        assert_eq!(text.node_style().font_size, DEFAULT_FONT_SIZE);
        assert_eq!(text.characters(), "");
    }
}
