use crate::mappers::fill::paint_to_fill;
use crate::scene::text::{CharStyle, TextContent};
use crate::schema::text::{TextCase, TextDecoration, TextSegment};

/// Maximal character range `[start, end)` sharing one resolved style
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub style: CharStyle,
}

/// Split text into runs of identical per-character styles
///
/// Adjacent characters are merged when their whole style tuple is equal,
/// fills and hyperlink included. Empty text has no runs.
pub fn text_runs(text: &TextContent) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for index in 0..text.len() {
        let Some(style) = text.style_at(index) else {
            break;
        };
        match runs.last_mut() {
            Some(run) if run.style == *style => run.end = index + 1,
            _ => runs.push(TextRun {
                start: index,
                end: index + 1,
                style: style.clone(),
            }),
        }
    }
    runs
}

impl TextRun {
    /// Font, size and fills are always written; the rest only when not default
    pub fn to_segment(&self) -> TextSegment {
        let style = &self.style;
        TextSegment {
            start: self.start,
            end: self.end,
            font_name: Some(style.font_name.clone()),
            font_size: Some(style.font_size),
            text_case: (style.text_case != TextCase::Original).then_some(style.text_case),
            text_decoration: (style.text_decoration != TextDecoration::None)
                .then_some(style.text_decoration),
            line_height: (!style.line_height.is_auto()).then_some(style.line_height),
            letter_spacing: (!style.letter_spacing.is_zero()).then_some(style.letter_spacing),
            fills: Some(style.fills.iter().map(paint_to_fill).collect()),
            hyperlink: style.hyperlink.clone(),
        }
    }
}

/// Segments for a text node, or `None` when the whole text is a single run
pub fn text_segments(text: &TextContent) -> Option<Vec<TextSegment>> {
    let runs = text_runs(text);
    if runs.len() < 2 {
        return None;
    }
    Some(runs.iter().map(TextRun::to_segment).collect())
}
