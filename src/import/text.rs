use crate::error::{BridgeError, Result};
use crate::import::helpers::guarded;
use crate::import::Importer;
use crate::scene::host::Host;
use crate::scene::node::{unsupported, Capability, NodeId, SceneNode};
use crate::scene::text::CharStyle;
use crate::schema::text::{FontName, TextAutoResize, TextSegment};
use crate::schema::{DesignNode, NodeType};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Fonts already loaded into the host, keyed by `FontName::key`
///
/// Lives as long as the translator so that a font is loaded at most once per
/// host, across import calls.
#[derive(Debug, Default)]
pub struct FontCache {
    loaded: HashSet<String>,
}

impl FontCache {
    pub fn contains(&self, font: &FontName) -> bool {
        self.loaded.contains(&font.key())
    }

    pub fn insert(&mut self, font: &FontName) {
        self.loaded.insert(font.key());
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }
}

impl<'t, H: Host> Importer<'t, H> {
    /// Load `requested`, falling back to the configured default then fallback fonts
    ///
    /// # Returns
    /// The first font of the chain the host could load, or `None` when all failed
    pub(crate) async fn resolve_font(&mut self, requested: &FontName) -> Option<FontName> {
        let chain = [
            requested.clone(),
            self.config.default_font.clone(),
            self.config.fallback_font.clone(),
        ];
        let mut tried: Vec<&FontName> = Vec::new();

        for font in &chain {
            if tried.contains(&font) {
                continue;
            }
            tried.push(font);

            if self.fonts.contains(font) {
                return Some(font.clone());
            }
            match self.host.load_font(font).await {
                Ok(()) => {
                    self.fonts.insert(font);
                    if font != requested {
                        warn!(
                            "Font {} {} unavailable, substituting {} {}",
                            requested.family, requested.style, font.family, font.style
                        );
                    }
                    return Some(font.clone());
                }
                Err(e) => debug!("Could not load {} {}: {}", font.family, font.style, e),
            }
        }
        None
    }

    /// Text: font first, then characters, then node-wide styles, then segments
    pub(crate) async fn create_text(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.spawn(NodeType::Text, parent)?;

        let requested = design
            .text
            .font_name
            .clone()
            .unwrap_or_else(|| self.config.default_font.clone());
        let font = self
            .resolve_font(&requested)
            .await
            .ok_or_else(|| BridgeError::FontUnavailable {
                family: requested.family.clone(),
                style: requested.style.clone(),
            })?;
        self.host.set_font_name(id, &font)?;
        self.host
            .set_characters(id, design.text.characters.as_deref().unwrap_or(""))?;

        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;

        let parent_auto_layout = self.parent_auto_layout(parent);
        guarded(self.node_mut(id)?, design, "text style", |node, design| {
            apply_text_style(node, design, parent_auto_layout)
        });

        for segment in design.text.text_segments.iter().flatten() {
            if segment.is_empty_range() {
                debug!("Skipping empty text segment [{}, {})", segment.start, segment.end);
                continue;
            }
            if let Err(e) = self.apply_segment(id, segment).await {
                warn!(
                    "Skipping text segment [{}, {}) on {:?}: {}",
                    segment.start,
                    segment.end,
                    design.display_name(),
                    e
                );
            }
        }
        Ok(id)
    }

    async fn apply_segment(&mut self, id: NodeId, segment: &TextSegment) -> Result<()> {
        let (start, end) = (segment.start, segment.end);
        let length = self.node_mut(id)?.text.as_ref().map_or(0, |t| t.len());
        if end > length {
            return Err(BridgeError::invalid(
                "textSegments",
                format!("[{}, {}) outside 0..{}", start, end, length),
            ));
        }

        if let Some(requested) = &segment.font_name {
            match self.resolve_font(requested).await {
                Some(font) => self.host.set_range_font_name(id, start, end, &font)?,
                None => warn!(
                    "No font available for segment [{}, {}), keeping the node font",
                    start, end
                ),
            }
        }

        let fills = match &segment.fills {
            Some(fills) => Some(self.paints(fills).await),
            None => None,
        };

        let node = self.node_mut(id)?;
        let node_type = node.node_type;
        let text = node.text.as_mut().ok_or_else(|| unsupported(node_type, Capability::Text))?;
        text.update_range(start, end, |style: &mut CharStyle| {
            if let Some(size) = segment.font_size {
                style.font_size = size;
            }
            if let Some(case) = segment.text_case {
                style.text_case = case;
            }
            if let Some(decoration) = segment.text_decoration {
                style.text_decoration = decoration;
            }
            if let Some(line_height) = segment.line_height {
                style.line_height = line_height;
            }
            if let Some(spacing) = segment.letter_spacing {
                style.letter_spacing = spacing;
            }
            if let Some(fills) = &fills {
                style.fills = fills.clone();
            }
            if let Some(link) = &segment.hyperlink {
                style.hyperlink = Some(link.clone());
            }
        })
    }
}

/// Node-wide text attributes and the auto-resize mode
///
/// Without an explicit `textAutoResize`, the mode follows the given size: no
/// width grows both ways, a width inside auto-layout or without a height
/// wraps at that width, and a full box outside auto-layout stays fixed.
pub fn apply_text_style(
    node: &mut SceneNode,
    design: &DesignNode,
    parent_auto_layout: bool,
) -> Result<()> {
    let node_type = node.node_type;
    let text = node.text.as_mut().ok_or_else(|| unsupported(node_type, Capability::Text))?;
    let props = &design.text;

    if let Some(size) = props.font_size {
        if !size.is_finite() || size < 1.0 {
            return Err(BridgeError::invalid("fontSize", format!("{} is below 1", size)));
        }
    }
    text.update_all(|style| {
        if let Some(size) = props.font_size {
            style.font_size = size;
        }
        if let Some(case) = props.text_case {
            style.text_case = case;
        }
        if let Some(decoration) = props.text_decoration {
            style.text_decoration = decoration;
        }
        if let Some(line_height) = props.line_height {
            style.line_height = line_height;
        }
        if let Some(spacing) = props.letter_spacing {
            style.letter_spacing = spacing;
        }
        if let Some(link) = &props.hyperlink {
            style.hyperlink = Some(link.clone());
        }
    });

    if let Some(align) = props.text_align_horizontal {
        text.align_horizontal = align;
    }
    if let Some(align) = props.text_align_vertical {
        text.align_vertical = align;
    }
    if let Some(indent) = props.paragraph_indent {
        text.paragraph_indent = indent;
    }
    if let Some(spacing) = props.paragraph_spacing {
        text.paragraph_spacing = spacing;
    }
    if let Some(truncation) = props.text_truncation {
        text.truncation = truncation;
    }
    if let Some(max_lines) = props.max_lines {
        text.max_lines = Some(max_lines);
    }

    text.auto_resize = match (props.text_auto_resize, design.width, design.height) {
        (Some(mode), _, _) => mode,
        (None, None, _) => TextAutoResize::WidthAndHeight,
        (None, Some(_), _) if parent_auto_layout => TextAutoResize::Height,
        (None, Some(_), None) => TextAutoResize::Height,
        (None, Some(_), Some(_)) => TextAutoResize::None,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorConfig;
    use crate::import::ComponentRegistry;
    use crate::mappers::image::ImageCache;
    use crate::scene::memory::MemoryHost;
    use crate::scene::paint::PaintKind;
    use crate::schema::paint::Rgb;
    use crate::schema::text::TextDecoration;
    use futures::executor::block_on;
    use serde_json::json;

    struct Fixture {
        host: MemoryHost,
        config: TranslatorConfig,
        registry: ComponentRegistry,
        fonts: FontCache,
        images: ImageCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                host: MemoryHost::new(),
                config: TranslatorConfig::default(),
                registry: ComponentRegistry::new(),
                fonts: FontCache::default(),
                images: ImageCache::default(),
            }
        }

        fn import(&mut self, value: serde_json::Value) -> Vec<NodeId> {
            let roots: Vec<DesignNode> = serde_json::from_value(value).unwrap();
            let mut importer = Importer::new(
                &mut self.host,
                &self.config,
                &mut self.registry,
                &mut self.fonts,
                &mut self.images,
            );
            block_on(importer.import(&roots, None))
        }

        fn text_node(&self, id: NodeId) -> &SceneNode {
            self.host.node(id).unwrap()
        }
    }

    #[test]
    fn test_text_characters_and_font() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "TEXT",
            "characters": "Hello",
            "fontName": {"family": "Inter", "style": "Bold"},
            "fontSize": 24,
            "textAlignHorizontal": "CENTER"
        }]));

        let text = fixture.text_node(created[0]).text.as_ref().unwrap();
        assert_eq!(text.characters(), "Hello");
        assert_eq!(text.node_style().font_name, FontName::new("Inter", "Bold"));
        assert_eq!(text.node_style().font_size, 24.0);
        assert_eq!(text.align_horizontal, crate::schema::text::TextAlignHorizontal::Center);
    }

    #[test]
    fn test_missing_font_falls_back_to_default() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "TEXT",
            "characters": "x",
            "fontName": {"family": "Nope Sans", "style": "Regular"}
        }]));
        let text = fixture.text_node(created[0]).text.as_ref().unwrap();
        assert_eq!(text.node_style().font_name, FontName::new("Inter", "Regular"));
    }

    #[test]
    fn test_last_tier_font_is_used() {
        let mut fixture = Fixture::new();
        fixture.host.remove_font(&FontName::new("Inter", "Regular"));
        let created = fixture.import(json!([{"type": "TEXT", "characters": "x"}]));
        let text = fixture.text_node(created[0]).text.as_ref().unwrap();
        assert_eq!(text.node_style().font_name, FontName::new("Roboto", "Regular"));
    }

    #[test]
    fn test_no_loadable_font_drops_text() {
        let mut fixture = Fixture::new();
        fixture.host.remove_font(&FontName::new("Inter", "Regular"));
        fixture.host.remove_font(&FontName::new("Roboto", "Regular"));
        let created = fixture.import(json!([{"type": "TEXT", "characters": "x"}]));
        assert!(created.is_empty());
        assert_eq!(fixture.host.node_count(), 0);
    }

    #[test]
    fn test_fonts_load_once_per_translator() {
        let mut fixture = Fixture::new();
        fixture.import(json!([
            {"type": "TEXT", "characters": "a"},
            {"type": "TEXT", "characters": "b"}
        ]));
        fixture.import(json!([{"type": "TEXT", "characters": "c"}]));
        assert_eq!(fixture.host.font_loads(), 1);
        assert_eq!(fixture.fonts.len(), 1);
    }

    #[test]
    fn test_segments_style_ranges() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "TEXT",
            "characters": "Hello world",
            "fontSize": 16,
            "textSegments": [
                {"start": 0, "end": 5, "fontName": {"family": "Inter", "style": "Bold"}},
                {"start": 6, "end": 11, "textDecoration": "UNDERLINE",
                 "fills": [{"type": "SOLID", "color": {"r": 0, "g": 0, "b": 1}}]},
                {"start": 3, "end": 3, "fontSize": 99},
                {"start": 8, "end": 40, "fontSize": 99}
            ]
        }]));

        let text = fixture.text_node(created[0]).text.as_ref().unwrap();
        assert_eq!(text.style_at(0).unwrap().font_name.style, "Bold");
        assert_eq!(text.style_at(5).unwrap().font_name.style, "Regular");
        assert_eq!(text.style_at(6).unwrap().text_decoration, TextDecoration::Underline);
        assert_eq!(
            text.style_at(10).unwrap().fills[0].kind,
            PaintKind::Solid {
                color: Rgb::new(0.0, 0.0, 1.0)
            }
        );
        assert!((0..11).all(|i| text.style_at(i).unwrap().font_size == 16.0));
    }

    #[test]
    fn test_auto_resize_inference() {
        let infer = |design: serde_json::Value, auto_layout: bool| {
            let design: DesignNode = serde_json::from_value(design).unwrap();
            let mut node = SceneNode::new(NodeId(1), NodeType::Text);
            apply_text_style(&mut node, &design, auto_layout).unwrap();
            node.text.unwrap().auto_resize
        };

        assert_eq!(infer(json!({"type": "TEXT"}), false), TextAutoResize::WidthAndHeight);
        assert_eq!(infer(json!({"type": "TEXT", "width": 100}), false), TextAutoResize::Height);
        assert_eq!(
            infer(json!({"type": "TEXT", "width": 100, "height": 20}), true),
            TextAutoResize::Height
        );
        assert_eq!(
            infer(json!({"type": "TEXT", "width": 100, "height": 20}), false),
            TextAutoResize::None
        );
        assert_eq!(
            infer(json!({"type": "TEXT", "textAutoResize": "TRUNCATE"}), false),
            TextAutoResize::Truncate
        );
    }

    #[test]
    fn test_font_cache_keys() {
        let mut cache = FontCache::default();
        assert!(cache.is_empty());
        cache.insert(&FontName::new("Inter", "Bold"));
        assert!(cache.contains(&FontName::new("Inter", "Bold")));
        assert!(!cache.contains(&FontName::new("Inter", "Regular")));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
