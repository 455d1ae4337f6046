/// Serialization of live nodes back into design trees
///
/// - `properties`: synchronous extractors, one per property group
/// - `text_runs`: per-character styles merged into text segments
pub mod properties;
pub mod text_runs;

use crate::config::TranslatorConfig;
use crate::error::{BridgeError, Result};
use crate::mappers::fill::paint_to_fill;
use crate::mappers::image::EmbeddedImages;
use crate::scene::host::Host;
use crate::scene::node::NodeId;
use crate::scene::paint::Paint;
use crate::schema::paint::Fill;
use crate::schema::{DesignNode, NodeType};
use futures::future::{FutureExt, LocalBoxFuture};
use tracing::warn;

// Re-export commonly used items
pub use properties::extract;
pub use text_runs::{text_runs, text_segments, TextRun};

/// One export call over a host
///
/// Bitmaps are read and encoded at most once per hash for the whole call.
pub struct Exporter<'t, H: Host> {
    host: &'t mut H,
    config: &'t TranslatorConfig,
    images: EmbeddedImages,
}

impl<'t, H: Host> Exporter<'t, H> {
    pub fn new(host: &'t mut H, config: &'t TranslatorConfig) -> Self {
        Self {
            host,
            config,
            images: EmbeddedImages::default(),
        }
    }

    /// Export each root in order; a root that fails is logged and left out
    pub async fn export(&mut self, ids: &[NodeId]) -> Vec<DesignNode> {
        let mut exported = Vec::with_capacity(ids.len());
        for id in ids {
            let parent_auto_layout = self
                .host
                .node(*id)
                .and_then(|n| n.parent)
                .and_then(|p| self.host.node(p))
                .and_then(|p| p.container.as_ref())
                .is_some_and(|c| c.auto_layout.is_enabled());
            match self.export_node(*id, parent_auto_layout).await {
                Ok(design) => exported.push(design),
                Err(e) => warn!("Skipping export of {}: {}", id, e),
            }
        }
        exported
    }

    /// Export one node and its subtree, children in z-order with `_layerIndex`
    ///
    /// Instance children are not exported; they come from the main component.
    pub fn export_node<'s>(
        &'s mut self,
        id: NodeId,
        parent_auto_layout: bool,
    ) -> LocalBoxFuture<'s, Result<DesignNode>>
    where
        't: 's,
    {
        async move {
            let node = self
                .host
                .node(id)
                .cloned()
                .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))?;
            let mut design = extract(&node, parent_auto_layout);

            if let Some(main) = node.instance.as_ref().and_then(|i| i.main_component) {
                design.instance.main_component_key = self
                    .host
                    .node(main)
                    .and_then(|m| m.component.as_ref())
                    .map(|c| c.key.clone())
                    .filter(|key| !key.is_empty());
            }

            if let Some(geometry) = &node.geometry {
                design.fills = self.export_paints(&geometry.fills).await;
                design.strokes = self.export_paints(&geometry.strokes).await;
            }

            if node.node_type != NodeType::Instance && !node.children.is_empty() {
                let auto_layout = node
                    .container
                    .as_ref()
                    .is_some_and(|c| c.auto_layout.is_enabled());
                let mut children = Vec::with_capacity(node.children.len());
                for (index, child) in node.children.iter().enumerate() {
                    match self.export_node(*child, auto_layout).await {
                        Ok(mut exported) => {
                            exported.layer_index = Some(index as i64);
                            children.push(exported);
                        }
                        Err(e) => warn!("Skipping child {} of {}: {}", child, id, e),
                    }
                }
                if !children.is_empty() {
                    design.children = Some(children);
                }
            }
            Ok(design)
        }
        .boxed_local()
    }

    /// Serialized paints, `None` for an empty list
    ///
    /// Image paints carry their bitmap inline unless embedding is disabled.
    async fn export_paints(&mut self, paints: &[Paint]) -> Option<Vec<Fill>> {
        if paints.is_empty() {
            return None;
        }
        let mut fills = Vec::with_capacity(paints.len());
        for paint in paints {
            let mut fill = paint_to_fill(paint);
            if let (Some(hash), true) = (paint.image_hash(), self.config.embed_images) {
                match self.images.encode(&mut *self.host, hash).await {
                    Ok(encoded) => fill.image_data = Some(encoded),
                    Err(e) => warn!("Exporting image {} without its bytes: {}", hash, e),
                }
            }
            fills.push(fill);
        }
        Some(fills)
    }
}
