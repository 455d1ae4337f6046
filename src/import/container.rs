use crate::error::Result;
use crate::import::Importer;
use crate::scene::host::Host;
use crate::scene::node::NodeId;
use crate::schema::{DesignNode, NodeType};
use tracing::warn;

impl<'t, H: Host> Importer<'t, H> {
    /// Frame-like containers: properties first, then children in `_layerIndex` order
    pub(crate) async fn create_container(
        &mut self,
        node_type: NodeType,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.spawn(node_type, parent)?;
        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;
        self.create_children(design, id).await;
        Ok(id)
    }

    /// Groups wrap placed nodes only, so children are staged in a throwaway
    /// frame under the target parent before the host groups them
    pub(crate) async fn create_group(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let staging = self.spawn(NodeType::Frame, parent)?;
        let children = self.create_children(design, staging).await;

        if children.is_empty() {
            warn!(
                "Group {:?} has no children, substituting an empty frame",
                design.display_name()
            );
            return self.settle_as_frame(staging, design, false).await;
        }

        let group = match self.host.group(&children, parent) {
            Ok(group) => group,
            Err(e) => {
                self.host.remove_node(staging)?;
                return Err(e);
            }
        };
        self.host.remove_node(staging)?;
        self.apply_base(group, design)?;
        Ok(group)
    }

    /// Turn a staging frame into the frame-equivalent fallback for `design`
    pub(crate) async fn settle_as_frame(
        &mut self,
        staging: NodeId,
        design: &DesignNode,
        clips_content: bool,
    ) -> Result<NodeId> {
        if let Some(container) = self.node_mut(staging)?.container.as_mut() {
            container.clips_content = clips_content;
        }
        self.apply_base(staging, design)?;
        self.apply_paints(staging, design).await?;
        Ok(staging)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TranslatorConfig;
    use crate::import::{ComponentRegistry, FontCache, Importer};
    use crate::mappers::image::ImageCache;
    use crate::scene::host::Host;
    use crate::scene::memory::MemoryHost;
    use crate::scene::node::NodeId;
    use crate::schema::{DesignNode, NodeType};
    use futures::executor::block_on;
    use serde_json::json;

    fn import(host: &mut MemoryHost, value: serde_json::Value) -> Vec<NodeId> {
        let roots: Vec<DesignNode> = serde_json::from_value(value).unwrap();
        let config = TranslatorConfig::default();
        let mut registry = ComponentRegistry::new();
        let mut fonts = FontCache::default();
        let mut images = ImageCache::default();
        let mut importer = Importer::new(host, &config, &mut registry, &mut fonts, &mut images);
        block_on(importer.import(&roots, None))
    }

    #[test]
    fn test_frame_applies_container_properties() {
        let mut host = MemoryHost::new();
        let created = import(
            &mut host,
            json!([{
                "type": "FRAME",
                "name": "Card",
                "width": 320, "height": 200,
                "fills": [{"type": "SOLID", "color": {"r": 1, "g": 1, "b": 1}}],
                "cornerRadius": 12,
                "clipsContent": false,
                "layoutMode": "VERTICAL",
                "paddingTop": 24,
                "layoutGrids": [{"pattern": "GRID", "sectionSize": 8}]
            }]),
        );

        let frame = host.node(created[0]).unwrap();
        assert_eq!(frame.width(), 320.0);
        assert_eq!(frame.geometry.as_ref().unwrap().fills.len(), 1);
        assert_eq!(frame.corners.as_ref().unwrap().uniform(), Some(12.0));
        let container = frame.container.as_ref().unwrap();
        assert!(!container.clips_content);
        assert_eq!(container.auto_layout.padding_top, 24.0);
        assert_eq!(container.layout_grids.len(), 1);
    }

    #[test]
    fn test_section_holds_children_without_auto_layout() {
        let mut host = MemoryHost::new();
        let created = import(
            &mut host,
            json!([{
                "type": "SECTION",
                "layoutMode": "HORIZONTAL",
                "children": [{"type": "RECTANGLE"}, {"type": "ELLIPSE"}]
            }]),
        );
        let section = host.node(created[0]).unwrap();
        assert_eq!(section.node_type, NodeType::Section);
        assert!(section.container.is_none());
        assert_eq!(section.children.len(), 2);
    }

    #[test]
    fn test_group_staging_drops_failed_child() {
        let mut host = MemoryHost::new();
        host.fail_creation_of(NodeType::Ellipse);
        let created = import(
            &mut host,
            json!([{
                "type": "GROUP",
                "name": "Cluster",
                "children": [
                    {"type": "RECTANGLE", "name": "a"},
                    {"type": "ELLIPSE", "name": "b"},
                    {"type": "RECTANGLE", "name": "c"}
                ]
            }]),
        );

        assert_eq!(created.len(), 1);
        let group = host.node(created[0]).unwrap();
        assert_eq!(group.node_type, NodeType::Group);
        assert_eq!(group.name, "Cluster");
        assert_eq!(group.children.len(), 2);
        assert_eq!(host.page_children(), created);
        assert_eq!(host.node_count(), 3);
    }

    #[test]
    fn test_group_without_children_becomes_unclipped_frame() {
        let mut host = MemoryHost::new();
        host.fail_creation_of(NodeType::Rectangle);
        let created = import(
            &mut host,
            json!([{"type": "GROUP", "name": "Empty", "children": [{"type": "RECTANGLE"}]}]),
        );

        let frame = host.node(created[0]).unwrap();
        assert_eq!(frame.node_type, NodeType::Frame);
        assert_eq!(frame.name, "Empty");
        assert!(!frame.container.as_ref().unwrap().clips_content);
        assert!(frame.children.is_empty());
        assert_eq!(host.page_children(), created);
    }

    #[test]
    fn test_group_inside_frame_keeps_slot_order() {
        let mut host = MemoryHost::new();
        let created = import(
            &mut host,
            json!([{
                "type": "FRAME",
                "children": [
                    {"type": "RECTANGLE", "name": "under"},
                    {"type": "GROUP", "name": "middle", "children": [{"type": "ELLIPSE"}]},
                    {"type": "RECTANGLE", "name": "over"}
                ]
            }]),
        );
        let frame = host.node(created[0]).unwrap();
        let names: Vec<String> = frame
            .children
            .iter()
            .map(|id| host.node(*id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["under", "middle", "over"]);
    }
}
