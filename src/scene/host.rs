use crate::error::Result;
use crate::scene::node::{NodeId, SceneNode};
use crate::schema::node::BooleanOperationType;
use crate::schema::text::FontName;
use crate::schema::NodeType;
use serde_json::Value as JsonValue;

/// The design tool hosting the canvas
///
/// A parent of `None` always means the current page. Every creation
/// factory appends the new node to the current page, like the host does;
/// callers move it with `insert_child`.
///
/// The `async` operations are the only suspension points of a translation:
/// font loading, bitmap creation and lookup, remote fetches and library
/// imports. Everything else is synchronous.
#[allow(async_fn_in_trait)]
pub trait Host {
    fn create_node(&mut self, node_type: NodeType) -> Result<NodeId>;

    fn node(&self, id: NodeId) -> Option<&SceneNode>;

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode>;

    fn page_children(&self) -> Vec<NodeId>;

    fn selection(&self) -> Vec<NodeId>;

    fn set_selection(&mut self, ids: &[NodeId]);

    /// Move `child` under `parent` at `index`, or at the top when `index` is `None`
    fn insert_child(
        &mut self,
        parent: Option<NodeId>,
        index: Option<usize>,
        child: NodeId,
    ) -> Result<()>;

    /// Remove a node and its whole subtree
    fn remove_node(&mut self, id: NodeId) -> Result<()>;

    /// Look up a live node by its displayed identifier
    fn find_by_id(&self, id: &str) -> Option<NodeId>;

    /// Wrap already-placed nodes into a new group under `parent`
    fn group(&mut self, children: &[NodeId], parent: Option<NodeId>) -> Result<NodeId>;

    /// Combine already-placed nodes with a boolean operator under `parent`
    fn boolean_operation(
        &mut self,
        operation: BooleanOperationType,
        children: &[NodeId],
        parent: Option<NodeId>,
    ) -> Result<NodeId>;

    /// Combine already-placed components into a component set under `parent`
    fn combine_as_variants(
        &mut self,
        components: &[NodeId],
        parent: Option<NodeId>,
    ) -> Result<NodeId>;

    fn create_instance(&mut self, component: NodeId) -> Result<NodeId>;

    fn set_instance_property(
        &mut self,
        instance: NodeId,
        key: &str,
        value: &JsonValue,
    ) -> Result<()>;

    /// Requires the node's font to be loaded
    fn set_characters(&mut self, id: NodeId, characters: &str) -> Result<()>;

    /// Requires `font` to be loaded
    fn set_font_name(&mut self, id: NodeId, font: &FontName) -> Result<()>;

    /// Requires `font` to be loaded
    fn set_range_font_name(
        &mut self,
        id: NodeId,
        start: usize,
        end: usize,
        font: &FontName,
    ) -> Result<()>;

    async fn load_font(&mut self, font: &FontName) -> Result<()>;

    /// Decode and store a bitmap, returning its hash
    async fn create_image(&mut self, bytes: &[u8]) -> Result<String>;

    async fn has_image(&mut self, hash: &str) -> bool;

    async fn image_bytes(&mut self, hash: &str) -> Result<Vec<u8>>;

    async fn fetch(&mut self, url: &str) -> Result<Vec<u8>>;

    async fn import_component_by_key(&mut self, key: &str) -> Result<NodeId>;

    /// Index of `child` among its parent's children (or the page's)
    fn index_in_parent(&self, child: NodeId) -> Option<usize> {
        let siblings = match self.node(child)?.parent {
            Some(parent) => self.node(parent)?.children.clone(),
            None => self.page_children(),
        };
        siblings.iter().position(|id| *id == child)
    }

    fn children_of(&self, parent: Option<NodeId>) -> Vec<NodeId> {
        match parent {
            Some(id) => self.node(id).map(|n| n.children.clone()).unwrap_or_default(),
            None => self.page_children(),
        }
    }
}
