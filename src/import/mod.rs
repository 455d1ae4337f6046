/// Reconstruction of live nodes from serialized trees
///
/// - `helpers`: property groups shared by every creator
/// - `container`: frames, sections and groups
/// - `shape`: rectangles, ellipses, polygons, stars and lines
/// - `vector`: vector paths and networks
/// - `text`: text nodes, font fallback and styled ranges
/// - `component`: components, component sets, instances and boolean operations
/// - `registry`: component bookkeeping for one import call
pub mod component;
pub mod container;
pub mod helpers;
pub mod registry;
pub mod shape;
pub mod text;
pub mod vector;

use crate::config::TranslatorConfig;
use crate::error::{BridgeError, Result};
use crate::mappers::fill::fills_to_paints;
use crate::mappers::image::{resolve_fills, ImageCache};
use crate::scene::host::Host;
use crate::scene::node::{NodeId, SceneNode};
use crate::scene::paint::Paint;
use crate::schema::paint::Fill;
use crate::schema::{order_by_layer_index, DesignNode, NodeType};
use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

// Re-export commonly used items
pub use registry::{ComponentRegistry, PendingInstance};
pub use text::FontCache;

/// One import call over a host
///
/// Borrows the long-lived state of a `Translator` (registry, font cache, url
/// cache) so that nested child creation always sees the same registry.
pub struct Importer<'t, H: Host> {
    host: &'t mut H,
    config: &'t TranslatorConfig,
    registry: &'t mut ComponentRegistry,
    fonts: &'t mut FontCache,
    images: &'t mut ImageCache,
    /// placeholder -> node that took its slot
    replaced: HashMap<NodeId, NodeId>,
    deferral_open: bool,
}

impl<'t, H: Host> Importer<'t, H> {
    pub fn new(
        host: &'t mut H,
        config: &'t TranslatorConfig,
        registry: &'t mut ComponentRegistry,
        fonts: &'t mut FontCache,
        images: &'t mut ImageCache,
    ) -> Self {
        Self {
            host,
            config,
            registry,
            fonts,
            images,
            replaced: HashMap::new(),
            deferral_open: true,
        }
    }

    /// Create every root under `parent`, then settle instances still waiting
    /// for a component
    ///
    /// # Returns
    /// The live nodes standing for the roots that materialized, in z-order
    pub async fn import(&mut self, roots: &[DesignNode], parent: Option<NodeId>) -> Vec<NodeId> {
        self.registry.clear();
        self.registry.declare_tree(roots);
        self.deferral_open = true;

        let mut created = Vec::new();
        for root in order_by_layer_index(roots) {
            if let Some(id) = self.create_node(root, parent).await {
                created.push(id);
            }
        }

        self.deferral_open = false;
        loop {
            let pending = self.registry.drain_pending();
            if pending.is_empty() {
                break;
            }
            for entry in pending {
                self.materialize_pending(entry, None).await;
            }
        }

        created.into_iter().filter_map(|id| self.current_id(id)).collect()
    }

    /// Create one node and its subtree under `parent`
    ///
    /// A failing creator never propagates: whatever it left behind is removed,
    /// then the node is rebuilt as a frame when it has children, or dropped.
    pub fn create_node<'s>(
        &'s mut self,
        design: &'s DesignNode,
        parent: Option<NodeId>,
    ) -> LocalBoxFuture<'s, Option<NodeId>>
    where
        't: 's,
    {
        async move {
            let node_type = match NodeType::normalize(&design.node_type, design) {
                Ok(node_type) => node_type,
                Err(e) => {
                    warn!("Dropping {:?}: {}", design.display_name(), e);
                    return None;
                }
            };

            let before = self.snapshot(parent);
            match self.create_typed(node_type, design, parent).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Failed to create {} {:?}: {}", node_type, design.display_name(), e);
                    self.remove_strays(parent, &before);
                    if design.children().is_empty() {
                        return None;
                    }
                    warn!("Substituting a frame for {:?}", design.display_name());
                    match self.create_container(NodeType::Frame, design, parent).await {
                        Ok(id) => Some(id),
                        Err(e) => {
                            warn!(
                                "Frame substitute for {:?} failed too: {}",
                                design.display_name(),
                                e
                            );
                            self.remove_strays(parent, &before);
                            None
                        }
                    }
                }
            }
        }
        .boxed_local()
    }

    async fn create_typed(
        &mut self,
        node_type: NodeType,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        match node_type {
            NodeType::Frame | NodeType::Section => {
                self.create_container(node_type, design, parent).await
            }
            NodeType::Group => self.create_group(design, parent).await,
            NodeType::Rectangle => self.create_rectangle(design, parent).await,
            NodeType::Ellipse | NodeType::Polygon | NodeType::Star => {
                self.create_primitive(node_type, design, parent).await
            }
            NodeType::Line => self.create_line(design, parent).await,
            NodeType::Vector => self.create_vector(design, parent).await,
            NodeType::Text => self.create_text(design, parent).await,
            NodeType::Component => self.create_component(design, parent).await,
            NodeType::ComponentSet => self.create_component_set(design, parent).await,
            NodeType::Instance => self.create_instance(design, parent).await,
            NodeType::BooleanOperation => self.create_boolean_operation(design, parent).await,
        }
    }

    /// Create children in `_layerIndex` order, each appended on top
    async fn create_children(&mut self, design: &DesignNode, parent: NodeId) -> Vec<NodeId> {
        let mut created = Vec::new();
        for child in design.ordered_children() {
            if let Some(id) = self.create_node(child, Some(parent)).await {
                created.push(id);
            }
        }
        created
    }

    /// Create a bare node of `node_type` on top of `parent`
    fn spawn(&mut self, node_type: NodeType, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.host.create_node(node_type)?;
        if let Err(e) = self.host.insert_child(parent, None, id) {
            self.host.remove_node(id)?;
            return Err(e);
        }
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.host
            .node_mut(id)
            .ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))
    }

    fn parent_auto_layout(&self, parent: Option<NodeId>) -> bool {
        parent
            .and_then(|p| self.host.node(p))
            .and_then(|p| p.container.as_ref())
            .is_some_and(|c| c.auto_layout.is_enabled())
    }

    /// Apply the synchronous property groups of `design` onto `id`
    fn apply_base(&mut self, id: NodeId, design: &DesignNode) -> Result<()> {
        let parent = self.host.node(id).and_then(|n| n.parent);
        let parent_auto_layout = self.parent_auto_layout(parent);
        helpers::apply_base(self.node_mut(id)?, design, parent_auto_layout);
        Ok(())
    }

    /// Resolve and assign fills and strokes, skipping nodes without geometry
    async fn apply_paints(&mut self, id: NodeId, design: &DesignNode) -> Result<()> {
        if self.node_mut(id)?.geometry.is_none() {
            return Ok(());
        }
        let fills = match &design.fills {
            Some(fills) => Some(self.paints(fills).await),
            None => None,
        };
        let strokes = match &design.strokes {
            Some(strokes) => Some(self.paints(strokes).await),
            None => None,
        };
        helpers::apply_paints(self.node_mut(id)?, fills, strokes);
        Ok(())
    }

    /// Image-resolving paint conversion, falling back to the synchronous mapper
    async fn paints(&mut self, fills: &[Fill]) -> Vec<Paint> {
        match resolve_fills(&mut *self.host, &mut *self.images, self.config, fills).await {
            Ok(paints) => paints,
            Err(e) => {
                warn!("Image paint resolution failed, using synchronous fills: {}", e);
                fills_to_paints(fills)
            }
        }
    }

    fn snapshot(&self, parent: Option<NodeId>) -> HashSet<NodeId> {
        let mut ids: HashSet<NodeId> = self.host.page_children().into_iter().collect();
        if parent.is_some() {
            ids.extend(self.host.children_of(parent));
        }
        ids
    }

    /// Remove whatever appeared on the page or under `parent` since `before`
    fn remove_strays(&mut self, parent: Option<NodeId>, before: &HashSet<NodeId>) {
        let mut current = self.host.page_children();
        if parent.is_some() {
            current.extend(self.host.children_of(parent));
        }
        for stray in current.into_iter().filter(|id| !before.contains(id)) {
            debug!("Removing stray node {}", stray);
            if let Err(e) = self.host.remove_node(stray) {
                warn!("Could not remove stray node {}: {}", stray, e);
            }
        }
    }

    /// Follow placeholder replacements; `None` once the node is gone
    fn current_id(&self, mut id: NodeId) -> Option<NodeId> {
        while let Some(next) = self.replaced.get(&id) {
            id = *next;
        }
        self.host.node(id).map(|n| n.id)
    }
}
