use crate::error::{BridgeError, Result};
use crate::scene::host::Host;
use crate::scene::node::{unsupported, Capability, NodeId, SceneNode};
use crate::schema::node::{BooleanOperationType, ComponentPropertyType, OverrideRecord};
use crate::schema::text::FontName;
use crate::schema::NodeType;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-process canvas implementing `Host`
///
/// Mirrors the rules of the real design tool closely enough to exercise the
/// translator: capability checks, font loading before text edits, bitmap
/// format sniffing, grouping of placed nodes only, and library lookups.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    nodes: BTreeMap<NodeId, SceneNode>,
    page: Vec<NodeId>,
    selection: Vec<NodeId>,
    next_id: u64,
    available_fonts: HashSet<FontName>,
    loaded_fonts: HashSet<FontName>,
    font_loads: usize,
    images: HashMap<String, Vec<u8>>,
    remote: HashMap<String, Vec<u8>>,
    fetched: Vec<String>,
    library: HashMap<String, NodeId>,
    failing_types: HashSet<NodeType>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let available_fonts = [
            FontName::new("Inter", "Regular"),
            FontName::new("Inter", "Medium"),
            FontName::new("Inter", "Bold"),
            FontName::new("Roboto", "Regular"),
        ]
        .into_iter()
        .collect();

        Self {
            nodes: BTreeMap::new(),
            page: Vec::new(),
            selection: Vec::new(),
            next_id: 1,
            available_fonts,
            loaded_fonts: HashSet::new(),
            font_loads: 0,
            images: HashMap::new(),
            remote: HashMap::new(),
            fetched: Vec::new(),
            library: HashMap::new(),
            failing_types: HashSet::new(),
        }
    }

    pub fn add_font(&mut self, font: FontName) {
        self.available_fonts.insert(font);
    }

    pub fn remove_font(&mut self, font: &FontName) {
        self.available_fonts.remove(font);
        self.loaded_fonts.remove(font);
    }

    /// Serve `bytes` for `url` from `fetch`
    pub fn add_remote(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.remote.insert(url.into(), bytes);
    }

    /// Make every creation of `node_type` fail
    pub fn fail_creation_of(&mut self, node_type: NodeType) {
        self.failing_types.insert(node_type);
    }

    /// Create a detached component reachable only through `import_component_by_key`
    pub fn publish_library_component(&mut self, key: &str, name: &str) -> NodeId {
        let id = self.allocate(NodeType::Component);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = name.to_string();
            if let Some(component) = node.component.as_mut() {
                component.key = key.to_string();
            }
        }
        self.library.insert(key.to_string(), id);
        id
    }

    pub fn fetched_urls(&self) -> &[String] {
        &self.fetched
    }

    pub fn font_loads(&self) -> usize {
        self.font_loads
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn allocate(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let mut node = SceneNode::new(id, node_type);
        if let Some(component) = node.component.as_mut() {
            component.key = format!("{:016x}", fnv1a(format!("component:{}", id).as_bytes()));
        }
        self.nodes.insert(id, node);
        id
    }

    fn get(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(&id).ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(&id).ok_or_else(|| BridgeError::NodeNotFound(id.to_string()))
    }

    /// Unlink a node from its parent (or the page) without deleting it
    fn detach(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.page.retain(|c| *c != id),
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        while let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            if let Some(node) = self.nodes.get(&ids[cursor]) {
                ids.extend(node.children.iter().copied());
            }
            cursor += 1;
        }
        ids
    }

    /// Create a wrapper of `node_type` in place of `children` and move them into it
    fn wrap(
        &mut self,
        node_type: NodeType,
        children: &[NodeId],
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        if children.is_empty() {
            return Err(BridgeError::Host(format!("{} needs at least one node", node_type)));
        }
        for child in children {
            self.get(*child)?;
        }

        let siblings = self.children_of(parent);
        let index = if children.iter().all(|c| siblings.contains(c)) {
            children.iter().filter_map(|c| siblings.iter().position(|s| s == c)).min()
        } else {
            None
        };

        let wrapper = self.create_node(node_type)?;
        self.insert_child(parent, index, wrapper)?;
        for child in children {
            self.insert_child(Some(wrapper), None, *child)?;
        }

        let bounds = children
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .map(|n| (n.x, n.y, n.x + n.width(), n.y + n.height()))
            .fold(None, |acc: Option<(f64, f64, f64, f64)>, (x0, y0, x1, y1)| match acc {
                None => Some((x0, y0, x1, y1)),
                Some((a, b, c, d)) => Some((a.min(x0), b.min(y0), c.max(x1), d.max(y1))),
            });
        if let (Some((x0, y0, x1, y1)), Some(node)) = (bounds, self.nodes.get_mut(&wrapper)) {
            node.set_derived_bounds(x0, y0, x1 - x0, y1 - y0);
        }

        Ok(wrapper)
    }

    fn clone_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> Result<NodeId> {
        let template = self.get(source)?.clone();
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let mut copy = template.clone();
        copy.id = id;
        copy.parent = parent;
        copy.children = Vec::new();
        self.nodes.insert(id, copy);

        for child in template.children {
            let child_copy = self.clone_subtree(child, Some(id))?;
            self.get_mut(id)?.children.push(child_copy);
        }
        Ok(id)
    }

    fn ensure_font_loaded(&self, font: &FontName) -> Result<()> {
        if self.loaded_fonts.contains(font) {
            Ok(())
        } else {
            Err(BridgeError::FontUnavailable {
                family: font.family.clone(),
                style: font.style.clone(),
            })
        }
    }
}

impl Host for MemoryHost {
    fn create_node(&mut self, node_type: NodeType) -> Result<NodeId> {
        if self.failing_types.contains(&node_type) {
            return Err(BridgeError::Host(format!("cannot create {}", node_type)));
        }
        let id = self.allocate(node_type);
        self.page.push(id);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    fn page_children(&self) -> Vec<NodeId> {
        self.page.clone()
    }

    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, ids: &[NodeId]) {
        self.selection = ids.iter().copied().filter(|id| self.nodes.contains_key(id)).collect();
    }

    fn insert_child(
        &mut self,
        parent: Option<NodeId>,
        index: Option<usize>,
        child: NodeId,
    ) -> Result<()> {
        self.get(child)?;
        if let Some(parent_id) = parent {
            let parent_node = self.get(parent_id)?;
            if !parent_node.supports(Capability::Children) {
                return Err(unsupported(parent_node.node_type, Capability::Children));
            }
            if parent_id == child || self.is_ancestor(child, parent_id) {
                return Err(BridgeError::Host(format!(
                    "cannot move {} inside its own subtree",
                    child
                )));
            }
        }

        self.detach(child);
        let siblings = match parent {
            Some(parent_id) => &mut self.get_mut(parent_id)?.children,
            None => &mut self.page,
        };
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, child);
        self.get_mut(child)?.parent = parent;
        Ok(())
    }

    fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.get(id)?;
        self.detach(id);
        for removed in self.subtree(id) {
            self.nodes.remove(&removed);
        }
        let nodes = &self.nodes;
        self.selection.retain(|s| nodes.contains_key(s));
        self.library.retain(|_, v| nodes.contains_key(v));
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let parsed = id.parse::<NodeId>().ok()?;
        self.nodes.contains_key(&parsed).then_some(parsed)
    }

    fn group(&mut self, children: &[NodeId], parent: Option<NodeId>) -> Result<NodeId> {
        self.wrap(NodeType::Group, children, parent)
    }

    fn boolean_operation(
        &mut self,
        operation: BooleanOperationType,
        children: &[NodeId],
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.wrap(NodeType::BooleanOperation, children, parent)?;
        self.get_mut(id)?.boolean_operation = Some(operation);
        Ok(id)
    }

    fn combine_as_variants(
        &mut self,
        components: &[NodeId],
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        for id in components {
            if self.get(*id)?.node_type != NodeType::Component {
                return Err(BridgeError::Host(format!("{} is not a component", id)));
            }
        }
        self.wrap(NodeType::ComponentSet, components, parent)
    }

    fn create_instance(&mut self, component: NodeId) -> Result<NodeId> {
        let template = self.get(component)?.clone();
        if template.node_type != NodeType::Component {
            return Err(BridgeError::Component(format!("{} is not a component", component)));
        }

        let id = self.create_node(NodeType::Instance)?;
        let mut children = Vec::new();
        for child in &template.children {
            children.push(self.clone_subtree(*child, Some(id))?);
        }

        let instance = self.get_mut(id)?;
        instance.name = template.name.clone();
        instance.geometry = template.geometry.clone();
        instance.corners = template.corners.clone();
        instance.container = template.container.clone();
        instance.effects = template.effects.clone();
        instance.set_derived_bounds(0.0, 0.0, template.width(), template.height());
        instance.children = children;
        if let Some(content) = instance.instance.as_mut() {
            content.main_component = Some(component);
        }
        Ok(id)
    }

    fn set_instance_property(
        &mut self,
        instance: NodeId,
        key: &str,
        value: &JsonValue,
    ) -> Result<()> {
        let main = self
            .get(instance)?
            .instance
            .as_ref()
            .and_then(|i| i.main_component)
            .ok_or_else(|| BridgeError::Component(format!("{} is not an instance", instance)))?;

        let definitions = self
            .get(main)?
            .component
            .as_ref()
            .map(|c| c.property_definitions.clone())
            .unwrap_or_default();

        let (full_key, definition) = definitions
            .iter()
            .find(|(k, _)| k.as_str() == key || k.split('#').next() == Some(key))
            .ok_or_else(|| {
                BridgeError::Component(format!("no component property named {:?}", key))
            })?;

        let valid = match definition.property_type {
            ComponentPropertyType::Boolean => value.is_boolean(),
            ComponentPropertyType::Text | ComponentPropertyType::InstanceSwap => value.is_string(),
            ComponentPropertyType::Variant => match (value.as_str(), &definition.variant_options) {
                (Some(v), Some(options)) => options.iter().any(|o| o == v),
                (Some(_), None) => true,
                _ => false,
            },
        };
        if !valid {
            return Err(BridgeError::Component(format!(
                "value {} does not fit property {:?}",
                value, full_key
            )));
        }

        let record_id = instance.to_string();
        let content = self
            .get_mut(instance)?
            .instance
            .as_mut()
            .ok_or_else(|| BridgeError::Component(format!("{} is not an instance", instance)))?;
        content.property_values.insert(full_key.clone(), value.clone());
        if !content.overrides.iter().any(|o| o.id == record_id) {
            content.overrides.push(OverrideRecord {
                id: record_id,
                overridden_fields: vec!["componentProperties".to_string()],
            });
        }
        Ok(())
    }

    fn set_characters(&mut self, id: NodeId, characters: &str) -> Result<()> {
        let node = self.get(id)?;
        let text = node.text.as_ref().ok_or_else(|| unsupported(node.node_type, Capability::Text))?;
        self.ensure_font_loaded(&text.node_style().font_name.clone())?;
        if let Some(text) = self.get_mut(id)?.text.as_mut() {
            text.set_characters(characters);
        }
        Ok(())
    }

    fn set_font_name(&mut self, id: NodeId, font: &FontName) -> Result<()> {
        self.ensure_font_loaded(font)?;
        let node = self.get_mut(id)?;
        let node_type = node.node_type;
        let text = node.text.as_mut().ok_or_else(|| unsupported(node_type, Capability::Text))?;
        text.set_font_name(font);
        Ok(())
    }

    fn set_range_font_name(
        &mut self,
        id: NodeId,
        start: usize,
        end: usize,
        font: &FontName,
    ) -> Result<()> {
        self.ensure_font_loaded(font)?;
        let node = self.get_mut(id)?;
        let node_type = node.node_type;
        let text = node.text.as_mut().ok_or_else(|| unsupported(node_type, Capability::Text))?;
        text.update_range(start, end, |style| style.font_name = font.clone())
    }

    async fn load_font(&mut self, font: &FontName) -> Result<()> {
        self.font_loads += 1;
        if self.available_fonts.contains(font) {
            self.loaded_fonts.insert(font.clone());
            Ok(())
        } else {
            Err(BridgeError::FontUnavailable {
                family: font.family.clone(),
                style: font.style.clone(),
            })
        }
    }

    async fn create_image(&mut self, bytes: &[u8]) -> Result<String> {
        if sniff_image_format(bytes).is_none() {
            return Err(BridgeError::Image("unsupported image format".to_string()));
        }
        let hash = format!("{:016x}", fnv1a(bytes));
        self.images.insert(hash.clone(), bytes.to_vec());
        Ok(hash)
    }

    async fn has_image(&mut self, hash: &str) -> bool {
        self.images.contains_key(hash)
    }

    async fn image_bytes(&mut self, hash: &str) -> Result<Vec<u8>> {
        self.images
            .get(hash)
            .cloned()
            .ok_or_else(|| BridgeError::Image(format!("no image with hash {}", hash)))
    }

    async fn fetch(&mut self, url: &str) -> Result<Vec<u8>> {
        self.fetched.push(url.to_string());
        self.remote.get(url).cloned().ok_or_else(|| BridgeError::Fetch {
            url: url.to_string(),
            reason: "404 Not Found".to_string(),
        })
    }

    async fn import_component_by_key(&mut self, key: &str) -> Result<NodeId> {
        self.library
            .get(key)
            .copied()
            .ok_or_else(|| BridgeError::Component(format!("no library component with key {}", key)))
    }
}

/// Raster formats the canvas accepts, identified by magic bytes
pub fn sniff_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x100000001b3)
    })
}
