use crate::error::Result;
use crate::import::helpers::{apply_common, apply_size, guarded};
use crate::import::{Importer, PendingInstance};
use crate::scene::host::Host;
use crate::scene::node::{unsupported, Capability, NodeId};
use crate::schema::node::BooleanOperationType;
use crate::schema::{DesignNode, NodeType};
use tracing::{debug, warn};

/// Outcome of looking up the main component of an instance
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Component(NodeId),
    /// Declared later in the same import; wait for it
    Deferred(String),
    Unresolved,
}

impl<'t, H: Host> Importer<'t, H> {
    /// Components are frames that register themselves, then settle the
    /// instances that were waiting for their key
    pub(crate) async fn create_component(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.create_container(NodeType::Component, design, parent).await?;

        let node = self.node_mut(id)?;
        let node_type = node.node_type;
        let content = node
            .component
            .as_mut()
            .ok_or_else(|| unsupported(node_type, Capability::Component))?;
        if let Some(description) = &design.component.description {
            content.description = description.clone();
        }
        if let Some(definitions) = &design.component.component_property_definitions {
            content.property_definitions = definitions.clone();
        }
        if let Some(key) = &design.component.key {
            content.key = key.clone();
        }
        let key = content.key.clone();

        for pending in self.registry.register(&key, id) {
            self.materialize_pending(pending, Some(id)).await;
        }
        Ok(id)
    }

    /// Variants are built in a staging frame; only COMPONENT children survive
    pub(crate) async fn create_component_set(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let staging = self.spawn(NodeType::Frame, parent)?;
        let children = self.create_children(design, staging).await;
        let mut components = Vec::new();
        for child in children {
            let is_component = self
                .host
                .node(child)
                .is_some_and(|n| n.node_type == NodeType::Component);
            if is_component {
                components.push(child);
            } else {
                warn!(
                    "Dropping non-component child {} of component set {:?}",
                    child,
                    design.display_name()
                );
                self.host.remove_node(child)?;
            }
        }

        if components.is_empty() {
            warn!(
                "Component set {:?} has no components, substituting a frame",
                design.display_name()
            );
            return self.settle_as_frame(staging, design, true).await;
        }

        let set = match self.host.combine_as_variants(&components, parent) {
            Ok(set) => set,
            Err(e) => {
                self.host.remove_node(staging)?;
                return Err(e);
            }
        };
        self.host.remove_node(staging)?;
        self.apply_base(set, design)?;
        self.apply_paints(set, design).await?;
        Ok(set)
    }

    /// Instances resolve their component by key, then by id, then from the library
    ///
    /// A key declared elsewhere in the same import gets a placeholder frame
    /// that is swapped for the instance once the component exists. An
    /// instance with no reachable component becomes a frame holding its own
    /// children.
    pub(crate) async fn create_instance(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        match self.resolve_component(design, self.deferral_open).await {
            Resolution::Component(component) => self.instantiate(component, design, parent).await,
            Resolution::Deferred(key) => {
                let placeholder = self.spawn(NodeType::Frame, parent)?;
                let node = self.node_mut(placeholder)?;
                guarded(node, design, "common", apply_common);
                guarded(node, design, "size", apply_size);
                debug!("Instance {:?} waits for component {}", design.display_name(), key);
                self.registry.defer(PendingInstance {
                    key,
                    design: design.clone(),
                    placeholder,
                });
                Ok(placeholder)
            }
            Resolution::Unresolved => {
                warn!(
                    "No component found for instance {:?}, substituting a frame",
                    design.display_name()
                );
                self.create_container(NodeType::Frame, design, parent).await
            }
        }
    }

    async fn resolve_component(&mut self, design: &DesignNode, allow_defer: bool) -> Resolution {
        let key = design.instance.main_component_key.as_deref();

        if let Some(key) = key {
            if let Some(id) = self.registry.lookup(key).filter(|id| self.is_component(*id)) {
                return Resolution::Component(id);
            }
            if allow_defer && self.registry.is_expected(key) {
                return Resolution::Deferred(key.to_string());
            }
        }

        if let Some(id) = design
            .instance
            .main_component_id
            .as_deref()
            .and_then(|raw| self.host.find_by_id(raw))
            .filter(|id| self.is_component(*id))
        {
            return Resolution::Component(id);
        }

        if let Some(key) = key {
            match self.host.import_component_by_key(key).await {
                Ok(id) => return Resolution::Component(id),
                Err(e) => debug!("Library import of {} failed: {}", key, e),
            }
        }
        Resolution::Unresolved
    }

    fn is_component(&self, id: NodeId) -> bool {
        self.host
            .node(id)
            .is_some_and(|n| n.node_type == NodeType::Component)
    }

    /// Create an instance of `component` on top of `parent` and apply `design`
    async fn instantiate(
        &mut self,
        component: NodeId,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.host.create_instance(component)?;
        if let Err(e) = self.host.insert_child(parent, None, id) {
            self.host.remove_node(id)?;
            return Err(e);
        }
        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;

        for (key, value) in design.instance.component_properties.iter().flatten() {
            if let Err(e) = self.host.set_instance_property(id, key, value) {
                warn!(
                    "Skipping component property {:?} on {:?}: {}",
                    key,
                    design.display_name(),
                    e
                );
            }
        }
        Ok(id)
    }

    /// Replace a placeholder frame with the real instance, in the same slot
    ///
    /// With `component` unset the request goes through the remaining
    /// fallbacks: id lookup, library import, then a frame.
    pub(crate) async fn materialize_pending(
        &mut self,
        pending: PendingInstance,
        component: Option<NodeId>,
    ) {
        let placeholder = pending.placeholder;
        let Some(slot) = self.host.node(placeholder).map(|n| n.parent) else {
            warn!(
                "Placeholder {} for {:?} disappeared, dropping the instance",
                placeholder,
                pending.design.display_name()
            );
            return;
        };
        let index = self.host.index_in_parent(placeholder);
        let before = self.snapshot(slot);

        let created = match component {
            Some(component) => match self.instantiate(component, &pending.design, slot).await {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(
                        "Failed to instantiate {} for {:?}: {}",
                        pending.key,
                        pending.design.display_name(),
                        e
                    );
                    self.remove_strays(slot, &before);
                    None
                }
            },
            None => self.create_node(&pending.design, slot).await,
        };

        if let Some(id) = created {
            if let Err(e) = self.host.insert_child(slot, index, id) {
                warn!("Could not move {} into the placeholder slot: {}", id, e);
            }
            self.replaced.insert(placeholder, id);
        }
        if let Err(e) = self.host.remove_node(placeholder) {
            warn!("Could not remove placeholder {}: {}", placeholder, e);
        }
    }

    /// Boolean operations need at least two operands; otherwise the staging
    /// frame stands in and the host operation is never called
    pub(crate) async fn create_boolean_operation(
        &mut self,
        design: &DesignNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId> {
        let staging = self.spawn(NodeType::Frame, parent)?;
        let children = self.create_children(design, staging).await;

        if children.len() < 2 {
            warn!(
                "Boolean operation {:?} has {} operand(s), substituting a frame",
                design.display_name(),
                children.len()
            );
            return self.settle_as_frame(staging, design, false).await;
        }

        let operation = design.boolean_operation.unwrap_or(BooleanOperationType::Union);
        let id = match self.host.boolean_operation(operation, &children, parent) {
            Ok(id) => id,
            Err(e) => {
                self.host.remove_node(staging)?;
                return Err(e);
            }
        };
        self.host.remove_node(staging)?;
        self.apply_base(id, design)?;
        self.apply_paints(id, design).await?;
        Ok(id)
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
    use crate::schema::node::BooleanOperationType;
    use crate::schema::{DesignNode, NodeType};
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

        fn node_type(&self, id: NodeId) -> NodeType {
            self.host.node(id).unwrap().node_type
        }
    }

    #[test]
    fn test_component_keeps_explicit_key_and_definitions() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "COMPONENT",
            "name": "Button",
            "key": "btn",
            "description": "Primary action",
            "componentPropertyDefinitions": {
                "Label#1:0": {"type": "TEXT", "defaultValue": "OK"}
            },
            "children": [{"type": "RECTANGLE"}]
        }]));

        let component = fixture.host.node(created[0]).unwrap().component.clone().unwrap();
        assert_eq!(component.key, "btn");
        assert_eq!(component.description, "Primary action");
        assert!(component.property_definitions.contains_key("Label#1:0"));
        assert_eq!(fixture.registry.lookup("btn"), Some(created[0]));
    }

    #[test]
    fn test_instance_before_component_is_deferred_into_its_slot() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([
            {"type": "FRAME", "name": "Screen", "children": [
                {"type": "RECTANGLE", "name": "background"},
                {"type": "INSTANCE", "name": "cta", "mainComponentKey": "btn",
                 "componentProperties": {"Label": "Buy"}},
                {"type": "RECTANGLE", "name": "overlay"}
            ]},
            {"type": "COMPONENT", "key": "btn",
             "componentPropertyDefinitions": {
                "Label#1:0": {"type": "TEXT", "defaultValue": "OK"}
             }}
        ]));

        assert_eq!(created.len(), 2);
        let screen = fixture.host.node(created[0]).unwrap();
        assert_eq!(screen.children.len(), 3);
        let instance = fixture.host.node(screen.children[1]).unwrap();
        assert_eq!(instance.node_type, NodeType::Instance);
        assert_eq!(instance.name, "cta");
        let content = instance.instance.as_ref().unwrap();
        assert_eq!(content.main_component, Some(created[1]));
        assert_eq!(content.property_values.get("Label#1:0"), Some(&json!("Buy")));
        assert_eq!(fixture.registry.pending_count(), 0);
    }

    #[test]
    fn test_bad_component_property_does_not_block_the_rest() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([
            {"type": "COMPONENT", "key": "btn",
             "componentPropertyDefinitions": {
                "Label#1:0": {"type": "TEXT", "defaultValue": "OK"},
                "Icon#2:0": {"type": "BOOLEAN", "defaultValue": true}
             }},
            {"type": "INSTANCE", "mainComponentKey": "btn",
             "componentProperties": {"Bogus": 1, "Icon": "notbool", "Label": "Buy"}}
        ]));

        let instance = fixture.host.node(created[1]).unwrap();
        let values = &instance.instance.as_ref().unwrap().property_values;
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("Label#1:0"), Some(&json!("Buy")));
    }

    #[test]
    fn test_supplied_override_records_are_not_applied() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([
            {"type": "COMPONENT", "key": "chip"},
            {"type": "INSTANCE", "mainComponentKey": "chip",
             "overrides": [{"id": "9:9", "overriddenFields": ["fills"]}]}
        ]));
        let instance = fixture.host.node(created[1]).unwrap();
        assert!(instance.instance.as_ref().unwrap().overrides.is_empty());
    }

    #[test]
    fn test_deferred_root_instance_reports_real_node() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([
            {"type": "INSTANCE", "mainComponentKey": "card"},
            {"type": "COMPONENT", "key": "card"}
        ]));
        assert_eq!(created.len(), 2);
        assert_eq!(fixture.node_type(created[0]), NodeType::Instance);
        assert_eq!(fixture.host.page_children(), created);
    }

    #[test]
    fn test_instance_by_component_id() {
        let mut fixture = Fixture::new();
        let first = fixture.import(json!([{"type": "COMPONENT", "name": "Chip"}]));
        let created = fixture.import(json!([
            {"type": "INSTANCE", "mainComponentId": first[0].to_string()}
        ]));
        let instance = fixture.host.node(created[0]).unwrap();
        assert_eq!(instance.instance.as_ref().unwrap().main_component, Some(first[0]));
    }

    #[test]
    fn test_explicit_key_wins_over_component_id() {
        let mut fixture = Fixture::new();
        let by_id = fixture.import(json!([{"type": "COMPONENT"}]));
        let created = fixture.import(json!([
            {"type": "COMPONENT", "key": "wanted"},
            {"type": "INSTANCE", "mainComponentKey": "wanted",
             "mainComponentId": by_id[0].to_string()}
        ]));
        let instance = fixture.host.node(created[1]).unwrap();
        assert_eq!(instance.instance.as_ref().unwrap().main_component, Some(created[0]));
    }

    #[test]
    fn test_instance_from_library() {
        let mut fixture = Fixture::new();
        let library = fixture.host.publish_library_component("lib", "Avatar");
        let created = fixture.import(json!([{"type": "INSTANCE", "mainComponentKey": "lib"}]));
        let instance = fixture.host.node(created[0]).unwrap();
        assert_eq!(instance.instance.as_ref().unwrap().main_component, Some(library));
        assert_eq!(instance.name, "Avatar");
    }

    #[test]
    fn test_unresolved_instance_becomes_frame_with_children() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "INSTANCE",
            "name": "Orphan",
            "mainComponentKey": "missing",
            "children": [{"type": "TEXT", "characters": "hi"}, {"type": "RECTANGLE"}]
        }]));
        let frame = fixture.host.node(created[0]).unwrap();
        assert_eq!(frame.node_type, NodeType::Frame);
        assert_eq!(frame.name, "Orphan");
        assert_eq!(frame.children.len(), 2);
    }

    #[test]
    fn test_component_set_keeps_only_components() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "COMPONENT_SET",
            "name": "Buttons",
            "children": [
                {"type": "COMPONENT", "name": "State=Default"},
                {"type": "RECTANGLE", "name": "stray"},
                {"type": "COMPONENT", "name": "State=Hover"}
            ]
        }]));
        assert_eq!(created.len(), 1);
        let set = fixture.host.node(created[0]).unwrap();
        assert_eq!(set.node_type, NodeType::ComponentSet);
        assert_eq!(set.name, "Buttons");
        assert_eq!(set.children.len(), 2);
        assert_eq!(fixture.host.page_children(), created);
    }

    #[test]
    fn test_component_set_without_components_is_frame() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "COMPONENT_SET",
            "children": [{"type": "ELLIPSE"}]
        }]));
        let node = fixture.host.node(created[0]).unwrap();
        assert_eq!(node.node_type, NodeType::Frame);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_boolean_operation_with_operands() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "BOOLEAN_OPERATION",
            "booleanOperation": "SUBTRACT",
            "children": [{"type": "RECTANGLE"}, {"type": "ELLIPSE"}]
        }]));
        let node = fixture.host.node(created[0]).unwrap();
        assert_eq!(node.node_type, NodeType::BooleanOperation);
        assert_eq!(node.boolean_operation, Some(BooleanOperationType::Subtract));
        assert_eq!(node.children.len(), 2);
        assert_eq!(fixture.host.page_children(), created);
    }

    #[test]
    fn test_boolean_operation_with_one_operand_is_frame() {
        let mut fixture = Fixture::new();
        let created = fixture.import(json!([{
            "type": "BOOLEAN_OPERATION",
            "name": "Cut",
            "children": [{"type": "RECTANGLE"}]
        }]));
        let node = fixture.host.node(created[0]).unwrap();
        assert_eq!(node.node_type, NodeType::Frame);
        assert_eq!(node.name, "Cut");
        assert_eq!(node.children.len(), 1);
        assert!(!node.container.as_ref().unwrap().clips_content);
    }
}
