use crate::error::{BridgeError, Result};
use crate::schema::layout::{AutoLayout, Constraints, ExportSetting, Guide, LayoutChild};
use crate::schema::paint::{
    BlendMode, Effect, Fill, StrokeAlign, StrokeCap, StrokeJoin, Transform,
};
use crate::schema::text::TextProperties;
use crate::schema::vector::{ShapeProperties, VectorProperties};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanOperationType {
    Union,
    Intersect,
    Subtract,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentPropertyType {
    Boolean,
    Text,
    InstanceSwap,
    Variant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPropertyDefinition {
    #[serde(rename = "type")]
    pub property_type: ComponentPropertyType,
    pub default_value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_options: Option<Vec<String>>,
}

/// COMPONENT-only attributes, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_property_definitions: Option<BTreeMap<String, ComponentPropertyDefinition>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    pub id: String,
    pub overridden_fields: Vec<String>,
}

/// INSTANCE-only attributes, flattened into the node object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_properties: Option<BTreeMap<String, JsonValue>>,
    /// Host-derived override records; exported, never applied on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<OverrideRecord>>,
}

/// Serialized description of one canvas object and its subtree
///
/// Every attribute is optional on the wire; an absent attribute means "host
/// default". The exporter leaves out any value equal to its documented default
/// so the same tree survives an import/export round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignNode {
    /// Raw discriminant, canonicalized by `NodeType::normalize`
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_transform: Option<Transform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mask: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Fill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Fill>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_align: Option<StrokeAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_cap: Option<StrokeCap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_join: Option<StrokeJoin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_pattern: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_miter_limit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Effect>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_right_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_left_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_smoothing: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clips_content: Option<bool>,

    #[serde(flatten)]
    pub auto_layout: AutoLayout,
    #[serde(flatten)]
    pub layout_child: LayoutChild,

    /// Raw grid entries, parsed per entry when applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_grids: Option<Vec<JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guides: Option<Vec<Guide>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_settings: Option<Vec<ExportSetting>>,

    #[serde(flatten)]
    pub text: TextProperties,
    #[serde(flatten)]
    pub vector: VectorProperties,
    #[serde(flatten)]
    pub shape: ShapeProperties,
    #[serde(flatten)]
    pub component: ComponentProperties,
    #[serde(flatten)]
    pub instance: InstanceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_operation: Option<BooleanOperationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DesignNode>>,
    #[serde(rename = "_layerIndex", default, skip_serializing_if = "Option::is_none")]
    pub layer_index: Option<i64>,

    /// Wire properties left out by `DesignNode::from_value`, reported when applied
    #[serde(skip)]
    pub rejected: Vec<RejectedProperty>,
}

/// A property whose wire value did not fit the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedProperty {
    /// Wire name, with the entry index for list properties (`effects[1]`)
    pub property: String,
    pub reason: String,
}

impl DesignNode {
    pub fn new(node_type: &str) -> Self {
        Self {
            node_type: node_type.to_string(),
            ..Self::default()
        }
    }

    pub fn children(&self) -> &[DesignNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Children in intended z-order (bottom first)
    ///
    /// `_layerIndex` is authoritative; a child without one keeps its array
    /// position as its index. The sort is stable, so equal indices keep
    /// their array order.
    pub fn ordered_children(&self) -> Vec<&DesignNode> {
        order_by_layer_index(self.children())
    }

    pub fn has_independent_corners(&self) -> bool {
        self.top_left_radius.is_some()
            || self.top_right_radius.is_some()
            || self.bottom_left_radius.is_some()
            || self.bottom_right_radius.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Sort siblings by `_layerIndex`, falling back to array position; ties keep array order
pub fn order_by_layer_index(nodes: &[DesignNode]) -> Vec<&DesignNode> {
    let mut indexed: Vec<(i64, &DesignNode)> = nodes
        .iter()
        .enumerate()
        .map(|(position, node)| (node.layer_index.unwrap_or(position as i64), node))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, node)| node).collect()
}

/// Parse an import payload
///
/// Accepts either a JSON array of nodes or a single node object. Values that
/// do not fit a property are left out of their node and recorded in
/// `DesignNode::rejected`; a root entry that is not an object is skipped.
///
/// # Returns
/// * `Ok(Vec<DesignNode>)` - At least one node
/// * `Err(BridgeError)` - If the payload is not valid JSON, not node-shaped, or empty
pub fn parse_design_nodes(json: &str) -> Result<Vec<DesignNode>> {
    let value: JsonValue = serde_json::from_str(json)?;
    let items = match value {
        JsonValue::Array(items) => items,
        object @ JsonValue::Object(_) => vec![object],
        _ => return Err(BridgeError::EmptyInput("expected a node object or an array of nodes")),
    };

    let mut nodes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match DesignNode::from_value(item) {
            Ok(node) => nodes.push(node),
            Err(e) => warn!("Skipping root entry {}: {}", index, e),
        }
    }

    if nodes.is_empty() {
        return Err(BridgeError::EmptyInput("no nodes to import"));
    }

    Ok(nodes)
}

impl DesignNode {
    /// Build a node from wire JSON, one property at a time
    ///
    /// Each property is checked on its own. List properties keep the entries
    /// that fit and drop the others, so one unknown effect type does not cost
    /// the node its other effects. Children go through the same path.
    ///
    /// # Returns
    /// * `Ok(DesignNode)` - The node, with `rejected` listing what was left out
    /// * `Err(BridgeError)` - If `value` is not a JSON object
    pub fn from_value(value: JsonValue) -> Result<DesignNode> {
        let object = match value {
            JsonValue::Object(object) => object,
            other => {
                return Err(BridgeError::invalid(
                    "node",
                    format!("expected an object, found {}", other),
                ))
            }
        };

        let mut rejected = Vec::new();
        let mut accepted = JsonMap::new();
        let mut children = None;
        for (key, value) in object {
            if key == "children" {
                children = Some(value);
            } else if let Some(value) = accept_property(&key, value, &mut rejected) {
                accepted.insert(key, value);
            }
        }

        let mut node: DesignNode = serde_json::from_value(JsonValue::Object(accepted))?;
        node.children = match children {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Array(items)) => {
                let mut parsed = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    match DesignNode::from_value(item) {
                        Ok(child) => parsed.push(child),
                        Err(e) => rejected.push(RejectedProperty {
                            property: format!("children[{}]", index),
                            reason: e.to_string(),
                        }),
                    }
                }
                Some(parsed)
            }
            Some(_) => {
                rejected.push(RejectedProperty {
                    property: "children".to_string(),
                    reason: "expected an array".to_string(),
                });
                None
            }
        };
        node.rejected = rejected;
        Ok(node)
    }
}

/// Error from deserializing a node made of `key` alone, if any
fn misfit(key: &str, value: &JsonValue) -> Option<String> {
    let mut single = JsonMap::new();
    single.insert(key.to_string(), value.clone());
    serde_json::from_value::<DesignNode>(JsonValue::Object(single))
        .err()
        .map(|e| e.to_string())
}

/// `value` when it fits `key`, or the list entries of it that do
fn accept_property(
    key: &str,
    value: JsonValue,
    rejected: &mut Vec<RejectedProperty>,
) -> Option<JsonValue> {
    let Some(reason) = misfit(key, &value) else {
        return Some(value);
    };

    let items = match value {
        JsonValue::Array(items) => items,
        _ => {
            rejected.push(RejectedProperty {
                property: key.to_string(),
                reason,
            });
            return None;
        }
    };

    let mut kept = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let entry = JsonValue::Array(vec![item]);
        match misfit(key, &entry) {
            None => {
                if let JsonValue::Array(mut entry) = entry {
                    kept.append(&mut entry);
                }
            }
            Some(reason) => rejected.push(RejectedProperty {
                property: format!("{}[{}]", key, index),
                reason,
            }),
        }
    }

    let kept = JsonValue::Array(kept);
    match misfit(key, &kept) {
        None => Some(kept),
        Some(reason) => {
            rejected.push(RejectedProperty {
                property: key.to_string(),
                reason,
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::layout::LayoutMode;
    use serde_json::json;

    #[test]
    fn test_parse_flattened_blocks() {
        let node: DesignNode = serde_json::from_value(json!({
            "type": "FRAME",
            "name": "Card",
            "layoutMode": "VERTICAL",
            "itemSpacing": 8,
            "layoutGrow": 1,
            "mainComponentKey": "abc",
            "characters": "ignored for frames",
            "pointCount": 5,
            "_layerIndex": 3
        }))
        .unwrap();

        assert_eq!(node.auto_layout.layout_mode, Some(LayoutMode::Vertical));
        assert_eq!(node.auto_layout.item_spacing, Some(8.0));
        assert_eq!(node.layout_child.layout_grow, Some(1.0));
        assert_eq!(node.instance.main_component_key.as_deref(), Some("abc"));
        assert_eq!(node.text.characters.as_deref(), Some("ignored for frames"));
        assert_eq!(node.shape.point_count, Some(5));
        assert_eq!(node.layer_index, Some(3));
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let mut node = DesignNode::new("RECTANGLE");
        node.name = Some("Box".to_string());
        node.layer_index = Some(0);
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"type": "RECTANGLE", "name": "Box", "_layerIndex": 0})
        );
    }

    #[test]
    fn test_ordered_children_by_layer_index() {
        let node: DesignNode = serde_json::from_value(json!({
            "type": "FRAME",
            "children": [
                {"type": "RECTANGLE", "name": "top", "_layerIndex": 10},
                {"type": "RECTANGLE", "name": "bottom", "_layerIndex": -2},
                {"type": "RECTANGLE", "name": "middle", "_layerIndex": 4}
            ]
        }))
        .unwrap();

        let names: Vec<&str> = node.ordered_children().iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["bottom", "middle", "top"]);
    }

    #[test]
    fn test_ordered_children_without_index_keep_position() {
        let node: DesignNode = serde_json::from_value(json!({
            "type": "FRAME",
            "children": [
                {"type": "RECTANGLE", "name": "a"},
                {"type": "RECTANGLE", "name": "b"}
            ]
        }))
        .unwrap();
        let names: Vec<&str> = node.ordered_children().iter().map(|c| c.display_name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_design_nodes_accepts_object_and_array() {
        let single = parse_design_nodes(r#"{"type": "TEXT", "characters": "x"}"#).unwrap();
        assert_eq!(single.len(), 1);

        let many = parse_design_nodes(r#"[{"type": "FRAME"}, {"type": "ELLIPSE"}]"#).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_parse_design_nodes_rejects_empty_and_garbage() {
        assert!(matches!(
            parse_design_nodes("[]"),
            Err(BridgeError::EmptyInput(_))
        ));
        assert!(matches!(parse_design_nodes("42"), Err(BridgeError::EmptyInput(_))));
        assert!(matches!(parse_design_nodes("{not json"), Err(BridgeError::Json(_))));
    }

    #[test]
    fn test_misfit_values_are_rejected_per_property() {
        let nodes = parse_design_nodes(
            r#"{
                "type": "FRAME",
                "name": "Card",
                "blendMode": "PLUS_DARKER",
                "layoutMode": "GRID",
                "itemSpacing": 8,
                "effects": [
                    {"type": "NOISE"},
                    {"type": "LAYER_BLUR", "radius": 2}
                ],
                "children": [{"type": "RECTANGLE", "strokeCap": "DIAMOND_FILLED"}, 7]
            }"#,
        )
        .unwrap();

        let node = &nodes[0];
        assert_eq!(node.name.as_deref(), Some("Card"));
        assert_eq!(node.blend_mode, None);
        assert_eq!(node.auto_layout.layout_mode, None);
        assert_eq!(node.auto_layout.item_spacing, Some(8.0));
        assert_eq!(node.effects.as_ref().unwrap().len(), 1);

        let rejected: Vec<&str> = node.rejected.iter().map(|r| r.property.as_str()).collect();
        assert_eq!(rejected, vec!["blendMode", "effects[0]", "layoutMode", "children[1]"]);

        let child = &node.children()[0];
        assert_eq!(child.node_type, "RECTANGLE");
        assert_eq!(child.rejected[0].property, "strokeCap");
    }

    #[test]
    fn test_non_object_roots_are_skipped() {
        let nodes = parse_design_nodes(r#"["nope", {"type": "STAR"}]"#).unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].rejected.is_empty());
        assert!(matches!(parse_design_nodes("[1, 2]"), Err(BridgeError::EmptyInput(_))));
    }

    #[test]
    fn test_independent_corners_detection() {
        let mut node = DesignNode::new("RECTANGLE");
        node.corner_radius = Some(4.0);
        assert!(!node.has_independent_corners());
        node.bottom_left_radius = Some(2.0);
        assert!(node.has_independent_corners());
    }
}
