use crate::error::{BridgeError, Result};
use crate::schema::node::DesignNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a design node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Frame,
    Group,
    Section,
    Rectangle,
    Ellipse,
    Line,
    Polygon,
    Star,
    Vector,
    Text,
    Component,
    ComponentSet,
    Instance,
    BooleanOperation,
}

impl NodeType {
    pub const ALL: [NodeType; 14] = [
        NodeType::Frame,
        NodeType::Group,
        NodeType::Section,
        NodeType::Rectangle,
        NodeType::Ellipse,
        NodeType::Line,
        NodeType::Polygon,
        NodeType::Star,
        NodeType::Vector,
        NodeType::Text,
        NodeType::Component,
        NodeType::ComponentSet,
        NodeType::Instance,
        NodeType::BooleanOperation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Frame => "FRAME",
            NodeType::Group => "GROUP",
            NodeType::Section => "SECTION",
            NodeType::Rectangle => "RECTANGLE",
            NodeType::Ellipse => "ELLIPSE",
            NodeType::Line => "LINE",
            NodeType::Polygon => "POLYGON",
            NodeType::Star => "STAR",
            NodeType::Vector => "VECTOR",
            NodeType::Text => "TEXT",
            NodeType::Component => "COMPONENT",
            NodeType::ComponentSet => "COMPONENT_SET",
            NodeType::Instance => "INSTANCE",
            NodeType::BooleanOperation => "BOOLEAN_OPERATION",
        }
    }

    /// Canonicalize the raw `type` tag of a node
    ///
    /// Accepts any casing, `-` or spaces in place of `_`, and a handful of
    /// aliases produced by other exporters. An empty tag is inferred from the
    /// node's payload: characters make it TEXT, children make it FRAME, vector
    /// data makes it VECTOR, anything else is a RECTANGLE.
    ///
    /// # Arguments
    /// * `raw` - The tag as found on the wire
    /// * `node` - The node carrying the tag, used for inference
    ///
    /// # Returns
    /// * `Ok(NodeType)` - The canonical discriminant
    /// * `Err(BridgeError::UnknownNodeType)` - If the tag names no known type
    pub fn normalize(raw: &str, node: &DesignNode) -> Result<NodeType> {
        let canonical: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();

        if canonical.is_empty() {
            return Ok(infer_from_payload(node));
        }

        if let Some(node_type) = NodeType::ALL.iter().find(|t| t.as_str() == canonical) {
            return Ok(*node_type);
        }

        let aliased = match canonical.as_str() {
            "RECT" => Some(NodeType::Rectangle),
            "CIRCLE" | "OVAL" => Some(NodeType::Ellipse),
            "PATH" => Some(NodeType::Vector),
            "CONTAINER" => Some(NodeType::Frame),
            "BOOLEAN" | "BOOLEAN_OP" | "BOOLEANOPERATION" => Some(NodeType::BooleanOperation),
            "COMPONENTSET" | "VARIANTS" => Some(NodeType::ComponentSet),
            _ => None,
        };

        aliased.ok_or_else(|| BridgeError::UnknownNodeType(raw.to_string()))
    }

    /// Types whose creation yields a container able to hold children directly
    pub fn holds_children(self) -> bool {
        matches!(
            self,
            NodeType::Frame
                | NodeType::Group
                | NodeType::Section
                | NodeType::Component
                | NodeType::ComponentSet
                | NodeType::Instance
                | NodeType::BooleanOperation
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn infer_from_payload(node: &DesignNode) -> NodeType {
    if node.text.characters.is_some() {
        NodeType::Text
    } else if !node.children().is_empty() {
        NodeType::Frame
    } else if node.vector.vector_paths.is_some() || node.vector.vector_network.is_some() {
        NodeType::Vector
    } else {
        NodeType::Rectangle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> DesignNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_canonical_names_pass_through() {
        let empty = DesignNode::default();
        for node_type in NodeType::ALL {
            assert_eq!(NodeType::normalize(node_type.as_str(), &empty).unwrap(), node_type);
        }
    }

    #[test]
    fn test_case_and_separator_insensitive() {
        let empty = DesignNode::default();
        assert_eq!(NodeType::normalize(" frame ", &empty).unwrap(), NodeType::Frame);
        assert_eq!(
            NodeType::normalize("boolean-operation", &empty).unwrap(),
            NodeType::BooleanOperation
        );
        assert_eq!(
            NodeType::normalize("Component Set", &empty).unwrap(),
            NodeType::ComponentSet
        );
    }

    #[test]
    fn test_aliases() {
        let empty = DesignNode::default();
        assert_eq!(NodeType::normalize("rect", &empty).unwrap(), NodeType::Rectangle);
        assert_eq!(NodeType::normalize("circle", &empty).unwrap(), NodeType::Ellipse);
        assert_eq!(NodeType::normalize("path", &empty).unwrap(), NodeType::Vector);
        assert_eq!(
            NodeType::normalize("BOOLEAN", &empty).unwrap(),
            NodeType::BooleanOperation
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = NodeType::normalize("WIDGET", &DesignNode::default()).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownNodeType(ref t) if t == "WIDGET"));
    }

    #[test]
    fn test_missing_type_is_inferred() {
        let text = node(json!({"characters": "hi"}));
        assert_eq!(NodeType::normalize("", &text).unwrap(), NodeType::Text);

        let parent = node(json!({"children": [{"type": "RECTANGLE"}]}));
        assert_eq!(NodeType::normalize("", &parent).unwrap(), NodeType::Frame);

        let path = node(json!({"vectorPaths": [{"data": "M 0 0 L 1 1"}]}));
        assert_eq!(NodeType::normalize("", &path).unwrap(), NodeType::Vector);

        assert_eq!(
            NodeType::normalize("", &DesignNode::default()).unwrap(),
            NodeType::Rectangle
        );
    }
}
