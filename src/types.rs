use crate::scene::node::NodeId;
use crate::schema::DesignNode;
use serde::Serialize;

/// Result of one import call, reported to the command layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    /// Live roots created by the call, in z-order
    pub created: Vec<NodeId>,
}

impl ImportOutcome {
    /// Create a successful outcome
    pub fn success(created: Vec<NodeId>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            created,
        }
    }

    /// Create a failed outcome; nothing was created
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            created: Vec::new(),
        }
    }
}

/// Result of one export call, reported to the command layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub success: bool,
    pub message: String,
    pub nodes: Vec<DesignNode>,
}

impl ExportOutcome {
    pub fn success(nodes: Vec<DesignNode>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            nodes,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            nodes: Vec::new(),
        }
    }
}
