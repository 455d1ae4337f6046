use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Unknown node type: {0:?}")]
    UnknownNodeType(String),

    #[error("Node {0} not found in the scene")]
    NodeNotFound(String),

    #[error("{node_type} nodes do not support {capability}")]
    Unsupported {
        node_type: String,
        capability: &'static str,
    },

    #[error("Invalid {property}: {reason}")]
    InvalidProperty {
        property: &'static str,
        reason: String,
    },

    #[error("Font {family} {style} could not be loaded")]
    FontUnavailable { family: String, style: String },

    #[error("Image error: {0}")]
    Image(String),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Component error: {0}")]
    Component(String),

    #[error("Host rejected operation: {0}")]
    Host(String),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BridgeError {
    pub fn invalid(property: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidProperty {
            property,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
