//! Node execution error types.

use thiserror::Error;

/// Errors that can occur during node execution.
///
/// Every variant aborts the whole invocation; nodes never return partial output.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Node kind not found in registry.
    #[error("Node not found: {0}")]
    NotFound(String),

    /// Invalid or unrecognized node parameter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value at a key path had an unsupported type.
    #[error("Type error: {message} [item {item_index}]")]
    Type { message: String, item_index: usize },

    /// Source payload could not be parsed.
    #[error("Parse error: {message} [item {item_index}]")]
    Parse { message: String, item_index: usize },

    /// Binary payload could not be retrieved or decoded.
    #[error("Binary data error: {0}")]
    BinaryData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl NodeError {
    /// Index of the item that caused the failure, when known.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            NodeError::Type { item_index, .. } | NodeError::Parse { item_index, .. } => {
                Some(*item_index)
            }
            _ => None,
        }
    }
}

impl From<std::io::Error> for NodeError {
    fn from(e: std::io::Error) -> Self {
        NodeError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::Json(e.to_string())
    }
}
