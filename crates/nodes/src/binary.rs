//! Binary payload retrieval.

use async_trait::async_trait;
use base64::prelude::*;

use crate::error::NodeError;
use crate::item::BinaryData;

/// Host-side storage of binary payloads.
#[async_trait]
pub trait BinaryDataStore: Send + Sync {
    /// Fetch the raw bytes behind a binary descriptor.
    async fn get_buffer(&self, item_index: usize, binary: &BinaryData) -> Result<Vec<u8>, NodeError>;
}

/// Store for payloads carried inline as base64 on the item itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineBinaryStore;

#[async_trait]
impl BinaryDataStore for InlineBinaryStore {
    async fn get_buffer(&self, item_index: usize, binary: &BinaryData) -> Result<Vec<u8>, NodeError> {
        if binary.data.is_empty() {
            if let Some(id) = &binary.id {
                return Err(NodeError::BinaryData(format!(
                    "Binary data {} for item {} is stored externally",
                    id, item_index
                )));
            }
        }

        BASE64_STANDARD.decode(binary.data.trim()).map_err(|e| {
            NodeError::BinaryData(format!("Invalid base64 data for item {}: {}", item_index, e))
        })
    }
}
