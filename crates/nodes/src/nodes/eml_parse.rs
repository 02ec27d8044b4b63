//! EmlParse node: parses raw email messages into structured records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::binary::{BinaryDataStore, InlineBinaryStore};
use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{Item, NodeInputs, NodeOutput};
use crate::key_path::{DotPathResolver, KeyPathResolver, LiteralKeyResolver};
use crate::mail::{MailParser, MimeParser};
use crate::registry::{Node, NodeConfig};
use crate::value::type_name;

/// EmlParse node parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmlParseConfig {
    /// Binary key or JSON key path holding the raw message.
    #[serde(default = "default_source_key")]
    pub source_key: String,

    #[serde(default)]
    pub options: EmlParseOptions,
}

/// Optional EmlParse settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmlParseOptions {
    /// Treat the source key as a literal top-level field name.
    #[serde(default)]
    pub disable_dot_notation: bool,
}

fn default_source_key() -> String {
    "data".to_string()
}

/// Parses one message per input item.
///
/// A binary payload under the source key takes priority over a JSON field of
/// the same name.
pub struct EmlParseNode {
    binary_store: Arc<dyn BinaryDataStore>,
    parser: Arc<dyn MimeParser>,
}

impl EmlParseNode {
    /// Create a node reading inline binary data with the default parser.
    pub fn new() -> Self {
        Self {
            binary_store: Arc::new(InlineBinaryStore),
            parser: Arc::new(MailParser),
        }
    }

    /// Use a different binary data store.
    pub fn with_binary_store(mut self, store: Arc<dyn BinaryDataStore>) -> Self {
        self.binary_store = store;
        self
    }

    /// Use a different MIME parser.
    pub fn with_parser(mut self, parser: Arc<dyn MimeParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Raw message bytes for one item.
    async fn source_bytes(
        &self,
        item: &Item,
        item_index: usize,
        params: &EmlParseConfig,
    ) -> Result<Vec<u8>, NodeError> {
        if let Some(binary) = item.binary(&params.source_key) {
            return self.binary_store.get_buffer(item_index, binary).await;
        }

        let source = if params.options.disable_dot_notation {
            LiteralKeyResolver.resolve(&item.json, &params.source_key)
        } else {
            DotPathResolver.resolve(&item.json, &params.source_key)
        };

        json_bytes(source).ok_or_else(|| NodeError::Type {
            message: format!(
                "Source value for key \"{}\" must be a string or buffer, got {}",
                params.source_key,
                type_name(source)
            ),
            item_index,
        })
    }
}

/// Bytes from a string, a byte array, or a serialized `{type: "Buffer", data}`.
fn json_bytes(value: Option<&Value>) -> Option<Vec<u8>> {
    match value? {
        Value::String(s) => Some(s.as_bytes().to_vec()),
        Value::Array(values) => values
            .iter()
            .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("Buffer") => {
            json_bytes(map.get("data"))
        }
        _ => None,
    }
}

impl Default for EmlParseNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for EmlParseNode {
    fn name(&self) -> &'static str {
        "emlParse"
    }

    async fn execute(
        &self,
        mut inputs: NodeInputs,
        config: &NodeConfig,
        _ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let params: EmlParseConfig = config.parse()?;
        let items = inputs.take(0);

        tracing::debug!(
            source_key = %params.source_key,
            disable_dot_notation = params.options.disable_dot_notation,
            items = items.len(),
            "Parsing EML messages"
        );

        let mut output = Vec::with_capacity(items.len());
        for (item_index, item) in items.iter().enumerate() {
            let raw = self.source_bytes(item, item_index, &params).await?;
            let parsed = self
                .parser
                .parse(&raw)
                .map_err(|message| NodeError::Parse { message, item_index })?;
            output.push(Item::new(Value::Object(parsed)));
        }

        Ok(NodeOutput::single(output))
    }
}
