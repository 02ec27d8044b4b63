//! Join node: merges every input item into a single item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashMap;

use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{Batch, Item, NodeInputs, NodeOutput};
use crate::registry::{channel_names, check_channel_count, Node, NodeConfig};

/// Join node parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinConfig {
    /// Number of input channels to merge.
    #[serde(default = "default_number_inputs")]
    pub number_inputs: usize,
}

fn default_number_inputs() -> usize {
    2
}

/// Shallow-merges all items from all wired inputs, later keys winning.
pub struct JoinNode;

impl JoinNode {
    /// Create a new Join node.
    pub fn new() -> Self {
        Self
    }

    /// Merge items in order into a single item.
    ///
    /// The provenance of the first item is kept only when more than one item
    /// was merged.
    pub fn merge(items: Batch) -> Item {
        let paired_item = match items.len() {
            0 | 1 => None,
            _ => items[0].paired_item.clone(),
        };

        let mut json = Map::new();
        let mut binary = HashMap::new();
        for item in items {
            json.extend(item.json);
            if let Some(b) = item.binary {
                binary.extend(b);
            }
        }

        Item {
            json,
            binary: (!binary.is_empty()).then_some(binary),
            paired_item,
        }
    }
}

impl Default for JoinNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for JoinNode {
    fn name(&self) -> &'static str {
        "join"
    }

    fn input_names(&self, config: &NodeConfig) -> Result<Vec<String>, NodeError> {
        let params: JoinConfig = config.parse()?;
        let count = check_channel_count("numberInputs", params.number_inputs)?;
        Ok(channel_names("Input", count))
    }

    async fn execute(
        &self,
        mut inputs: NodeInputs,
        config: &NodeConfig,
        _ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let params: JoinConfig = config.parse()?;
        let count = check_channel_count("numberInputs", params.number_inputs)?;

        let mut all_items = Vec::new();
        for index in 0..count {
            if !inputs.is_connected(index) {
                tracing::trace!(input = index, "Input not connected, skipping");
                continue;
            }
            all_items.extend(inputs.take(index));
        }

        tracing::debug!(inputs = count, items = all_items.len(), "Joining items");

        Ok(NodeOutput::single(vec![Self::merge(all_items)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{BinaryData, PairedItem, PairedItemData};
    use serde_json::json;

    fn paired(index: usize, input: usize) -> PairedItem {
        PairedItem::Single(PairedItemData { item: index, input: Some(input) })
    }

    async fn run(inputs: NodeInputs, params: serde_json::Value) -> Result<NodeOutput, NodeError> {
        JoinNode::new()
            .execute(inputs, &NodeConfig::new("join", params), &InvocationContext::default())
            .await
    }

    #[tokio::test]
    async fn test_single_item_has_no_provenance() {
        let inputs = NodeInputs::single(vec![Item::new(json!({"a": 1})).with_paired_item(paired(0, 0))]);
        let output = run(inputs, json!({"numberInputs": 1})).await.unwrap();
        let batch = output.channel(0).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].json_value(), json!({"a": 1}));
        assert!(batch[0].paired_item.is_none());
        assert!(batch[0].binary.is_none());
    }

    #[tokio::test]
    async fn test_later_inputs_overwrite() {
        let inputs = NodeInputs::from_batches(vec![
            vec![Item::new(json!({"a": 1})).with_paired_item(paired(0, 0))],
            vec![Item::new(json!({"a": 2, "b": 3})).with_paired_item(paired(0, 1))],
        ]);
        let output = run(inputs, json!({"numberInputs": 2})).await.unwrap();
        let batch = output.channel(0).unwrap();

        assert_eq!(batch[0].json_value(), json!({"a": 2, "b": 3}));
        assert_eq!(batch[0].paired_item, Some(paired(0, 0)));
    }

    #[tokio::test]
    async fn test_unwired_inputs_are_empty() {
        let inputs = NodeInputs::new(vec![
            None,
            Some(vec![Item::new(json!({"x": 1})), Item::new(json!({"y": 2}))]),
        ]);
        let output = run(inputs, json!({"numberInputs": 3})).await.unwrap();
        assert_eq!(output.channel(0).unwrap()[0].json_value(), json!({"x": 1, "y": 2}));
    }

    #[tokio::test]
    async fn test_extra_channels_ignored() {
        let inputs = NodeInputs::from_batches(vec![
            vec![Item::new(json!({"a": 1}))],
            vec![Item::new(json!({"a": 2}))],
        ]);
        let output = run(inputs, json!({"numberInputs": 1})).await.unwrap();
        assert_eq!(output.channel(0).unwrap()[0].json_value(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_binary_merge() {
        let inputs = NodeInputs::from_batches(vec![
            vec![Item::new(json!({})).with_binary("file", BinaryData::new("YQ==", "text/plain"))],
            vec![
                Item::new(json!({})).with_binary("file", BinaryData::new("Yg==", "text/plain")),
                Item::new(json!({})).with_binary("other", BinaryData::new("Yw==", "text/plain")),
            ],
        ]);
        let output = run(inputs, json!({})).await.unwrap();
        let item = &output.channel(0).unwrap()[0];

        assert_eq!(item.binary("file").unwrap().data, "Yg==");
        assert_eq!(item.binary("other").unwrap().data, "Yw==");
    }

    #[tokio::test]
    async fn test_no_items() {
        let output = run(NodeInputs::default(), json!({})).await.unwrap();
        let batch = output.channel(0).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].json.is_empty());
    }

    #[tokio::test]
    async fn test_number_inputs_out_of_range() {
        let result = run(NodeInputs::default(), json!({"numberInputs": 11})).await;
        assert!(matches!(result, Err(NodeError::Configuration(_))));
    }

    #[test]
    fn test_input_names() {
        let node = JoinNode::new();
        let names = node
            .input_names(&NodeConfig::new("join", json!({"numberInputs": 3})))
            .unwrap();
        assert_eq!(names, vec!["Input 1", "Input 2", "Input 3"]);

        let names = node.input_names(&NodeConfig::new("join", json!({}))).unwrap();
        assert_eq!(names.len(), 2);
    }
}
