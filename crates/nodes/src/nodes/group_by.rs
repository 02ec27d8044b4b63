//! GroupBy node: partitions items by the string value of a key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{Batch, Item, NodeInputs, NodeOutput};
use crate::key_path;
use crate::registry::{Node, NodeConfig};
use crate::value::stringify;

/// GroupBy node parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByConfig {
    /// Key path whose value selects the group.
    #[serde(default = "default_key_on")]
    pub key_on: String,

    /// Output shape, one of `streamElements`, `objectWithItems`, `objectEntries`.
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_key_on() -> String {
    "id".to_string()
}

fn default_output_format() -> String {
    OutputFormat::StreamElements.as_str().to_string()
}

/// Output shape of a GroupBy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One output item per group.
    StreamElements,
    /// A single item mapping each key to its items' bodies.
    ObjectWithItems,
    /// A single item with an `items` array of `{key, values}` entries.
    ObjectEntries,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::StreamElements => "streamElements",
            OutputFormat::ObjectWithItems => "objectWithItems",
            OutputFormat::ObjectEntries => "objectEntries",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streamElements" => Ok(OutputFormat::StreamElements),
            "objectWithItems" => Ok(OutputFormat::ObjectWithItems),
            "objectEntries" => Ok(OutputFormat::ObjectEntries),
            other => Err(NodeError::Configuration(format!(
                "Unknown output format: {}",
                other
            ))),
        }
    }
}

/// Groups in first-seen order.
#[derive(Debug, Default)]
struct Groups {
    order: Vec<String>,
    members: HashMap<String, Vec<Item>>,
}

impl Groups {
    fn push(&mut self, key: String, item: Item) {
        match self.members.get_mut(&key) {
            Some(items) => items.push(item),
            None => {
                self.order.push(key.clone());
                self.members.insert(key, vec![item]);
            }
        }
    }

    fn into_ordered(mut self) -> Vec<(String, Vec<Item>)> {
        self.order
            .into_iter()
            .map(|key| {
                let items = self.members.remove(&key).unwrap_or_default();
                (key, items)
            })
            .collect()
    }
}

/// Groups a batch by the string value found at `keyOn`.
///
/// The key field is removed from every grouped item.
pub struct GroupByNode;

impl GroupByNode {
    /// Create a new GroupBy node.
    pub fn new() -> Self {
        Self
    }

    /// Group a batch and encode the result in the requested format.
    pub fn group(items: Batch, key_on: &str, format: OutputFormat) -> Result<Batch, NodeError> {
        let first_paired = items.first().and_then(|i| i.paired_item.clone());

        let mut groups = Groups::default();
        for mut item in items {
            let key = stringify(key_path::resolve(&item.json, key_on));
            key_path::remove_path(&mut item.json, key_on);
            groups.push(key, item);
        }
        let groups = groups.into_ordered();

        let output = match format {
            OutputFormat::StreamElements => groups
                .into_iter()
                .enumerate()
                .map(|(index, (key, items))| -> Result<Item, NodeError> {
                    let paired_item = items.first().and_then(|i| i.paired_item.clone());
                    let items = serde_json::to_value(&items)?;
                    let mut out = Item::new(json!({
                        "items": items,
                        "key": key,
                        "index": index,
                    }));
                    out.paired_item = paired_item;
                    Ok(out)
                })
                .collect::<Result<Batch, NodeError>>()?,
            OutputFormat::ObjectWithItems => {
                let mut body = Map::new();
                for (key, items) in groups {
                    body.insert(key, bodies(items));
                }
                let mut out = Item::new(Value::Object(body));
                out.paired_item = first_paired;
                vec![out]
            }
            OutputFormat::ObjectEntries => {
                let entries: Vec<Value> = groups
                    .into_iter()
                    .map(|(key, items)| json!({ "key": key, "values": bodies(items) }))
                    .collect();
                let mut out = Item::new(json!({ "items": entries }));
                out.paired_item = first_paired;
                vec![out]
            }
        };

        Ok(output)
    }
}

fn bodies(items: Vec<Item>) -> Value {
    Value::Array(items.into_iter().map(|i| Value::Object(i.json)).collect())
}

impl Default for GroupByNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GroupByNode {
    fn name(&self) -> &'static str {
        "groupBy"
    }

    async fn execute(
        &self,
        mut inputs: NodeInputs,
        config: &NodeConfig,
        _ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let params: GroupByConfig = config.parse()?;
        let items = inputs.take(0);

        tracing::debug!(
            key_on = %params.key_on,
            output_format = %params.output_format,
            items = items.len(),
            "Grouping items"
        );

        let format: OutputFormat = params.output_format.parse()?;
        Ok(NodeOutput::single(Self::group(items, &params.key_on, format)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{PairedItem, PairedItemData};

    fn item(json: Value, index: usize) -> Item {
        Item::new(json).with_paired_item(PairedItem::Single(PairedItemData { item: index, input: None }))
    }

    fn sample() -> Batch {
        vec![
            item(json!({"id": 1, "name": "a"}), 0),
            item(json!({"id": "2", "name": "b"}), 1),
            item(json!({"id": "1", "name": "c"}), 2),
            item(json!({"name": "d"}), 3),
        ]
    }

    async fn run(items: Batch, params: Value) -> Result<NodeOutput, NodeError> {
        GroupByNode::new()
            .execute(
                NodeInputs::single(items),
                &NodeConfig::new("groupBy", params),
                &InvocationContext::default(),
            )
            .await
    }

    #[tokio::test]
    async fn test_stream_elements() {
        let output = run(sample(), json!({"keyOn": "id"})).await.unwrap();
        let groups = output.channel(0).unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].json["key"], json!("1"));
        assert_eq!(groups[0].json["index"], json!(0));
        assert_eq!(
            groups[0].json["items"],
            json!([
                {"json": {"name": "a"}, "pairedItem": {"item": 0}},
                {"json": {"name": "c"}, "pairedItem": {"item": 2}},
            ])
        );
        assert_eq!(
            groups[0].paired_item,
            Some(PairedItem::Single(PairedItemData { item: 0, input: None }))
        );
        assert_eq!(groups[1].json["key"], json!("2"));
        assert_eq!(groups[2].json["key"], json!("undefined"));
        assert_eq!(groups[2].json["index"], json!(2));
    }

    #[tokio::test]
    async fn test_object_with_items() {
        let output = run(sample(), json!({"outputFormat": "objectWithItems"})).await.unwrap();
        let batch = output.channel(0).unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch[0].json_value(),
            json!({
                "1": [{"name": "a"}, {"name": "c"}],
                "2": [{"name": "b"}],
                "undefined": [{"name": "d"}],
            })
        );
        let keys: Vec<&String> = batch[0].json.keys().collect();
        assert_eq!(keys, vec!["1", "2", "undefined"]);
        assert_eq!(
            batch[0].paired_item,
            Some(PairedItem::Single(PairedItemData { item: 0, input: None }))
        );
    }

    #[tokio::test]
    async fn test_object_entries() {
        let output = run(sample(), json!({"outputFormat": "objectEntries"})).await.unwrap();
        let batch = output.channel(0).unwrap();

        assert_eq!(
            batch[0].json_value(),
            json!({
                "items": [
                    {"key": "1", "values": [{"name": "a"}, {"name": "c"}]},
                    {"key": "2", "values": [{"name": "b"}]},
                    {"key": "undefined", "values": [{"name": "d"}]},
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let output = run(vec![], json!({"outputFormat": "objectWithItems"})).await.unwrap();
        let batch = output.channel(0).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].json.is_empty());
        assert!(batch[0].paired_item.is_none());

        let output = run(vec![], json!({})).await.unwrap();
        assert!(output.channel(0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_key_path() {
        let items = vec![
            Item::new(json!({"user": {"team": "x", "n": 1}})),
            Item::new(json!({"user": {"team": "y", "n": 2}})),
        ];
        let output = run(items, json!({"keyOn": "user.team", "outputFormat": "objectWithItems"}))
            .await
            .unwrap();

        assert_eq!(
            output.channel(0).unwrap()[0].json_value(),
            json!({"x": [{"user": {"n": 1}}], "y": [{"user": {"n": 2}}]})
        );
    }

    #[tokio::test]
    async fn test_unknown_output_format() {
        let result = run(sample(), json!({"outputFormat": "table"})).await;
        assert!(
            matches!(result, Err(NodeError::Configuration(msg)) if msg == "Unknown output format: table")
        );
    }
}
