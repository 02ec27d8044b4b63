//! Items, batches and node input/output containers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Ordered sequence of items on one channel.
pub type Batch = Vec<Item>;

/// Binary payload descriptor attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryData {
    /// Base64-encoded payload (or a storage reference when `id` is set).
    #[serde(default)]
    pub data: String,

    /// MIME type of the payload.
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Original file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// File extension without the dot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,

    /// External storage identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_mime_type() -> String {
    "application/octet-stream".to_string()
}

impl BinaryData {
    /// Create an inline binary descriptor from base64 data.
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            file_name: None,
            file_extension: None,
            id: None,
        }
    }

    /// Set the file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Reference to a source item on a given input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItemData {
    pub item: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<usize>,
}

/// Opaque provenance marker used by the host for lineage tracing.
///
/// Nodes only ever copy an existing marker; they never build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PairedItem {
    Index(usize),
    Single(PairedItemData),
    Multiple(Vec<PairedItemData>),
}

/// One unit of data flowing between nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Structured body.
    #[serde(default)]
    pub json: Map<String, Value>,

    /// Named binary payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<HashMap<String, BinaryData>>,

    /// Provenance marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<PairedItem>,
}

impl Item {
    /// Create an item from a JSON body.
    ///
    /// Non-object values are wrapped under a `data` key.
    pub fn new(json: Value) -> Self {
        let json = match json {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        Self {
            json,
            binary: None,
            paired_item: None,
        }
    }

    /// Set the provenance marker.
    pub fn with_paired_item(mut self, paired_item: PairedItem) -> Self {
        self.paired_item = Some(paired_item);
        self
    }

    /// Attach a named binary payload.
    pub fn with_binary(mut self, key: impl Into<String>, data: BinaryData) -> Self {
        self.binary
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), data);
        self
    }

    /// Get a named binary payload.
    pub fn binary(&self, key: &str) -> Option<&BinaryData> {
        self.binary.as_ref().and_then(|b| b.get(key))
    }

    /// Body as a JSON object value.
    pub fn json_value(&self) -> Value {
        Value::Object(self.json.clone())
    }
}

/// Input batches for one invocation, indexed by input channel.
///
/// `None` marks a channel that is not wired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeInputs {
    channels: Vec<Option<Batch>>,
}

impl NodeInputs {
    /// Create inputs from optional batches.
    pub fn new(channels: Vec<Option<Batch>>) -> Self {
        Self { channels }
    }

    /// Create inputs where every channel is wired.
    pub fn from_batches(batches: Vec<Batch>) -> Self {
        Self {
            channels: batches.into_iter().map(Some).collect(),
        }
    }

    /// Create inputs with a single wired channel.
    pub fn single(batch: Batch) -> Self {
        Self::from_batches(vec![batch])
    }

    /// Number of declared channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channel is declared.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Returns true if the channel at `index` is wired.
    pub fn is_connected(&self, index: usize) -> bool {
        matches!(self.channels.get(index), Some(Some(_)))
    }

    /// Borrow a channel's batch.
    pub fn batch(&self, index: usize) -> Option<&Batch> {
        self.channels.get(index).and_then(|c| c.as_ref())
    }

    /// Take a channel's batch, leaving an empty batch when not wired.
    pub fn take(&mut self, index: usize) -> Batch {
        self.channels
            .get_mut(index)
            .and_then(|c| c.take())
            .unwrap_or_default()
    }
}

/// Output batches of one invocation, one per declared output channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeOutput {
    channels: Vec<Batch>,
}

impl NodeOutput {
    /// Create output from batches.
    pub fn new(channels: Vec<Batch>) -> Self {
        Self { channels }
    }

    /// Create output with a single channel.
    pub fn single(batch: Batch) -> Self {
        Self {
            channels: vec![batch],
        }
    }

    /// Number of output channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Borrow the batch on a channel.
    pub fn channel(&self, index: usize) -> Option<&Batch> {
        self.channels.get(index)
    }

    /// Iterate over all channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &Batch> {
        self.channels.iter()
    }

    /// Total item count across all channels.
    pub fn item_count(&self) -> usize {
        self.channels.iter().map(|c| c.len()).sum()
    }

    /// Consume into the underlying batches.
    pub fn into_batches(self) -> Vec<Batch> {
        self.channels
    }
}
