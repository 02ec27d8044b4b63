//! Lookup node: left-outer join of a primary batch against reference data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{Batch, Item, NodeInputs, NodeOutput};
use crate::key_path::{last_segment, DotPathResolver, KeyPathResolver};
use crate::registry::{Node, NodeConfig};
use crate::value::{is_key_like, is_truthy, stringify, type_name};

/// Lookup node parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupConfig {
    /// Key path of the value to search for, on primary items.
    #[serde(default = "default_key")]
    pub needle_key: String,

    /// Key path to compare against, on reference items.
    #[serde(default = "default_key")]
    pub haystack_key: String,

    /// Field written on each primary item.
    #[serde(default = "default_output_key")]
    pub output_key: String,

    /// Write the whole matched body instead of plucked fields.
    #[serde(default = "default_output_full_item")]
    pub output_full_item: bool,

    /// Comma-separated key paths plucked from the match.
    #[serde(default = "default_key")]
    pub output_full_item_keys: String,
}

fn default_key() -> String {
    "id".to_string()
}

fn default_output_key() -> String {
    "result".to_string()
}

fn default_output_full_item() -> bool {
    true
}

impl LookupConfig {
    fn pluck_keys(&self) -> Vec<&str> {
        self.output_full_item_keys.split(',').map(str::trim).collect()
    }
}

/// Enriches primary items with the first matching reference item.
///
/// Matches are cached per needle for the duration of one invocation, so a
/// needle seen twice never rescans the reference batch.
pub struct LookupNode {
    resolver: Arc<dyn KeyPathResolver>,
}

impl LookupNode {
    /// Create a new Lookup node using dot-notation key paths.
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(DotPathResolver),
        }
    }

    /// Create a Lookup node with a custom key path resolver.
    pub fn with_resolver(resolver: Arc<dyn KeyPathResolver>) -> Self {
        Self { resolver }
    }

    /// Run the lookup over `items`, returning them enriched in the same order.
    pub fn lookup(
        &self,
        mut items: Batch,
        reference: &[Item],
        params: &LookupConfig,
    ) -> Result<Batch, NodeError> {
        let keys = params.pluck_keys();
        // Needle string -> index of the matching reference item, if any.
        let mut cache: HashMap<String, Option<usize>> = HashMap::new();

        for (item_index, item) in items.iter_mut().enumerate() {
            let needle = self.resolver.resolve(&item.json, &params.needle_key);

            if !is_truthy(needle) {
                item.json.insert(params.output_key.clone(), Value::Null);
                continue;
            }

            let needle = match needle {
                Some(v) if is_key_like(v) => stringify(Some(v)),
                other => {
                    return Err(NodeError::Type {
                        message: format!(
                            "Needle value for key \"{}\" must be a string or number, got {}",
                            params.needle_key,
                            type_name(other)
                        ),
                        item_index,
                    })
                }
            };

            let found = match cache.get(&needle) {
                Some(found) => *found,
                None => {
                    let found = self.scan(reference, &needle, &params.haystack_key, item_index)?;
                    cache.insert(needle, found);
                    found
                }
            };

            let output = match found.and_then(|i| reference.get(i)) {
                None => Value::Null,
                Some(matched) if params.output_full_item => Value::Object(matched.json.clone()),
                Some(matched) => match keys.as_slice() {
                    [key] => match self.resolver.resolve(&matched.json, key) {
                        Some(v) => v.clone(),
                        None => {
                            item.json.shift_remove(&params.output_key);
                            continue;
                        }
                    },
                    _ => Value::Object(self.pluck(&matched.json, &keys)),
                },
            };

            item.json.insert(params.output_key.clone(), output);
        }

        Ok(items)
    }

    /// Find the first reference item whose haystack value equals `needle`.
    fn scan(
        &self,
        reference: &[Item],
        needle: &str,
        haystack_key: &str,
        item_index: usize,
    ) -> Result<Option<usize>, NodeError> {
        for (index, candidate) in reference.iter().enumerate() {
            let value = match self.resolver.resolve(&candidate.json, haystack_key) {
                None | Some(Value::Null) => continue,
                Some(v) => v,
            };

            if !is_key_like(value) {
                return Err(NodeError::Type {
                    message: format!(
                        "Haystack value for key \"{}\" must be a string or number, got {}",
                        haystack_key,
                        type_name(Some(value))
                    ),
                    item_index,
                });
            }

            if stringify(Some(value)) == needle {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    /// Build `{lastSegment: value}` for each key path, omitting unresolved paths.
    fn pluck(&self, body: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
        let mut plucked = Map::new();
        for key in keys {
            if let Some(v) = self.resolver.resolve(body, key) {
                plucked.insert(last_segment(key).to_string(), v.clone());
            }
        }
        plucked
    }
}

impl Default for LookupNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for LookupNode {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn input_names(&self, _config: &NodeConfig) -> Result<Vec<String>, NodeError> {
        Ok(vec!["Input".to_string(), "Reference Data".to_string()])
    }

    async fn execute(
        &self,
        mut inputs: NodeInputs,
        config: &NodeConfig,
        _ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let params: LookupConfig = config.parse()?;
        let items = inputs.take(0);
        let reference = inputs.take(1);

        tracing::debug!(
            needle_key = %params.needle_key,
            haystack_key = %params.haystack_key,
            output_key = %params.output_key,
            items = items.len(),
            reference_items = reference.len(),
            "Looking up items"
        );

        Ok(NodeOutput::single(self.lookup(items, &reference, &params)?))
    }
}
