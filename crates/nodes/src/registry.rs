//! Node registry and dispatch.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{NodeInputs, NodeOutput};

/// Maximum number of dynamic input or output channels a node may declare.
pub const MAX_CHANNELS: usize = 10;

/// Configuration for one node invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node kind (e.g., "groupBy", "lookup").
    pub kind: String,

    /// Node-specific parameters, already resolved by the host.
    #[serde(flatten)]
    pub parameters: serde_json::Value,
}

impl NodeConfig {
    /// Create a node configuration.
    pub fn new(kind: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            parameters,
        }
    }

    /// Deserialize the parameters into a node's typed parameter struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, NodeError> {
        let parameters = match &self.parameters {
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };

        serde_json::from_value(parameters).map_err(|e| {
            NodeError::Configuration(format!("Invalid {} parameters: {}", self.kind, e))
        })
    }
}

/// Validate a dynamic channel count.
pub(crate) fn check_channel_count(name: &str, count: usize) -> Result<usize, NodeError> {
    if (1..=MAX_CHANNELS).contains(&count) {
        Ok(count)
    } else {
        Err(NodeError::Configuration(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_CHANNELS, count
        )))
    }
}

/// Display names for `count` dynamic channels: `"{prefix} 1"`, `"{prefix} 2"`, ...
pub fn channel_names(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{} {}", prefix, i)).collect()
}

/// Node trait for implementing data transforms.
#[async_trait]
pub trait Node: Send + Sync {
    /// Returns the node's unique kind.
    fn name(&self) -> &'static str;

    /// Input channel names declared for the given configuration.
    fn input_names(&self, _config: &NodeConfig) -> Result<Vec<String>, NodeError> {
        Ok(vec!["Input".to_string()])
    }

    /// Output channel names declared for the given configuration.
    fn output_names(&self, _config: &NodeConfig) -> Result<Vec<String>, NodeError> {
        Ok(vec!["Output".to_string()])
    }

    /// Execute the node against its input batches.
    async fn execute(
        &self,
        inputs: NodeInputs,
        config: &NodeConfig,
        ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError>;
}

/// Registry of available nodes.
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    /// Create a new empty node registry.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Register a node.
    pub fn register<T: Node + 'static>(&mut self, node: T) {
        let name = node.name().to_string();
        self.nodes.insert(name, Arc::new(node));
    }

    /// Get a node by kind.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(name).cloned()
    }

    /// Check if a node is registered.
    pub fn has(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// List all registered node kinds, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a node by kind.
    pub async fn execute(
        &self,
        name: &str,
        inputs: NodeInputs,
        config: &NodeConfig,
        ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let node = self.get(name).ok_or_else(|| NodeError::NotFound(name.to_string()))?;
        let start = std::time::Instant::now();

        let output = node.execute(inputs, config, ctx).await;

        match &output {
            Ok(out) => tracing::debug!(
                execution_id = ctx.execution_id,
                node = name,
                channels = out.channel_count(),
                items = out.item_count(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Node executed"
            ),
            Err(e) => tracing::warn!(
                execution_id = ctx.execution_id,
                node = name,
                error = %e,
                "Node failed"
            ),
        }

        output
    }

    /// Execute a node from config (uses config.kind as node kind).
    pub async fn execute_from_config(
        &self,
        inputs: NodeInputs,
        config: &NodeConfig,
        ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        self.execute(&config.kind, inputs, config, ctx).await
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("nodes", &self.list())
            .finish()
    }
}
