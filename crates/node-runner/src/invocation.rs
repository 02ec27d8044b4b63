//! Invocation documents and dispatch.

use anyhow::{Context, Result};
use noetl_nodes::{
    create_default_registry, create_seeded_registry, ExecutionMode, InvocationContext,
    NodeConfig, NodeInputs, NodeOutput, NodeRegistry,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncReadExt;

use crate::config::RunnerConfig;

/// One node invocation: what to run and on which input batches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Node kind and resolved parameters.
    pub node: NodeConfig,

    /// Input batches by channel; `null` marks an unwired channel.
    #[serde(default)]
    pub inputs: NodeInputs,

    /// Execution mode, overriding the runner default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,

    /// Display name of the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl Invocation {
    /// Parse an invocation from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid invocation document")
    }

    /// Load an invocation from a file, or from stdin when `path` is `-`.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = if path.as_os_str() == "-" {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read invocation from stdin")?;
            text
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read invocation file {}", path.display()))?
        };

        Self::from_json(&text)
    }
}

/// Runs invocations against the built-in node registry.
pub struct InvocationRunner {
    registry: NodeRegistry,
    config: RunnerConfig,
}

impl InvocationRunner {
    /// Create a runner; a configured seed makes random routing reproducible.
    pub fn new(config: RunnerConfig) -> Self {
        let registry = match config.random_seed {
            Some(seed) => create_seeded_registry(seed),
            None => create_default_registry(),
        };

        Self { registry, config }
    }

    /// Registered node kinds.
    pub fn node_kinds(&self) -> Vec<&str> {
        self.registry.list()
    }

    /// Declared input and output channel names for a node configuration.
    pub fn channels(&self, node: &NodeConfig) -> Result<(Vec<String>, Vec<String>)> {
        let handler = self
            .registry
            .get(&node.kind)
            .with_context(|| format!("Unknown node kind: {}", node.kind))?;

        Ok((handler.input_names(node)?, handler.output_names(node)?))
    }

    /// Execute one invocation.
    pub async fn run(&self, invocation: Invocation) -> Result<NodeOutput> {
        let ctx = InvocationContext::new(
            self.config.execution_id,
            invocation
                .node_name
                .clone()
                .unwrap_or_else(|| invocation.node.kind.clone()),
        )
        .with_mode(self.config.resolve_mode(invocation.mode));

        tracing::info!(
            execution_id = ctx.execution_id,
            node = %invocation.node.kind,
            mode = %ctx.mode,
            inputs = invocation.inputs.len(),
            "Running node"
        );

        let output = self
            .registry
            .execute_from_config(invocation.inputs, &invocation.node, &ctx)
            .await
            .with_context(|| format!("Node {} failed", invocation.node.kind))?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> RunnerConfig {
        RunnerConfig::default().with_seed(3)
    }

    #[test]
    fn test_invocation_parse() {
        let invocation = Invocation::from_json(
            r#"{
                "node": {"kind": "join", "numberInputs": 3},
                "inputs": [[{"json": {"a": 1}}], null, [{"json": {"b": 2}}]],
                "mode": "test"
            }"#,
        )
        .unwrap();

        assert_eq!(invocation.node.kind, "join");
        assert_eq!(invocation.inputs.len(), 3);
        assert!(!invocation.inputs.is_connected(1));
        assert_eq!(invocation.mode, Some(ExecutionMode::Test));
    }

    #[test]
    fn test_invocation_parse_error() {
        assert!(Invocation::from_json("{\"inputs\": []}").is_err());
    }

    #[tokio::test]
    async fn test_run_join() {
        let runner = InvocationRunner::new(test_config());
        let invocation = Invocation::from_json(
            r#"{
                "node": {"kind": "join", "numberInputs": 3},
                "inputs": [[{"json": {"a": 1}}], null, [{"json": {"a": 2, "b": 3}}]]
            }"#,
        )
        .unwrap();

        let output = runner.run(invocation).await.unwrap();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value, json!([[{"json": {"a": 2, "b": 3}}]]));
    }

    #[tokio::test]
    async fn test_run_uses_invocation_mode() {
        let runner = InvocationRunner::new(test_config());
        let invocation = Invocation::from_json(
            r#"{
                "node": {"kind": "randomOutput", "numberOutputs": 3, "options": {"forceOutput": 1}},
                "inputs": [[{"json": {"a": 1}}, {"json": {"a": 2}}]],
                "mode": "test"
            }"#,
        )
        .unwrap();

        let output = runner.run(invocation).await.unwrap();
        assert_eq!(output.channel(1).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_forced_mode_beats_invocation_mode() {
        let runner = InvocationRunner::new(test_config().with_mode(ExecutionMode::Test));
        let invocation = Invocation::from_json(
            r#"{
                "node": {"kind": "randomOutput", "numberOutputs": 3, "options": {"forceOutput": 1}},
                "inputs": [[{"json": {"a": 1}}, {"json": {"a": 2}}, {"json": {"a": 3}}, {"json": {"a": 4}}]],
                "mode": "production"
            }"#,
        )
        .unwrap();

        let output = runner.run(invocation).await.unwrap();
        assert_eq!(output.channel(1).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_run_reports_node_errors() {
        let runner = InvocationRunner::new(test_config());
        let invocation = Invocation::from_json(
            r#"{"node": {"kind": "groupBy", "outputFormat": "csv"}, "inputs": [[]]}"#,
        )
        .unwrap();

        let err = runner.run(invocation).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown output format: csv"));
    }

    #[test]
    fn test_channels() {
        let runner = InvocationRunner::new(test_config());

        let (inputs, outputs) = runner
            .channels(&NodeConfig::new("lookup", json!({})))
            .unwrap();
        assert_eq!(inputs, vec!["Input", "Reference Data"]);
        assert_eq!(outputs, vec!["Output"]);

        let (_, outputs) = runner
            .channels(&NodeConfig::new("randomOutput", json!({"numberOutputs": 4})))
            .unwrap();
        assert_eq!(outputs.len(), 4);

        assert!(runner.channels(&NodeConfig::new("missing", json!({}))).is_err());
    }
}
