//! Invocation context passed to nodes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::NodeError;

/// How the host is running the current workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ExecutionMode {
    /// Regular production execution (triggers, webhooks, schedules).
    #[default]
    Production,
    /// Test run started from the editor.
    Test,
    /// Preview of a single node.
    Preview,
}

impl ExecutionMode {
    /// Returns true for test and preview runs.
    pub fn is_test_run(&self) -> bool {
        matches!(self, ExecutionMode::Test | ExecutionMode::Preview)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Production => write!(f, "production"),
            ExecutionMode::Test => write!(f, "test"),
            ExecutionMode::Preview => write!(f, "preview"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(ExecutionMode::Production),
            "test" => Ok(ExecutionMode::Test),
            "preview" => Ok(ExecutionMode::Preview),
            other => Err(NodeError::Configuration(format!(
                "Unknown execution mode: {}",
                other
            ))),
        }
    }
}

/// Execution context passed to nodes on every invocation.
///
/// Replaces ambient host state: nodes read the execution mode from here
/// rather than from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
pub struct InvocationContext {
    /// Unique execution ID.
    pub execution_id: i64,

    /// Display name of the node being invoked.
    pub node_name: String,

    /// Current execution mode.
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl InvocationContext {
    /// Create a new invocation context.
    pub fn new(execution_id: i64, node_name: impl Into<String>) -> Self {
        Self {
            execution_id,
            node_name: node_name.into(),
            mode: ExecutionMode::Production,
        }
    }

    /// Set the execution mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns true for test and preview runs.
    pub fn is_test_run(&self) -> bool {
        self.mode.is_test_run()
    }
}
