//! Runner configuration.

use anyhow::{Context, Result};
use noetl_nodes::ExecutionMode;

/// Node runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Execution ID reported to nodes.
    pub execution_id: i64,

    /// Execution mode used when the invocation does not set one.
    pub execution_mode: ExecutionMode,

    /// Execution mode forced from the command line, ahead of the invocation's own.
    pub mode_override: Option<ExecutionMode>,

    /// Seed for reproducible random routing.
    pub random_seed: Option<u64>,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let execution_id = match std::env::var("NOETL_EXECUTION_ID") {
            Ok(s) => s
                .parse()
                .with_context(|| format!("Invalid NOETL_EXECUTION_ID: {}", s))?,
            Err(_) => random_execution_id(),
        };

        let execution_mode = match std::env::var("NOETL_EXECUTION_MODE") {
            Ok(s) => s.parse()?,
            Err(_) => ExecutionMode::Production,
        };

        let random_seed = std::env::var("NOETL_RANDOM_SEED")
            .ok()
            .map(|s| {
                s.parse()
                    .with_context(|| format!("Invalid NOETL_RANDOM_SEED: {}", s))
            })
            .transpose()?;

        Ok(Self {
            execution_id,
            execution_mode,
            mode_override: None,
            random_seed,
        })
    }

    /// Force the execution mode for every invocation.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode_override = Some(mode);
        self
    }

    /// Mode for one invocation: the forced mode, then the document's, then the default.
    pub fn resolve_mode(&self, requested: Option<ExecutionMode>) -> ExecutionMode {
        self.mode_override
            .or(requested)
            .unwrap_or(self.execution_mode)
    }

    /// Override the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

fn random_execution_id() -> i64 {
    (uuid::Uuid::new_v4().as_u64_pair().0 & i64::MAX as u64) as i64
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            execution_id: random_execution_id(),
            execution_mode: ExecutionMode::Production,
            mode_override: None,
            random_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.execution_mode, ExecutionMode::Production);
        assert!(config.random_seed.is_none());
        assert!(config.execution_id >= 0);
    }

    #[test]
    fn test_config_overrides() {
        let config = RunnerConfig::default()
            .with_mode(ExecutionMode::Test)
            .with_seed(9);
        assert_eq!(config.mode_override, Some(ExecutionMode::Test));
        assert_eq!(config.random_seed, Some(9));
    }

    #[test]
    fn test_resolve_mode_precedence() {
        let config = RunnerConfig::default();
        assert_eq!(config.resolve_mode(None), ExecutionMode::Production);
        assert_eq!(config.resolve_mode(Some(ExecutionMode::Test)), ExecutionMode::Test);

        let config = config.with_mode(ExecutionMode::Production);
        assert_eq!(config.resolve_mode(Some(ExecutionMode::Test)), ExecutionMode::Production);
    }
}
