//! RandomOutput node: routes each item to a random output channel.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Mutex;

use crate::context::InvocationContext;
use crate::error::NodeError;
use crate::item::{Batch, Item, NodeInputs, NodeOutput};
use crate::registry::{channel_names, check_channel_count, Node, NodeConfig};

/// RandomOutput node parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomOutputConfig {
    /// Number of output channels.
    #[serde(default = "default_number_outputs")]
    pub number_outputs: usize,

    /// What to emit: `inputItem` or `outputIndex`.
    #[serde(default = "default_output_element")]
    pub output_element: String,

    #[serde(default)]
    pub options: RandomOutputOptions,
}

/// Optional RandomOutput settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomOutputOptions {
    /// Send every item to this output instead of a random one.
    #[serde(default)]
    pub force_output: Option<i64>,

    /// Honor `force_output` outside of test runs.
    #[serde(default)]
    pub force_output_in_production: bool,
}

fn default_number_outputs() -> usize {
    2
}

fn default_output_element() -> String {
    "inputItem".to_string()
}

/// Payload emitted for each routed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputElement {
    /// The input item, unchanged.
    InputItem,
    /// A new item `{ outputIndex }`.
    OutputIndex,
}

impl OutputElement {
    fn from_param(value: &str) -> Self {
        match value {
            "outputIndex" => OutputElement::OutputIndex,
            "inputItem" => OutputElement::InputItem,
            other => {
                tracing::warn!(output_element = other, "Unknown output element, emitting input items");
                OutputElement::InputItem
            }
        }
    }
}

impl RandomOutputConfig {
    /// Output index every item is forced to, if forcing applies to this run.
    ///
    /// Out-of-range indexes fall back to output 0.
    pub fn forced_index(&self, ctx: &InvocationContext) -> Option<usize> {
        let forced = self.options.force_output?;
        if !(ctx.is_test_run() || self.options.force_output_in_production) {
            return None;
        }

        match usize::try_from(forced) {
            Ok(index) if index < self.number_outputs => Some(index),
            _ => Some(0),
        }
    }
}

/// Routes each item independently to a uniformly drawn output.
pub struct RandomOutputNode {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RandomOutputNode {
    /// Create a node drawing from an entropy-seeded generator.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a node with a deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Create a node with a custom generator.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Route items across `params.number_outputs` batches.
    pub fn route(
        &self,
        items: Batch,
        params: &RandomOutputConfig,
        ctx: &InvocationContext,
    ) -> Result<Vec<Batch>, NodeError> {
        let count = check_channel_count("numberOutputs", params.number_outputs)?;
        let element = OutputElement::from_param(&params.output_element);
        let forced = params.forced_index(ctx);

        if let Some(index) = forced {
            tracing::debug!(output = index, mode = %ctx.mode, "Forcing all items to one output");
        }

        let mut outputs: Vec<Batch> = vec![Vec::new(); count];
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        for item in items {
            let index = match forced {
                Some(index) => index,
                None => rng.gen_range(0..count),
            };

            let routed = match element {
                OutputElement::InputItem => item,
                OutputElement::OutputIndex => Item::new(json!({ "outputIndex": index })),
            };
            outputs[index].push(routed);
        }

        Ok(outputs)
    }
}

impl Default for RandomOutputNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RandomOutputNode {
    fn name(&self) -> &'static str {
        "randomOutput"
    }

    fn output_names(&self, config: &NodeConfig) -> Result<Vec<String>, NodeError> {
        let params: RandomOutputConfig = config.parse()?;
        let count = check_channel_count("numberOutputs", params.number_outputs)?;
        Ok(channel_names("Output", count))
    }

    async fn execute(
        &self,
        mut inputs: NodeInputs,
        config: &NodeConfig,
        ctx: &InvocationContext,
    ) -> Result<NodeOutput, NodeError> {
        let params: RandomOutputConfig = config.parse()?;
        let items = inputs.take(0);

        tracing::debug!(
            number_outputs = params.number_outputs,
            output_element = %params.output_element,
            items = items.len(),
            "Routing items"
        );

        Ok(NodeOutput::new(self.route(items, &params, ctx)?))
    }
}
