//! Built-in node implementations.
//!
//! This module provides implementations for the transform nodes:
//! - `groupBy` - Group items by a key
//! - `join` - Merge all input items into one
//! - `lookup` - Enrich items from reference data
//! - `randomOutput` - Route items to random outputs
//! - `emlParse` - Parse raw email messages

mod eml_parse;
mod group_by;
mod join;
mod lookup;
mod random_output;

pub use self::eml_parse::{EmlParseConfig, EmlParseNode, EmlParseOptions};
pub use self::group_by::{GroupByConfig, GroupByNode, OutputFormat};
pub use self::join::{JoinConfig, JoinNode};
pub use self::lookup::{LookupConfig, LookupNode};
pub use self::random_output::{
    OutputElement, RandomOutputConfig, RandomOutputNode, RandomOutputOptions,
};

use crate::registry::NodeRegistry;

/// Create a node registry with all built-in nodes registered.
pub fn create_default_registry() -> NodeRegistry {
    registry_with(RandomOutputNode::new())
}

/// Create a registry whose random routing is reproducible from `seed`.
pub fn create_seeded_registry(seed: u64) -> NodeRegistry {
    registry_with(RandomOutputNode::seeded(seed))
}

fn registry_with(random_output: RandomOutputNode) -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(GroupByNode::new());
    registry.register(JoinNode::new());
    registry.register(LookupNode::new());
    registry.register(random_output);
    registry.register(EmlParseNode::new());

    registry
}
