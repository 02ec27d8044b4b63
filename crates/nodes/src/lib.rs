//! NoETL Transform Nodes
//!
//! Stateless data-transform nodes for workflow execution.
//!
//! This crate provides:
//! - Node execution framework with registry pattern
//! - Built-in nodes: groupBy, join, lookup, randomOutput, emlParse
//! - Item model with host-compatible JSON serialization
//! - Key path resolution, binary payload and MIME parsing collaborators

pub mod binary;
pub mod context;
pub mod error;
pub mod item;
pub mod key_path;
pub mod mail;
pub mod nodes;
pub mod registry;
pub mod value;

pub use context::{ExecutionMode, InvocationContext};
pub use error::NodeError;
pub use item::{BinaryData, Batch, Item, NodeInputs, NodeOutput, PairedItem, PairedItemData};
pub use nodes::{create_default_registry, create_seeded_registry};
pub use registry::{Node, NodeConfig, NodeRegistry};
