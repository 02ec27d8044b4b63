//! NoETL Node Runner
//!
//! Runs a single transform node invocation outside of the workflow host.
//!
//! This crate provides:
//! - Environment-based runner configuration
//! - Invocation documents (node config, input batches, execution mode)
//! - Dispatch through the default node registry

pub mod config;
pub mod invocation;

pub use config::RunnerConfig;
pub use invocation::{Invocation, InvocationRunner};
