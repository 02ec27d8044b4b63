//! NoETL Node Runner binary.
//!
//! Runs one transform node invocation and prints its output batches as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use noetl_nodes::{ExecutionMode, NodeConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use node_runner::{Invocation, InvocationRunner, RunnerConfig};

#[derive(Parser)]
#[command(name = "noetl-node")]
#[command(version, about = "Run NoETL transform nodes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a node invocation document
    ///
    /// The document holds the node config and its input batches:
    ///     {"node": {"kind": "lookup", "needleKey": "id"},
    ///      "inputs": [[{"json": {"id": 1}}], [{"json": {"id": 1, "name": "x"}}]],
    ///      "mode": "test"}
    #[command(verbatim_doc_comment)]
    Run {
        /// Path to the invocation JSON file, or - for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Execution mode: production, test, preview (overrides the document's mode)
        #[arg(short, long)]
        mode: Option<ExecutionMode>,

        /// Seed for reproducible random routing
        #[arg(short, long)]
        seed: Option<u64>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// List available node kinds
    List,
    /// Show the input and output channels a node config declares
    Channels {
        /// Node config as JSON, e.g. '{"kind": "join", "numberInputs": 3}'
        #[arg(value_name = "JSON")]
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,noetl_nodes=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = RunnerConfig::from_env()?;

    match cli.command {
        Commands::Run {
            input,
            mode,
            seed,
            pretty,
        } => {
            if let Some(mode) = mode {
                config = config.with_mode(mode);
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let runner = InvocationRunner::new(config);
            let invocation = Invocation::load(&input).await?;
            let output = runner.run(invocation).await?;

            let text = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{}", text);
        }
        Commands::List => {
            let runner = InvocationRunner::new(config);
            for kind in runner.node_kinds() {
                println!("{}", kind);
            }
        }
        Commands::Channels { node } => {
            let runner = InvocationRunner::new(config);
            let node: NodeConfig = serde_json::from_str(&node)?;
            let (inputs, outputs) = runner.channels(&node)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "inputs": inputs,
                    "outputs": outputs,
                }))?
            );
        }
    }

    Ok(())
}
