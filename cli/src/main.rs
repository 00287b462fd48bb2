use alloy::primitives::B256;
use anyhow::Error;
use clap::{Parser, Subcommand};
use common::{
    config::{Config, ConfigTrait},
    shared::execution_layer::ExecutionLayer,
};
use serde::Serialize;
use std::sync::Arc;
use tracer::{BridgeTracer, TraceError, TracerConfig};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(version, about = "Traces messages across an Arbitrum-style rollup bridge")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow an L1 or L2 transaction to the retryable tickets and deposits it belongs to
    Retryable {
        #[arg(value_name = "TX")]
        tx_hash: B256,
    },
    /// List the L2-to-L1 messages of an L2 transaction and their outbox status
    Withdrawal {
        #[arg(value_name = "TX")]
        tx_hash: B256,
    },
    /// Find the L1 batch carrying an L2 transaction
    Batch {
        #[arg(value_name = "TX")]
        tx_hash: B256,
    },
    /// Report whether an L2 block has been asserted and confirmed on L1
    BlockState {
        #[arg(value_name = "L2_BLOCK")]
        l2_block: u64,
    },
    /// Verify the commitments of the latest confirmed node
    NodeState {
        /// Check the latest created node instead
        #[arg(long)]
        created: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    common::utils::logging::init_logging();
    common::config::load_dotenv();

    let args = Args::parse();
    info!("🔎 Starting Bridge Tracer v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args.command).await {
        error!("Trace failed: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command) -> Result<(), Error> {
    let config = Config::read_env_variables()?;
    let tracer_config = TracerConfig::read_env_variables()?;
    info!("Tracer configuration:\n{}", tracer_config);

    let (l1, l2) = tokio::try_join!(
        ExecutionLayer::new_read_only(&config.l1_rpc_url),
        ExecutionLayer::new_read_only(&config.l2_rpc_url)
    )
    .map_err(|e| anyhow::anyhow!("Failed to create execution layers: {}", e))?;
    let tracer = BridgeTracer::new(Arc::new(l1), Arc::new(l2), tracer_config);

    match command {
        Command::Retryable { tx_hash } => print_json(tracer.locate(tx_hash).await),
        Command::Withdrawal { tx_hash } => print_json(tracer.trace_withdrawal(tx_hash).await),
        Command::Batch { tx_hash } => print_json(tracer.find_l1_batch(tx_hash).await),
        Command::BlockState { l2_block } => print_json(tracer.l2_block_status(l2_block).await),
        Command::NodeState { created } => print_json(tracer.verify_node(created).await),
    }
}

/// Prints the result as pretty JSON. Absence is reported as `null` and is
/// not a failure of the command.
fn print_json<T: Serialize>(result: Result<T, TraceError>) -> Result<(), Error> {
    let json = match result {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(e) if e.is_absence() => {
            warn!("{}", e);
            serde_json::to_string_pretty(&serde_json::Value::Null)?
        }
        Err(e) => return Err(e.into()),
    };
    println!("{json}");
    Ok(())
}
