//! # Entity Relay Node Runtime
//!
//! Runs two replicating workers in one process and prints the resulting
//! metrics. See `node_runtime::config` for the environment variables.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize logging and metrics
//! 3. Connect both workers
//! 4. Replicate the demo writes (Ctrl+C aborts)
//! 5. Print metrics and shut down

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, RelayNode};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Invalid configuration")?;
    let _telemetry = relay_telemetry::init_telemetry(config.telemetry.clone())
        .context("Failed to initialize telemetry")?;

    let mut node = RelayNode::new(config);
    node.start().await?;

    tokio::select! {
        report = node.run_demo() => {
            let report = report?;
            info!(
                writes = report.writes,
                converged = report.converged,
                applied_on_b = report.worker_b.envelopes_applied,
                "Demo finished"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    node.shutdown().await;
    println!("{}", relay_telemetry::gather_text()?);

    Ok(())
}
