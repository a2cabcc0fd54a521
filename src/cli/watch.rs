//! `powerpoll watch`: poll until interrupted

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use powerpoll::client::HttpEndpointClient;
use powerpoll::config::Config;
use powerpoll::services::{AggregationEngine, Poller};

pub async fn run(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    let engine = Arc::new(AggregationEngine::new(HttpEndpointClient::from_config(
        config,
    )?));
    let poller = Poller::new(engine, config.scan_interval());
    let mut snapshots = poller.subscribe();
    let (stop_tx, stop_rx) = watch::channel(false);
    let handle = poller.spawn(stop_rx);

    info!("Watching consumer {}", config.cons_no);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = snapshots.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    println!("{}", serde_json::to_string(&*snapshot)?);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    // The poller may already be gone if the snapshot channel closed
    let _ = stop_tx.send(true);
    let stats = handle.await?;
    info!(
        "Ran {} cycles, {} without data",
        stats.cycles, stats.failures
    );
    Ok(())
}
