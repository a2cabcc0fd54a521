//! Periodic polling of one aggregation engine
//!
//! Runs a cycle immediately and then once per interval. A cycle is awaited
//! before the next tick is taken, so cycles never overlap. Failed cycles
//! are logged and the previously published snapshot keeps being served.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::engine::AggregationEngine;
use crate::client::EndpointClient;
use crate::types::Snapshot;

/// Counters for a finished polling run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub cycles: u64,
    pub failures: u64,
}

/// Drives an engine on a fixed interval until shutdown
pub struct Poller<C> {
    engine: Arc<AggregationEngine<C>>,
    interval: Duration,
}

impl<C: EndpointClient + 'static> Poller<C> {
    pub fn new(engine: Arc<AggregationEngine<C>>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Receiver of every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.engine.subscribe()
    }

    /// Poll until `shutdown` becomes true or its sender is dropped
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> PollStats {
        let mut stats = PollStats::default();
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Polling every {:?}", self.interval);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    stats.cycles += 1;
                    match self.engine.run_cycle_now().await {
                        Ok(snapshot) => {
                            info!("Snapshot updated ({} fields)", snapshot.len());
                        }
                        Err(e) => {
                            stats.failures += 1;
                            warn!("Update failed, keeping last snapshot: {}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(
            "Polling stopped after {} cycles ({} failed)",
            stats.cycles, stats.failures
        );
        stats
    }

    /// Run on the tokio runtime
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<PollStats> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ScriptedClient;
    use crate::types::{fields, Endpoint};
    use serde_json::json;

    fn engine(client: ScriptedClient) -> Arc<AggregationEngine<ScriptedClient>> {
        Arc::new(AggregationEngine::new(client))
    }

    #[tokio::test]
    async fn test_first_cycle_runs_immediately_and_publishes() {
        let client = ScriptedClient::new().with_data(Endpoint::Fees, json!({"prepayBal": 12.0}));
        let poller = Poller::new(engine(client), Duration::from_secs(3600));
        let mut snapshots = poller.subscribe();
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = poller.spawn(stop_rx);
        snapshots.changed().await.unwrap();
        let snapshot = snapshots.borrow_and_update().clone().unwrap();
        stop_tx.send(true).unwrap();
        let stats = handle.await.unwrap();

        assert_eq!(snapshot.get_f64(fields::PREPAY_BAL), Some(12.0));
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_repeats_on_interval() {
        let client = ScriptedClient::new().with_data(Endpoint::Fees, json!({}));
        let engine = engine(client);
        let poller = Poller::new(Arc::clone(&engine), Duration::from_millis(10));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = poller.spawn(stop_rx);
        tokio::time::sleep(Duration::from_millis(80)).await;
        stop_tx.send(true).unwrap();
        let stats = handle.await.unwrap();

        assert!(stats.cycles >= 2, "only {} cycles", stats.cycles);
        assert_eq!(
            engine.client().call_count(Endpoint::Fees) as u64,
            stats.cycles
        );
    }

    #[tokio::test]
    async fn test_failures_counted_and_nothing_published() {
        let poller = Poller::new(engine(ScriptedClient::new()), Duration::from_millis(10));
        let snapshots = poller.subscribe();
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = poller.spawn(stop_rx);
        tokio::time::sleep(Duration::from_millis(40)).await;
        stop_tx.send(true).unwrap();
        let stats = handle.await.unwrap();

        assert!(stats.cycles >= 1);
        assert_eq!(stats.failures, stats.cycles);
        assert!(snapshots.borrow().is_none());
    }

    #[tokio::test]
    async fn test_stops_when_shutdown_sender_dropped() {
        let poller = Poller::new(engine(ScriptedClient::new()), Duration::from_secs(3600));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = poller.spawn(stop_rx);
        drop(stop_tx);
        let stats = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller did not stop")
            .unwrap();

        assert!(stats.cycles <= 1);
    }

    #[tokio::test]
    async fn test_already_shut_down_runs_nothing() {
        let poller = Poller::new(engine(ScriptedClient::new()), Duration::from_millis(10));
        let (_stop_tx, stop_rx) = watch::channel(true);

        let stats = poller.run(stop_rx).await;

        assert_eq!(stats, PollStats::default());
    }
}
