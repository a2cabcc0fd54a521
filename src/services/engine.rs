//! Aggregation engine
//!
//! Runs one update cycle for an account: resolves the period, queries the
//! five endpoints concurrently, and merges whatever succeeded into a fresh
//! snapshot in fixed endpoint order. One endpoint failing never stops the
//! others from contributing; only a cycle where nothing contributed fails.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::merger::SnapshotMerger;
use super::period::PeriodReference;
use crate::client::EndpointClient;
use crate::types::{Endpoint, PowerError, Result, Snapshot};

/// Per-account aggregation engine owning its client and last snapshot
pub struct AggregationEngine<C> {
    client: C,
    /// Held for the duration of a cycle; cycles on one engine never overlap
    cycle_lock: Mutex<()>,
    latest: watch::Sender<Option<Arc<Snapshot>>>,
}

impl<C: EndpointClient> AggregationEngine<C> {
    pub fn new(client: C) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            client,
            cycle_lock: Mutex::new(()),
            latest,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the most recent successful cycle
    pub fn last_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.latest.borrow().clone()
    }

    /// Receiver that sees every successful cycle's snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.latest.subscribe()
    }

    /// Run a cycle for the current local time
    pub async fn run_cycle_now(&self) -> Result<Arc<Snapshot>> {
        self.run_cycle(Local::now().naive_local()).await
    }

    /// Run one update cycle for `reference`.
    ///
    /// Returns [`PowerError::AggregateEmpty`] when no endpoint contributed;
    /// the previous snapshot stays cached in that case.
    pub async fn run_cycle(&self, reference: NaiveDateTime) -> Result<Arc<Snapshot>> {
        let _cycle = self.cycle_lock.lock().await;
        let period = PeriodReference::resolve(reference);

        debug!(
            "Starting cycle for {} (year {}, period {})",
            period.today_key, period.current_year, period.current_period_key
        );

        let (fees, yearly, daily, time_of_use, bills) = tokio::join!(
            self.client.fees_by_account(),
            self.client.yearly_record(period.current_year),
            self.client.daily_of_month(&period.current_period_key),
            self.client.time_of_use_today(&period.today_key),
            self.client.bills_by_year(period.current_year),
        );

        // Same order as Endpoint::MERGE_ORDER
        let outcomes = [
            (Endpoint::Fees, fees),
            (Endpoint::YearlyRecord, yearly),
            (Endpoint::DailyOfMonth, daily),
            (Endpoint::TimeOfUseToday, time_of_use),
            (Endpoint::BillsByYear, bills),
        ];

        let mut snapshot = Snapshot::new();
        let mut failed = 0usize;

        for (endpoint, outcome) in outcomes {
            match outcome.and_then(|r| SnapshotMerger::contribution(endpoint, r, &period)) {
                Ok(contribution) => {
                    debug!("{} contributed {} fields", endpoint, contribution.len());
                    snapshot.apply(contribution);
                }
                Err(e) => {
                    warn!("Skipping {} this cycle: {}", endpoint, e);
                    failed += 1;
                }
            }
        }

        if snapshot.is_empty() {
            warn!(
                "Cycle produced no data ({} of {} endpoints failed)",
                failed,
                Endpoint::MERGE_ORDER.len()
            );
            return Err(PowerError::AggregateEmpty);
        }

        info!(
            "Cycle complete: {} fields, {} endpoint(s) failed",
            snapshot.len(),
            failed
        );
        debug!("Snapshot keys: {:?}", snapshot.keys().collect::<Vec<_>>());

        let snapshot = Arc::new(snapshot);
        self.latest.send_replace(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}
