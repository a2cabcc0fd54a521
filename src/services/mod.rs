//! Services for aggregating endpoint replies into snapshots

pub mod engine;
pub mod merger;
pub mod period;
pub mod poller;

pub use engine::AggregationEngine;
pub use merger::SnapshotMerger;
pub use period::PeriodReference;
pub use poller::{PollStats, Poller};
