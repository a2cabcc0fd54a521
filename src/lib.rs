//! Usage/billing snapshot aggregation for a utility-billing account
//!
//! The [`services::AggregationEngine`] queries five independent endpoints of
//! the billing service through an [`client::EndpointClient`] and merges the
//! replies into one [`types::Snapshot`] per cycle.

pub mod client;
pub mod config;
pub mod services;
pub mod types;
