//! Endpoint client trait and implementations for the billing service

mod http;
mod mock;

pub use http::HttpEndpointClient;
pub use mock::{Scripted, ScriptedClient};

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{EndpointResponse, Result};

/// The five upstream queries for one consumer number.
///
/// Each call either yields the reply envelope (whose `flag` the caller must
/// check) or fails with [`crate::types::PowerError::Request`]. Implementations
/// do not retry.
#[async_trait]
pub trait EndpointClient: Send + Sync {
    /// Balance / receivable summary with account name and address
    async fn fees_by_account(&self) -> Result<EndpointResponse>;

    /// Per-month usage and cost records for `year`, plus year-to-date totals
    async fn yearly_record(&self, year: i32) -> Result<EndpointResponse>;

    /// Per-day usage/estimate records for the month `period_key` (`YYYYMM`)
    async fn daily_of_month(&self, period_key: &str) -> Result<EndpointResponse>;

    /// Peak/flat/valley usage breakdown for `date_key` (`YYYYMMDD`)
    async fn time_of_use_today(&self, date_key: &str) -> Result<EndpointResponse>;

    /// Billing periods for `year`, most recent first
    async fn bills_by_year(&self, year: i32) -> Result<EndpointResponse>;
}

#[async_trait]
impl<C: EndpointClient + ?Sized> EndpointClient for Arc<C> {
    async fn fees_by_account(&self) -> Result<EndpointResponse> {
        (**self).fees_by_account().await
    }

    async fn yearly_record(&self, year: i32) -> Result<EndpointResponse> {
        (**self).yearly_record(year).await
    }

    async fn daily_of_month(&self, period_key: &str) -> Result<EndpointResponse> {
        (**self).daily_of_month(period_key).await
    }

    async fn time_of_use_today(&self, date_key: &str) -> Result<EndpointResponse> {
        (**self).time_of_use_today(date_key).await
    }

    async fn bills_by_year(&self, year: i32) -> Result<EndpointResponse> {
        (**self).bills_by_year(year).await
    }
}
