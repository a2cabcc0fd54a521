//! HTTP endpoint client

use async_trait::async_trait;
use std::time::Duration;

use super::EndpointClient;
use crate::config::Config;
use crate::types::{Endpoint, EndpointResponse, PowerError, Result};

/// Upstream operation paths, relative to the base URL
const FEES_PATH: &str = "getFeesByConsNo";
const RECORD_LIST_PATH: &str = "getRecordList";
const DAYS_OF_MONTH_PATH: &str = "getDaysOfMonth";
const DAYS_ONLY_PATH: &str = "getDaysOnlyData";
const LIST_BY_YEAR_PATH: &str = "getListByYear";

/// Endpoint client over HTTP/JSON for one consumer number
pub struct HttpEndpointClient {
    http: reqwest::Client,
    base_url: String,
    cons_no: String,
}

impl HttpEndpointClient {
    pub fn new(base_url: &str, cons_no: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PowerError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cons_no: cons_no.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.base_url,
            &config.cons_no,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn cons_no(&self) -> &str {
        &self.cons_no
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Query parameters for a call: the consumer number plus `extra`
    fn params<'a>(&'a self, extra: Option<(&'a str, String)>) -> Vec<(&'a str, String)> {
        let mut params = vec![("consNo", self.cons_no.clone())];
        params.extend(extra);
        params
    }

    async fn call(
        &self,
        endpoint: Endpoint,
        path: &str,
        extra: Option<(&str, String)>,
    ) -> Result<EndpointResponse> {
        let request_error = |message: String| PowerError::Request { endpoint, message };

        tracing::debug!("Requesting {} ({})", endpoint, path);

        let response = self
            .http
            .get(self.url(path))
            .query(&self.params(extra))
            .send()
            .await
            .map_err(|e| request_error(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(request_error(format!("HTTP status {}", status)));
        }

        response
            .json::<EndpointResponse>()
            .await
            .map_err(|e| request_error(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl EndpointClient for HttpEndpointClient {
    async fn fees_by_account(&self) -> Result<EndpointResponse> {
        self.call(Endpoint::Fees, FEES_PATH, None).await
    }

    async fn yearly_record(&self, year: i32) -> Result<EndpointResponse> {
        self.call(
            Endpoint::YearlyRecord,
            RECORD_LIST_PATH,
            Some(("year", year.to_string())),
        )
        .await
    }

    async fn daily_of_month(&self, period_key: &str) -> Result<EndpointResponse> {
        self.call(
            Endpoint::DailyOfMonth,
            DAYS_OF_MONTH_PATH,
            Some(("ym", period_key.to_string())),
        )
        .await
    }

    async fn time_of_use_today(&self, date_key: &str) -> Result<EndpointResponse> {
        self.call(
            Endpoint::TimeOfUseToday,
            DAYS_ONLY_PATH,
            Some(("ymd", date_key.to_string())),
        )
        .await
    }

    async fn bills_by_year(&self, year: i32) -> Result<EndpointResponse> {
        self.call(
            Endpoint::BillsByYear,
            LIST_BY_YEAR_PATH,
            Some(("year", year.to_string())),
        )
        .await
    }
}
