//! Scripted in-memory endpoint client
//!
//! Replays fixed replies per endpoint without touching the network. Used by
//! the engine and poller tests, the integration tests and the benchmarks.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::EndpointClient;
use crate::types::{Endpoint, EndpointResponse, PowerError, Result};

/// What a scripted endpoint answers
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this envelope (its flag may be false)
    Reply(EndpointResponse),
    /// Fail the call as a transport error
    Fail(String),
}

/// Endpoint client answering from a script.
///
/// Unscripted endpoints fail with a request error.
pub struct ScriptedClient {
    script: HashMap<Endpoint, Scripted>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(Endpoint, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Successful reply carrying `data`
    pub fn with_data(self, endpoint: Endpoint, data: Value) -> Self {
        self.with_reply(endpoint, EndpointResponse::ok(data))
    }

    pub fn with_reply(mut self, endpoint: Endpoint, response: EndpointResponse) -> Self {
        self.script.insert(endpoint, Scripted::Reply(response));
        self
    }

    pub fn with_failure(mut self, endpoint: Endpoint, message: &str) -> Self {
        self.script
            .insert(endpoint, Scripted::Fail(message.to_string()));
        self
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls received so far as (endpoint, argument); Fees has an empty argument
    pub fn calls(&self) -> Vec<(Endpoint, String)> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls().iter().filter(|(e, _)| *e == endpoint).count()
    }

    /// Highest number of calls that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, endpoint: Endpoint, arg: String) -> Result<EndpointResponse> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push((endpoint, arg)),
            Err(poisoned) => poisoned.into_inner().push((endpoint, arg)),
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.script.get(&endpoint) {
            Some(Scripted::Reply(response)) => Ok(response.clone()),
            Some(Scripted::Fail(message)) => Err(PowerError::Request {
                endpoint,
                message: message.clone(),
            }),
            None => Err(PowerError::Request {
                endpoint,
                message: "not scripted".into(),
            }),
        }
    }
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EndpointClient for ScriptedClient {
    async fn fees_by_account(&self) -> Result<EndpointResponse> {
        self.answer(Endpoint::Fees, String::new()).await
    }

    async fn yearly_record(&self, year: i32) -> Result<EndpointResponse> {
        self.answer(Endpoint::YearlyRecord, year.to_string()).await
    }

    async fn daily_of_month(&self, period_key: &str) -> Result<EndpointResponse> {
        self.answer(Endpoint::DailyOfMonth, period_key.to_string())
            .await
    }

    async fn time_of_use_today(&self, date_key: &str) -> Result<EndpointResponse> {
        self.answer(Endpoint::TimeOfUseToday, date_key.to_string())
            .await
    }

    async fn bills_by_year(&self, year: i32) -> Result<EndpointResponse> {
        self.answer(Endpoint::BillsByYear, year.to_string()).await
    }
}
