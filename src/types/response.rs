//! Upstream endpoint identities and reply envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The five upstream queries, in merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Fees,
    YearlyRecord,
    DailyOfMonth,
    TimeOfUseToday,
    BillsByYear,
}

impl Endpoint {
    /// All endpoints in the order their results are merged.
    /// Fees precedes YearlyRecord so the account name/address from Fees wins.
    pub const MERGE_ORDER: [Endpoint; 5] = [
        Endpoint::Fees,
        Endpoint::YearlyRecord,
        Endpoint::DailyOfMonth,
        Endpoint::TimeOfUseToday,
        Endpoint::BillsByYear,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Fees => "fees",
            Endpoint::YearlyRecord => "yearly_record",
            Endpoint::DailyOfMonth => "daily_of_month",
            Endpoint::TimeOfUseToday => "time_of_use_today",
            Endpoint::BillsByYear => "bills_by_year",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reply envelope shared by every endpoint.
///
/// `data` is an object or a list depending on the endpoint; the merger
/// reads it into an endpoint-specific shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EndpointResponse {
    #[serde(default)]
    pub flag: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl EndpointResponse {
    /// Successful reply carrying `data`
    pub fn ok(data: Value) -> Self {
        Self {
            flag: true,
            msg: None,
            data,
        }
    }

    /// Reply with a false success flag
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self {
            flag: false,
            msg: Some(msg.into()),
            data: Value::Null,
        }
    }
}
