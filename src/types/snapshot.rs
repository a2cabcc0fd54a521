//! Point-in-time snapshot of account usage/billing facts

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Snapshot field names.
///
/// A key missing from a snapshot means "unknown this cycle", never zero.
pub mod fields {
    // Fees
    pub const PREPAY_BAL: &str = "prepay_bal";
    pub const RCV_AMT_TOTAL: &str = "rcv_amt_total";
    pub const AMT_TOTAL: &str = "amt_total";
    pub const ORG_NAME: &str = "org_name";
    pub const CONS_NAME: &str = "cons_name";
    pub const ELEC_ADDR: &str = "elec_addr";

    // Yearly record
    pub const YEAR_TOTAL_USAGE: &str = "year_total_usage";
    pub const YEAR_TOTAL_AMT: &str = "year_total_amt";
    pub const MONTH_USAGE: &str = "month_usage";
    pub const MONTH_AMT: &str = "month_amt";
    pub const LAST_MONTH_USAGE: &str = "last_month_usage";
    pub const LAST_MONTH_AMT: &str = "last_month_amt";
    pub const RECORD_LIST: &str = "record_list";

    // Daily of month
    pub const DAILY_LIST: &str = "daily_list";
    pub const TODAY_USAGE: &str = "today_usage";
    pub const TODAY_AMT: &str = "today_amt";
    pub const MONTH_ESTI_USAGE: &str = "month_esti_usage";
    pub const MONTH_ESTI_AMT: &str = "month_esti_amt";
    pub const LAST_MR_DATE: &str = "last_mr_date";

    // Time of use today
    pub const TODAY_TOTAL_PQ: &str = "today_total_pq";
    pub const TODAY_PEAK_PQ: &str = "today_peak_pq";
    pub const TODAY_FLAT_PQ: &str = "today_flat_pq";
    pub const TODAY_VALLEY_PQ: &str = "today_valley_pq";
    pub const TODAY_DAY_TOTAL_PQ: &str = "today_day_total_pq";

    // Bills by year
    pub const UNIT_PRICE: &str = "unit_price";
    pub const PRICE_NAME: &str = "price_name";
    pub const LATEST_BILL_YM: &str = "latest_bill_ym";
    pub const LATEST_BILL_AMT: &str = "latest_bill_amt";
    pub const LATEST_BILL_PQ: &str = "latest_bill_pq";
    pub const BILL_LIST: &str = "bill_list";

    /// Every key any endpoint can contribute
    pub const ALL: &[&str] = &[
        PREPAY_BAL,
        RCV_AMT_TOTAL,
        AMT_TOTAL,
        ORG_NAME,
        CONS_NAME,
        ELEC_ADDR,
        YEAR_TOTAL_USAGE,
        YEAR_TOTAL_AMT,
        MONTH_USAGE,
        MONTH_AMT,
        LAST_MONTH_USAGE,
        LAST_MONTH_AMT,
        RECORD_LIST,
        DAILY_LIST,
        TODAY_USAGE,
        TODAY_AMT,
        MONTH_ESTI_USAGE,
        MONTH_ESTI_AMT,
        LAST_MR_DATE,
        TODAY_TOTAL_PQ,
        TODAY_PEAK_PQ,
        TODAY_FLAT_PQ,
        TODAY_VALLEY_PQ,
        TODAY_DAY_TOTAL_PQ,
        UNIT_PRICE,
        PRICE_NAME,
        LATEST_BILL_YM,
        LATEST_BILL_AMT,
        LATEST_BILL_PQ,
        BILL_LIST,
    ];
}

/// How a contributed value interacts with a key already in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Replace whatever is there
    Overwrite,
    /// Write only when the key is not present yet (first writer wins)
    IfAbsent,
}

/// Values one endpoint wants to write, computed in full before any write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contribution {
    writes: Vec<(&'static str, Value, Precedence)>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<Value>) {
        self.writes.push((key, value.into(), Precedence::Overwrite));
    }

    pub fn set_if_absent(&mut self, key: &'static str, value: impl Into<Value>) {
        self.writes.push((key, value.into(), Precedence::IfAbsent));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Value written for `key` (last write wins within one contribution)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.writes
            .iter()
            .rev()
            .find(|(k, _, _)| *k == key)
            .map(|(_, v, _)| v)
    }
}

/// Merged result of one aggregation cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one endpoint's contribution in
    pub fn apply(&mut self, contribution: Contribution) {
        for (key, value, precedence) in contribution.writes {
            match precedence {
                Precedence::Overwrite => {
                    self.values.insert(key.to_string(), value);
                }
                Precedence::IfAbsent => {
                    self.values.entry(key.to_string()).or_insert(value);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Numeric view of a field; `None` when absent, null or non-numeric
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
