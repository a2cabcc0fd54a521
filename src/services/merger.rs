//! Snapshot merger
//!
//! Turns one endpoint's reply into a [`Contribution`]: the set of snapshot
//! fields it supplies, with their precedence. A contribution is computed in
//! full before the engine applies it, so a payload that turns out to be
//! malformed halfway through never leaves partial fields behind.

use serde::Deserialize;
use serde_json::{json, Value};

use super::period::PeriodReference;
use crate::types::{fields, Contribution, Endpoint, EndpointResponse, PowerError, Result};

type Extracted = std::result::Result<Contribution, String>;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FeesData {
    prepay_bal: Option<Value>,
    rcv_amt_total: Option<Value>,
    amt_total: Option<Value>,
    org_name: Option<Value>,
    cons_name: Option<Value>,
    elec_addr: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct YearlyData {
    record_list: Option<Vec<Value>>,
    cons_detail: Option<ConsDetail>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ConsDetail {
    max_pq: Option<Value>,
    amt_total: Option<Value>,
    cons_name: Option<Value>,
    elec_addr: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct MonthRecord {
    month: Option<Value>,
    this_pq: Option<Value>,
    prices: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct DailyEntry {
    ymd: Option<Value>,
    day_esti_pq: Option<Value>,
    day_esti_amt: Option<Value>,
    esti_pq: Option<Value>,
    esti_amt: Option<Value>,
    last_mr_date: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TimeOfUseData {
    total_pq: Option<Value>,
    peak_pq: Option<Value>,
    flat_pq: Option<Value>,
    valley_pq: Option<Value>,
    day_total_pq: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Bill {
    rcvbl_ym: Option<Value>,
    rcvbl_amt: Option<Value>,
    t_pq: Option<Value>,
    pay_detail_list: Option<Vec<PayDetail>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PayDetail {
    kwh_prc: Option<Value>,
    prc_name: Option<Value>,
}

/// Per-endpoint extraction rules
pub struct SnapshotMerger;

impl SnapshotMerger {
    /// Contribution of one endpoint reply.
    ///
    /// A false success flag yields [`PowerError::Rejected`]; a body that cannot
    /// be read yields [`PowerError::Malformed`]. Either way nothing is merged.
    pub fn contribution(
        endpoint: Endpoint,
        response: EndpointResponse,
        period: &PeriodReference,
    ) -> Result<Contribution> {
        if !response.flag {
            return Err(PowerError::Rejected {
                endpoint,
                message: response.msg,
            });
        }

        let extracted = match endpoint {
            Endpoint::Fees => Self::fees(response.data),
            Endpoint::YearlyRecord => Self::yearly_record(response.data, period),
            Endpoint::DailyOfMonth => Self::daily_of_month(response.data, period),
            Endpoint::TimeOfUseToday => Self::time_of_use(response.data),
            Endpoint::BillsByYear => Self::bills(response.data),
        };

        extracted.map_err(|message| PowerError::Malformed { endpoint, message })
    }

    fn fees(data: Value) -> Extracted {
        let fees: FeesData = read_object(data)?;

        let mut c = Contribution::new();
        c.set(fields::PREPAY_BAL, or_default(fees.prepay_bal, json!(0.0)));
        c.set(fields::RCV_AMT_TOTAL, or_default(fees.rcv_amt_total, json!(0.0)));
        c.set(fields::AMT_TOTAL, or_default(fees.amt_total, json!(0.0)));
        c.set(fields::ORG_NAME, or_default(fees.org_name, json!("")));
        if let Some(name) = fees.cons_name {
            c.set_if_absent(fields::CONS_NAME, name);
        }
        if let Some(addr) = fees.elec_addr {
            c.set_if_absent(fields::ELEC_ADDR, addr);
        }
        Ok(c)
    }

    fn yearly_record(data: Value, period: &PeriodReference) -> Extracted {
        let yearly: YearlyData = read_object(data)?;
        let detail = yearly.cons_detail.unwrap_or_default();
        let records = yearly.record_list.unwrap_or_default();

        let mut c = Contribution::new();
        c.set(fields::YEAR_TOTAL_USAGE, or_default(detail.max_pq, json!(0)));
        c.set(fields::YEAR_TOTAL_AMT, or_default(detail.amt_total, json!(0.0)));
        if let Some(name) = detail.cons_name {
            c.set_if_absent(fields::CONS_NAME, name);
        }
        if let Some(addr) = detail.elec_addr {
            c.set_if_absent(fields::ELEC_ADDR, addr);
        }

        for raw in &records {
            let record = MonthRecord::deserialize(raw)
                .map_err(|e| format!("invalid month record: {}", e))?;
            let Some(month) = record.month.as_ref().and_then(month_number) else {
                continue;
            };
            if month == period.current_month {
                c.set(fields::MONTH_USAGE, or_default(record.this_pq, json!(0)));
                c.set(fields::MONTH_AMT, or_default(record.prices, json!(0.0)));
            } else if month == period.previous_month {
                c.set(fields::LAST_MONTH_USAGE, or_default(record.this_pq, json!(0)));
                c.set(fields::LAST_MONTH_AMT, or_default(record.prices, json!(0.0)));
            }
        }

        c.set(fields::RECORD_LIST, Value::Array(records));
        Ok(c)
    }

    fn daily_of_month(data: Value, period: &PeriodReference) -> Extracted {
        let raw_entries = read_list(data)?;
        let entries = raw_entries
            .iter()
            .map(DailyEntry::deserialize)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid daily entry: {}", e))?;

        let mut c = Contribution::new();
        if let Some(active) = select_active_day(&entries, &period.today_key) {
            let today_amt = coerce_f64(active.day_esti_amt.as_ref())?;
            let month_esti_amt = coerce_f64(active.esti_amt.as_ref())?;

            c.set(
                fields::TODAY_USAGE,
                or_default(active.day_esti_pq.clone(), json!(0)),
            );
            c.set(fields::TODAY_AMT, today_amt);
            c.set(
                fields::MONTH_ESTI_USAGE,
                or_default(active.esti_pq.clone(), json!(0)),
            );
            c.set(fields::MONTH_ESTI_AMT, month_esti_amt);
            c.set(
                fields::LAST_MR_DATE,
                or_default(active.last_mr_date.clone(), json!("")),
            );
        }

        c.set(fields::DAILY_LIST, Value::Array(raw_entries));
        Ok(c)
    }

    /// Time-of-use values are passed through; a null upstream stays null
    fn time_of_use(data: Value) -> Extracted {
        let tou: TimeOfUseData = read_object(data)?;

        let mut c = Contribution::new();
        c.set(fields::TODAY_TOTAL_PQ, tou.total_pq.unwrap_or(Value::Null));
        c.set(fields::TODAY_PEAK_PQ, tou.peak_pq.unwrap_or(Value::Null));
        c.set(fields::TODAY_FLAT_PQ, tou.flat_pq.unwrap_or(Value::Null));
        c.set(fields::TODAY_VALLEY_PQ, tou.valley_pq.unwrap_or(Value::Null));
        c.set(
            fields::TODAY_DAY_TOTAL_PQ,
            tou.day_total_pq.unwrap_or(Value::Null),
        );
        Ok(c)
    }

    /// Bills arrive most recent first; only the head is inspected
    fn bills(data: Value) -> Extracted {
        let bills = read_list(data)?;
        let Some(first) = bills.first() else {
            return Ok(Contribution::new());
        };
        let latest =
            Bill::deserialize(first).map_err(|e| format!("invalid bill entry: {}", e))?;

        let mut c = Contribution::new();
        if let Some(price) = latest.pay_detail_list.as_ref().and_then(|l| l.first()) {
            c.set(fields::UNIT_PRICE, coerce_f64(price.kwh_prc.as_ref())?);
            c.set(
                fields::PRICE_NAME,
                or_default(price.prc_name.clone(), json!("")),
            );
        }
        c.set(fields::LATEST_BILL_YM, or_default(latest.rcvbl_ym, json!("")));
        c.set(fields::LATEST_BILL_AMT, or_default(latest.rcvbl_amt, json!(0.0)));
        c.set(fields::LATEST_BILL_PQ, or_default(latest.t_pq, json!(0)));
        c.set(fields::BILL_LIST, Value::Array(bills));
        Ok(c)
    }
}

/// Active day entry: the entry dated today, else the last entry with a
/// non-null daily estimate
fn select_active_day<'a>(entries: &'a [DailyEntry], today_key: &str) -> Option<&'a DailyEntry> {
    entries
        .iter()
        .rev()
        .find(|e| e.ymd.as_ref().is_some_and(|ymd| date_key_matches(ymd, today_key)))
        .or_else(|| entries.iter().rev().find(|e| e.day_esti_pq.is_some()))
}

fn date_key_matches(value: &Value, key: &str) -> bool {
    match value {
        Value::String(s) => s == key,
        Value::Number(n) => n.to_string() == key,
        _ => false,
    }
}

fn month_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Explicit presence check: only a missing or null field takes the default
fn or_default(value: Option<Value>, default: Value) -> Value {
    value.unwrap_or(default)
}

/// Float coercion for fields the upstream may send as numeric strings.
/// Missing or null coerces to 0.0.
fn coerce_f64(value: Option<&Value>) -> std::result::Result<f64, String> {
    match value {
        None => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("number out of range: {}", n)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("not a number: {:?}", s)),
        Some(other) => Err(format!("not a number: {}", other)),
    }
}

/// Object-shaped bodies must be present; a null body carries no facts and
/// must not be read as all-defaults
fn read_object<T: for<'de> Deserialize<'de>>(data: Value) -> std::result::Result<T, String> {
    if !data.is_object() {
        return Err(format!("expected object, got {}", type_name(&data)));
    }
    serde_json::from_value(data).map_err(|e| e.to_string())
}

fn read_list(data: Value) -> std::result::Result<Vec<Value>, String> {
    match data {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(format!("expected list, got {}", type_name(&other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
