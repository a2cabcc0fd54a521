//! End-to-end cycles over recorded endpoint replies

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use powerpoll::client::ScriptedClient;
use powerpoll::services::AggregationEngine;
use powerpoll::types::{fields, Endpoint, EndpointResponse, PowerError};

fn fixture(name: &str) -> EndpointResponse {
    let content = match name {
        "fees" => include_str!("fixtures/fees.json"),
        "record_list" => include_str!("fixtures/record_list.json"),
        "days_of_month" => include_str!("fixtures/days_of_month.json"),
        "days_only" => include_str!("fixtures/days_only.json"),
        "list_by_year" => include_str!("fixtures/list_by_year.json"),
        "rejected" => include_str!("fixtures/rejected.json"),
        other => panic!("unknown fixture {}", other),
    };
    serde_json::from_str(content).unwrap()
}

fn recorded_client() -> ScriptedClient {
    ScriptedClient::new()
        .with_reply(Endpoint::Fees, fixture("fees"))
        .with_reply(Endpoint::YearlyRecord, fixture("record_list"))
        .with_reply(Endpoint::DailyOfMonth, fixture("days_of_month"))
        .with_reply(Endpoint::TimeOfUseToday, fixture("days_only"))
        .with_reply(Endpoint::BillsByYear, fixture("list_by_year"))
}

fn on(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(7, 45, 0)
        .unwrap()
}

#[tokio::test]
async fn test_recorded_cycle_snapshot() {
    let engine = AggregationEngine::new(recorded_client());
    let snapshot = engine.run_cycle(on(2024, 3, 3)).await.unwrap();

    // Fees
    assert_eq!(snapshot.get_f64(fields::PREPAY_BAL), Some(215.37));
    assert_eq!(snapshot.get_str(fields::ORG_NAME), Some("Xiaodian Supply Office"));
    assert_eq!(snapshot.get_str(fields::CONS_NAME), Some("Alice Zhang"));
    assert_eq!(
        snapshot.get_str(fields::ELEC_ADDR),
        Some("12 Riverside Road, Unit 3")
    );

    // Yearly record
    assert_eq!(snapshot.get(fields::YEAR_TOTAL_USAGE), Some(&json!(612)));
    assert_eq!(snapshot.get(fields::MONTH_USAGE), Some(&json!(183)));
    assert_eq!(snapshot.get_f64(fields::LAST_MONTH_AMT), Some(98.92));

    // Today's entry exists with null estimates, so it wins and defaults apply
    assert_eq!(snapshot.get(fields::TODAY_USAGE), Some(&json!(0)));
    assert_eq!(snapshot.get_f64(fields::TODAY_AMT), Some(0.0));
    assert_eq!(snapshot.get_str(fields::LAST_MR_DATE), Some("2024-03-02"));

    // Time of use keeps the upstream null
    assert_eq!(snapshot.get_f64(fields::TODAY_PEAK_PQ), Some(1.2));
    assert_eq!(snapshot.get(fields::TODAY_VALLEY_PQ), Some(&Value::Null));

    // Bills
    assert_eq!(snapshot.get_f64(fields::UNIT_PRICE), Some(0.477));
    assert_eq!(snapshot.get_str(fields::PRICE_NAME), Some("Residential tier 1"));
    assert_eq!(snapshot.get_str(fields::LATEST_BILL_YM), Some("202402"));
    assert_eq!(
        snapshot
            .get(fields::BILL_LIST)
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );
}

#[tokio::test]
async fn test_day_missing_from_list_uses_last_estimate() {
    let engine = AggregationEngine::new(recorded_client());
    let snapshot = engine.run_cycle(on(2024, 3, 4)).await.unwrap();

    assert_eq!(snapshot.get_f64(fields::TODAY_USAGE), Some(5.8));
    assert_eq!(snapshot.get_f64(fields::TODAY_AMT), Some(2.9));
    assert_eq!(snapshot.get_f64(fields::MONTH_ESTI_AMT), Some(93.0));
}

#[tokio::test]
async fn test_rejected_fees_falls_back_to_yearly_name() {
    let client = recorded_client().with_reply(Endpoint::Fees, fixture("rejected"));
    let engine = AggregationEngine::new(client);
    let snapshot = engine.run_cycle(on(2024, 3, 3)).await.unwrap();

    assert!(!snapshot.contains_key(fields::PREPAY_BAL));
    assert_eq!(snapshot.get_str(fields::CONS_NAME), Some("A. Zhang"));
    assert_eq!(snapshot.get_str(fields::ELEC_ADDR), Some("Riverside Road"));
}

#[tokio::test]
async fn test_january_has_no_last_month_from_current_year() {
    let engine = AggregationEngine::new(recorded_client());
    let snapshot = engine.run_cycle(on(2024, 1, 20)).await.unwrap();

    assert_eq!(snapshot.get(fields::MONTH_USAGE), Some(&json!(231)));
    assert!(!snapshot.contains_key(fields::LAST_MONTH_USAGE));
}

#[tokio::test]
async fn test_everything_rejected_fails_cycle() {
    let client = Endpoint::MERGE_ORDER
        .iter()
        .fold(ScriptedClient::new(), |c, e| c.with_reply(*e, fixture("rejected")));
    let engine = AggregationEngine::new(client);

    let err = engine.run_cycle(on(2024, 3, 3)).await.unwrap_err();
    assert!(matches!(err, PowerError::AggregateEmpty));
    assert!(engine.last_snapshot().is_none());
}

#[tokio::test]
async fn test_next_cycle_replaces_cached_snapshot() {
    let engine = AggregationEngine::new(recorded_client());
    let first = engine.run_cycle(on(2024, 3, 3)).await.unwrap();
    let second = engine.run_cycle(on(2024, 3, 4)).await.unwrap();
    let cached = engine.last_snapshot().unwrap();

    assert_ne!(first.get(fields::TODAY_USAGE), second.get(fields::TODAY_USAGE));
    assert_eq!(cached.get(fields::TODAY_USAGE), second.get(fields::TODAY_USAGE));
}
