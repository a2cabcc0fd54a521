//! Period resolution for one aggregation cycle
//!
//! Derives the year, month and date keys used to query the upstream
//! service and to pick records out of list-shaped replies.

use chrono::{Datelike, NaiveDateTime};

/// Period keys derived once per cycle from a reference instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodReference {
    pub current_year: i32,
    /// `YYYYMM`
    pub current_period_key: String,
    /// `YYYYMMDD`
    pub today_key: String,
    /// 1-12
    pub current_month: u32,
    /// 1-12; January wraps to 12 without touching the year
    pub previous_month: u32,
}

impl PeriodReference {
    pub fn resolve(reference: NaiveDateTime) -> Self {
        let current_month = reference.month();
        Self {
            current_year: reference.year(),
            current_period_key: reference.format("%Y%m").to_string(),
            today_key: reference.format("%Y%m%d").to_string(),
            current_month,
            previous_month: previous_month(current_month),
        }
    }
}

/// Month before `month`, wrapping January to December
pub fn previous_month(month: u32) -> u32 {
    if month > 1 {
        month - 1
    } else {
        12
    }
}
