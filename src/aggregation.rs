//! Turns raw per-day records into calendar-bucketed statistics for one domain.
//!
//! Every window is computed on the local calendar of the reference instant: the day keys used
//! here are derived from the same offset the store used when recording them.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    store::entities::UsageByDay,
    utils::calendar::{
        day_key, days_ending_at, month_prefix, previous_month, previous_year, year_prefix,
    },
};

/// Length of the daily series used for charts.
pub const DAILY_SERIES_DAYS: u32 = 30;
const WEEK_DAYS: u32 = 7;

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct DayTotal {
    pub day: String,
    pub ms: u64,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DetailsReport {
    pub domain: String,
    pub today_ms: u64,
    pub yesterday_ms: u64,
    #[serde(rename = "last7DaysMs")]
    pub last7_days_ms: u64,
    pub this_month_ms: u64,
    pub last_month_ms: u64,
    pub this_year_ms: u64,
    pub last_year_ms: u64,
    /// Oldest first, today last. Always [DAILY_SERIES_DAYS] entries long.
    #[serde(rename = "byDayLast30")]
    pub by_day_last30: Vec<DayTotal>,
    /// Used for chart scaling. Zero when nothing was recorded in the series.
    #[serde(rename = "maxMsLast30")]
    pub max_ms_last30: u64,
}

/// Builds the report for an already normalized `domain` at `now`.
pub fn details(usage: &UsageByDay, domain: &str, now: DateTime<FixedOffset>) -> DetailsReport {
    details_for_day(usage, domain, now.date_naive())
}

/// Same as [details] with the local calendar day already resolved.
pub fn details_for_day(usage: &UsageByDay, domain: &str, today: NaiveDate) -> DetailsReport {
    let by_day_last30 = days_ending_at(today, DAILY_SERIES_DAYS)
        .map(|date| {
            let day = day_key(date);
            let ms = usage.ms_on(&day, domain);
            DayTotal { day, ms }
        })
        .collect::<Vec<_>>();

    // The week is the tail of the daily series.
    let last7_days_ms = by_day_last30
        .iter()
        .rev()
        .take(WEEK_DAYS as usize)
        .fold(0u64, |sum, entry| sum.saturating_add(entry.ms));
    let today_ms = by_day_last30.last().map_or(0, |entry| entry.ms);
    let yesterday_ms = by_day_last30
        .iter()
        .rev()
        .nth(1)
        .map_or(0, |entry| entry.ms);
    let max_ms_last30 = by_day_last30.iter().map(|entry| entry.ms).max().unwrap_or(0);

    DetailsReport {
        domain: domain.to_owned(),
        today_ms,
        yesterday_ms,
        last7_days_ms,
        this_month_ms: usage.ms_with_prefix(&month_prefix(today), domain),
        last_month_ms: usage.ms_with_prefix(&month_prefix(previous_month(today)), domain),
        this_year_ms: usage.ms_with_prefix(&year_prefix(today), domain),
        last_year_ms: usage.ms_with_prefix(&year_prefix(previous_year(today)), domain),
        by_day_last30,
        max_ms_last30,
    }
}
