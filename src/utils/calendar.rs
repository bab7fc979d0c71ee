use chrono::{DateTime, Datelike, FixedOffset, Months, NaiveDate, TimeZone, Utc};

/// This is the standard way of converting a date to a day key in sitetime.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Calendar date of `instant` as seen on a clock with the given offset.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    offset.from_utc_datetime(&instant.naive_utc()).date_naive()
}

/// `YYYY-MM` prefix shared by every day key of the date's month.
pub fn month_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// `YYYY` prefix shared by every day key of the date's year.
pub fn year_prefix(date: NaiveDate) -> String {
    date.format("%Y").to_string()
}

/// First day of the month preceding `date`'s month. January wraps to December of the previous
/// year.
pub fn previous_month(date: NaiveDate) -> NaiveDate {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN)
}

/// Same day in the previous year. 29th of February clamps to the 28th.
pub fn previous_year(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

/// Returns `count` consecutive days ending at `end` (inclusive), oldest first.
pub fn days_ending_at(end: NaiveDate, count: u32) -> impl Iterator<Item = NaiveDate> {
    (0..count)
        .rev()
        .filter_map(move |back| end.checked_sub_days(chrono::Days::new(back.into())))
}
