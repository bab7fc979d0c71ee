use chrono::Duration;

const SECS_PER_DAY: i64 = 86_400;
/// Years are approximated as 365 days.
const SECS_PER_YEAR: i64 = 365 * SECS_PER_DAY;

/// Formats a duration like `1y 3d 0h 5m 2s`. Leading zero units are dropped, seconds are always
/// present.
pub fn format_duration(v: Duration) -> String {
    let mut total = v.num_seconds().max(0);
    let years = total / SECS_PER_YEAR;
    total %= SECS_PER_YEAR;
    let days = total / SECS_PER_DAY;
    total %= SECS_PER_DAY;
    let hours = total / 3600;
    total %= 3600;
    let minutes = total / 60;
    let seconds = total % 60;

    let parts = [
        (years, 'y'),
        (days, 'd'),
        (hours, 'h'),
        (minutes, 'm'),
        (seconds, 's'),
    ];

    let start = parts[..parts.len() - 1]
        .iter()
        .position(|(value, _)| *value > 0)
        .unwrap_or(parts.len() - 1);

    parts[start..]
        .iter()
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Same as [format_duration] for a raw millisecond count.
pub fn format_ms(ms: u64) -> String {
    format_duration(Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn zero_is_seconds_only() {
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_ms(999), "0s");
    }

    #[test]
    fn keeps_inner_zero_units() {
        assert_eq!(format_duration(Duration::seconds(3600 + 5)), "1h 0m 5s");
        assert_eq!(format_duration(Duration::seconds(61)), "1m 1s");
    }

    #[test]
    fn large_values_use_days_and_years() {
        let v = Duration::days(366) + Duration::minutes(2);
        assert_eq!(format_duration(v), "1y 1d 0h 2m 0s");
    }

    #[test]
    fn negative_is_clamped() {
        assert_eq!(format_duration(Duration::seconds(-10)), "0s");
    }
}
