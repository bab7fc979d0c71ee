use std::fmt::Write;

use crate::{aggregation::DetailsReport, store::usage_store::Summary, utils::time::format_ms};

const BAR_WIDTH: u64 = 40;

/// Same sentence the page overlay shows.
pub fn headline(lifetime_ms: u64) -> String {
    format!(
        "This page already consumed: {} of your life",
        format_ms(lifetime_ms)
    )
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", headline(summary.lifetime_ms));
    let _ = writeln!(out, "Day\t{}", summary.day);
    let _ = writeln!(out, "Today\t{}", format_ms(summary.today_ms));
    let _ = writeln!(out, "Lifetime\t{}", format_ms(summary.lifetime_ms));
    let _ = writeln!(
        out,
        "Overlay\t{}",
        if summary.disabled { "hidden" } else { "shown" }
    );
    out
}

/// Totals followed by the daily series drawn as bars scaled to the busiest day.
pub fn render_details(details: &DetailsReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", details.domain);
    for (label, ms) in [
        ("Today", details.today_ms),
        ("Yesterday", details.yesterday_ms),
        ("Last 7 days", details.last7_days_ms),
        ("This month", details.this_month_ms),
        ("Last month", details.last_month_ms),
        ("This year", details.this_year_ms),
        ("Last year", details.last_year_ms),
    ] {
        let _ = writeln!(out, "{label}\t{}", format_ms(ms));
    }
    let _ = writeln!(out);

    for entry in &details.by_day_last30 {
        let width = if details.max_ms_last30 == 0 {
            0
        } else {
            entry.ms.saturating_mul(BAR_WIDTH) / details.max_ms_last30
        };
        let _ = writeln!(
            out,
            "{}\t{:<bar$}\t{}",
            entry.day,
            "#".repeat(width as usize),
            format_ms(entry.ms),
            bar = BAR_WIDTH as usize
        );
    }
    out
}
