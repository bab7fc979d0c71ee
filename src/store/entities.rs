use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Accumulated time of a single domain on a single day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct DomainUsageEntity {
    pub ms: u64,
}

/// Everything recorded on one calendar day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct DayRecordEntity {
    #[serde(default)]
    pub domains: BTreeMap<String, DomainUsageEntity>,
}

/// Per-day records keyed by `YYYY-MM-DD`. Stored under [USAGE_BY_DAY_KEY].
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct UsageByDay(pub BTreeMap<String, DayRecordEntity>);

impl UsageByDay {
    pub fn ms_on(&self, day: &str, domain: &str) -> u64 {
        self.0
            .get(day)
            .and_then(|record| record.domains.get(domain))
            .map_or(0, |usage| usage.ms)
    }

    /// Adds `delta_ms` to the cell, creating the day and domain on first use. Returns the new
    /// value.
    pub fn add(&mut self, day: &str, domain: &str, delta_ms: u64) -> u64 {
        let usage = self
            .0
            .entry(day.to_owned())
            .or_default()
            .domains
            .entry(domain.to_owned())
            .or_default();
        usage.ms = usage.ms.saturating_add(delta_ms);
        usage.ms
    }

    /// Sum of the domain's time over every day whose key starts with `prefix`.
    pub fn ms_with_prefix(&self, prefix: &str, domain: &str) -> u64 {
        self.0
            .iter()
            .filter(|(day, _)| day.starts_with(prefix))
            .filter_map(|(_, record)| record.domains.get(domain))
            .fold(0u64, |sum, usage| sum.saturating_add(usage.ms))
    }
}

/// All-time totals per domain. Stored under [TOTAL_MS_BY_DOMAIN_KEY].
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct TotalMsByDomain(pub BTreeMap<String, u64>);

impl TotalMsByDomain {
    pub fn get(&self, domain: &str) -> u64 {
        self.0.get(domain).copied().unwrap_or(0)
    }

    pub fn add(&mut self, domain: &str, delta_ms: u64) -> u64 {
        let total = self.0.entry(domain.to_owned()).or_default();
        *total = total.saturating_add(delta_ms);
        *total
    }
}

/// Domains with a hidden overlay. Persisted as `{ "<domain>": true }`; a `false` entry left by
/// an older writer counts as absent.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct DisabledDomains(pub BTreeMap<String, bool>);

impl DisabledDomains {
    pub fn contains(&self, domain: &str) -> bool {
        self.0.get(domain).copied().unwrap_or(false)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, domain: &str) -> bool {
        if self.contains(domain) {
            self.0.remove(domain);
            false
        } else {
            self.0.insert(domain.to_owned(), true);
            true
        }
    }
}

pub const USAGE_BY_DAY_KEY: &str = "usageByDay";
pub const TOTAL_MS_BY_DOMAIN_KEY: &str = "totalMsByDomain";
pub const DISABLED_DOMAINS_KEY: &str = "disabledDomains";

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn usage_by_day_reads_extension_layout() {
        let value = json!({
            "2025-01-01": { "domains": { "example.com": { "ms": 1500 } } },
            "2025-01-02": { "domains": {} },
            "2025-01-03": {}
        });
        let usage: UsageByDay = serde_json::from_value(value).unwrap();
        assert_eq!(usage.ms_on("2025-01-01", "example.com"), 1500);
        assert_eq!(usage.ms_on("2025-01-02", "example.com"), 0);
        assert_eq!(usage.ms_on("2025-01-03", "example.com"), 0);
        assert_eq!(usage.ms_on("2030-01-01", "example.com"), 0);
    }

    #[test]
    fn add_creates_cells_lazily() {
        let mut usage = UsageByDay::default();
        assert_eq!(usage.add("2025-01-01", "a.com", 10), 10);
        assert_eq!(usage.add("2025-01-01", "a.com", 5), 15);
        assert_eq!(usage.add("2025-01-01", "b.com", 1), 1);
        assert_eq!(usage.0.len(), 1);
        assert_eq!(
            serde_json::to_value(&usage).unwrap(),
            json!({ "2025-01-01": { "domains": { "a.com": { "ms": 15 }, "b.com": { "ms": 1 } } } })
        );
    }

    #[test]
    fn prefix_sum_only_counts_matching_days() {
        let mut usage = UsageByDay::default();
        usage.add("2024-12-31", "a.com", 1);
        usage.add("2025-01-01", "a.com", 10);
        usage.add("2025-01-31", "a.com", 100);
        usage.add("2025-01-31", "b.com", 1000);
        usage.add("2025-02-01", "a.com", 10000);
        assert_eq!(usage.ms_with_prefix("2025-01", "a.com"), 110);
        assert_eq!(usage.ms_with_prefix("2025", "a.com"), 10110);
        assert_eq!(usage.ms_with_prefix("2024", "a.com"), 1);
        assert_eq!(usage.ms_with_prefix("2023", "a.com"), 0);
    }

    #[test]
    fn disabled_domains_toggle_and_legacy_false() {
        let mut disabled: DisabledDomains =
            serde_json::from_value(json!({ "a.com": true, "b.com": false })).unwrap();
        assert!(disabled.contains("a.com"));
        assert!(!disabled.contains("b.com"));
        assert!(disabled.toggle("b.com"));
        assert!(!disabled.toggle("a.com"));
        assert_eq!(serde_json::to_value(&disabled).unwrap(), json!({ "b.com": true }));
    }
}
