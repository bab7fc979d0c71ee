use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::{
    aggregation::{self, DetailsReport},
    domain::normalize,
    utils::{
        calendar::{day_key, local_date},
        clock::Clock,
    },
};

use super::{
    backend::KeyValueBackend,
    entities::{
        DisabledDomains, TotalMsByDomain, UsageByDay, DISABLED_DOMAINS_KEY,
        TOTAL_MS_BY_DOMAIN_KEY, USAGE_BY_DAY_KEY,
    },
};

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub day: String,
    pub today_ms: u64,
    pub lifetime_ms: u64,
    pub disabled: bool,
}

/// Values right after an increment was applied.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub day: String,
    pub today_ms: u64,
    pub lifetime_ms: u64,
}

/// In-memory copy of the persisted maps. Each map sits behind its own [Arc] so a mutation only
/// clones the maps it touches.
#[derive(Clone, Default)]
struct UsageState {
    usage_by_day: Arc<UsageByDay>,
    total_ms_by_domain: Arc<TotalMsByDomain>,
    disabled_domains: Arc<DisabledDomains>,
}

/// Owns per-day usage, lifetime totals and the disabled-domain set of a single profile.
///
/// Reads are served from a snapshot loaded from the backend on first access. Mutations are
/// serialized by `writer`: each one reloads the maps from the backend, applies the change, writes
/// the backend and only then publishes the new snapshot to readers. Reloading picks up writes made
/// by other processes sharing the same data directory. A failed write leaves the published
/// snapshot untouched.
pub struct UsageStore<B: KeyValueBackend> {
    backend: B,
    clock: Box<dyn Clock>,
    state: RwLock<Option<UsageState>>,
    writer: Mutex<()>,
}

impl<B: KeyValueBackend> UsageStore<B> {
    pub fn new(backend: B, clock: Box<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            state: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    /// Key of the current day on the store's local calendar.
    pub fn today(&self) -> String {
        day_key(local_date(self.clock.time(), self.clock.offset()))
    }

    /// Adds `delta_ms` of active time to today's record and to the lifetime total of the domain.
    #[instrument(skip(self))]
    pub async fn record_time(&self, domain_raw: &str, delta_ms: u64) -> Result<RecordOutcome> {
        let domain = normalize(domain_raw);
        let _guard = self.writer.lock().await;

        let mut state = self.load().await?;
        let day = self.today();

        let today_ms = Arc::make_mut(&mut state.usage_by_day).add(&day, &domain, delta_ms);
        let lifetime_ms = Arc::make_mut(&mut state.total_ms_by_domain).add(&domain, delta_ms);

        self.backend
            .set(vec![
                (
                    USAGE_BY_DAY_KEY.to_owned(),
                    serde_json::to_value(&*state.usage_by_day)?,
                ),
                (
                    TOTAL_MS_BY_DOMAIN_KEY.to_owned(),
                    serde_json::to_value(&*state.total_ms_by_domain)?,
                ),
            ])
            .await
            .context("Failed to persist usage")?;
        self.publish(state).await;

        debug!("{domain} is at {today_ms}ms today, {lifetime_ms}ms overall");
        Ok(RecordOutcome {
            day,
            today_ms,
            lifetime_ms,
        })
    }

    /// Today's and lifetime time for the domain. Unknown domains read as zero and enabled.
    pub async fn get_summary(&self, domain_raw: &str) -> Result<Summary> {
        let domain = normalize(domain_raw);
        let state = self.snapshot().await?;
        let day = self.today();

        Ok(Summary {
            today_ms: state.usage_by_day.ms_on(&day, &domain),
            lifetime_ms: state.total_ms_by_domain.get(&domain),
            disabled: state.disabled_domains.contains(&domain),
            day,
        })
    }

    /// Flips whether the overlay is hidden for the domain and returns the new state. Recording
    /// time is not affected.
    #[instrument(skip(self))]
    pub async fn toggle_disabled(&self, domain_raw: &str) -> Result<bool> {
        let domain = normalize(domain_raw);
        let _guard = self.writer.lock().await;

        let mut state = self.load().await?;
        let disabled = Arc::make_mut(&mut state.disabled_domains).toggle(&domain);

        self.backend
            .set(vec![(
                DISABLED_DOMAINS_KEY.to_owned(),
                serde_json::to_value(&*state.disabled_domains)?,
            )])
            .await
            .context("Failed to persist disabled domains")?;
        self.publish(state).await;

        info!("Overlay for {domain} is now {}", if disabled { "hidden" } else { "shown" });
        Ok(disabled)
    }

    /// Calendar-bucketed report for the domain at the current instant.
    pub async fn get_details(&self, domain_raw: &str) -> Result<DetailsReport> {
        let domain = normalize(domain_raw);
        let state = self.snapshot().await?;
        Ok(aggregation::details(
            &state.usage_by_day,
            &domain,
            self.clock.local_time(),
        ))
    }

    /// Returns the current snapshot, loading it from the backend on first use.
    async fn snapshot(&self) -> Result<UsageState> {
        if let Some(state) = self.state.read().await.as_ref() {
            return Ok(state.clone());
        }

        let mut slot = self.state.write().await;
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let state = self.load().await?;
        *slot = Some(state.clone());
        Ok(state)
    }

    async fn publish(&self, state: UsageState) {
        *self.state.write().await = Some(state);
    }

    async fn load(&self) -> Result<UsageState> {
        debug!("Loading usage state");
        Ok(UsageState {
            usage_by_day: Arc::new(self.load_key(USAGE_BY_DAY_KEY).await?),
            total_ms_by_domain: Arc::new(self.load_key(TOTAL_MS_BY_DOMAIN_KEY).await?),
            disabled_domains: Arc::new(self.load_key(DISABLED_DOMAINS_KEY).await?),
        })
    }

    async fn load_key<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.backend.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .with_context(|| format!("Stored {key} has an unexpected shape")),
            None => Ok(T::default()),
        }
    }
}
