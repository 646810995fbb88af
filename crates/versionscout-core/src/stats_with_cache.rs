// Stats service with caching support
use crate::{aggregate::Aggregator, models::AggregateReport, validate::validate_username, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};
use versionscout_cache::{CacheInfo, CacheSlot};

/// What the web layer hands back: the report plus how old it is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub report: AggregateReport,
    pub cache_info: CacheInfo,
}

/// Aggregator fronted by a single-slot cache
///
/// A hit is served straight away and a background refresh is kicked off so
/// the next visitor gets newer data. A miss (empty slot, another user, or a
/// stale entry) aggregates synchronously. Cloning shares the same slot.
#[derive(Clone)]
pub struct CachedStatsService {
    aggregator: Aggregator,
    slot: Arc<CacheSlot<AggregateReport>>,
}

impl CachedStatsService {
    pub fn new(aggregator: Aggregator, slot: CacheSlot<AggregateReport>) -> Self {
        Self {
            aggregator,
            slot: Arc::new(slot),
        }
    }

    pub fn slot(&self) -> &CacheSlot<AggregateReport> {
        &self.slot
    }

    /// Cache-first stats for a user, forks excluded
    pub async fn stats(&self, username: &str) -> Result<StatsResponse> {
        validate_username(username)?;

        if let Some(hit) = self.slot.lookup(username, Utc::now()) {
            info!(
                "Cache hit for {} ({}h old), refreshing in background",
                username, hit.info.cache_age_hours
            );
            self.spawn_refresh(username);
            return Ok(StatsResponse {
                report: hit.data,
                cache_info: hit.info,
            });
        }

        match (self.slot.username(), self.slot.last_updated()) {
            (Some(held), Some(at)) => {
                debug!("Cache miss for {} (slot holds {} from {})", username, held, at)
            }
            _ => debug!("Cache miss for {} (slot empty)", username),
        }
        let report = self.fetch_and_store(username).await?;
        Ok(StatsResponse {
            report,
            cache_info: CacheInfo::fresh(self.slot.ttl()),
        })
    }

    /// Re-aggregate and overwrite the slot, whatever its age
    pub async fn refresh(&self, username: &str) -> Result<()> {
        validate_username(username)?;
        self.fetch_and_store(username).await?;
        info!("Refreshed cached stats for {}", username);
        Ok(())
    }

    /// Fire-and-forget refresh; failures only get logged
    fn spawn_refresh(&self, username: &str) {
        let service = self.clone();
        let username = username.to_string();

        tokio::spawn(async move {
            if let Err(e) = service.fetch_and_store(&username).await {
                error!("Background refresh for {} failed: {}", username, e);
            }
        });
    }

    // Never hold the slot lock across the fetch; concurrent refreshes race
    // and whoever stores last wins.
    async fn fetch_and_store(&self, username: &str) -> Result<AggregateReport> {
        let report = self.aggregator.generate(username, false).await?;
        self.slot.store(username, report.clone(), Utc::now());
        Ok(report)
    }
}
