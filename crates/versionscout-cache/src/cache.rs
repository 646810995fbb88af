use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How long a stored report counts as fresh
pub const DEFAULT_TTL_HOURS: u32 = 24;

/// Single-slot cache keyed by the last stored username
///
/// Only one username is ever held. Storing for a new username replaces the
/// previous entry wholesale, so a lookup for anyone else is a miss. The lock
/// only guards the swap itself: callers fetch outside of it, which means two
/// concurrent refreshes race and whichever stores last wins.
pub struct CacheSlot<T> {
    entry: RwLock<Option<Entry<T>>>,
    ttl: Duration,
}

struct Entry<T> {
    username: String,
    data: T,
    stored_at: DateTime<Utc>,
}

/// Cache metadata attached to API responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub cached: bool,
    pub cache_age_hours: f64,
    pub next_refresh_hours: f64,
}

impl CacheInfo {
    /// Info for data that was just computed
    pub fn fresh(ttl: Duration) -> Self {
        Self {
            cached: false,
            cache_age_hours: 0.0,
            next_refresh_hours: round_tenth(hours(ttl)),
        }
    }

    fn hit(age: Duration, ttl: Duration) -> Self {
        Self {
            cached: true,
            cache_age_hours: round_tenth(hours(age)),
            next_refresh_hours: round_tenth(hours(ttl) - hours(age)),
        }
    }
}

/// A cache hit: the stored value plus how old it is
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub data: T,
    pub info: CacheInfo,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub fn with_ttl_hours(hours: u32) -> Self {
        Self::new(Duration::hours(i64::from(hours)))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the stored value if it belongs to `username` and is younger than the TTL
    pub fn lookup(&self, username: &str, now: DateTime<Utc>) -> Option<CachedValue<T>> {
        let guard = self.read();
        let entry = guard.as_ref()?;

        if entry.username != username {
            debug!(
                "Cache miss: slot holds {} but {} was requested",
                entry.username, username
            );
            return None;
        }

        let age = now - entry.stored_at;
        if age >= self.ttl {
            debug!("Cache miss: entry for {} is stale ({}s old)", username, age.num_seconds());
            return None;
        }

        Some(CachedValue {
            data: entry.data.clone(),
            info: CacheInfo::hit(age.max(Duration::zero()), self.ttl),
        })
    }

    /// Replace whatever is in the slot
    pub fn store(&self, username: &str, data: T, now: DateTime<Utc>) {
        let mut guard = self.write();
        *guard = Some(Entry {
            username: username.to_string(),
            data,
            stored_at: now,
        });
        debug!("Cache slot now holds {}", username);
    }

    /// Username currently held, if any
    pub fn username(&self) -> Option<String> {
        self.read().as_ref().map(|e| e.username.clone())
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.read().as_ref().map(|e| e.stored_at)
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_none()
    }

    // A panic elsewhere can't leave a half-written entry behind, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, Option<Entry<T>>> {
        self.entry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Entry<T>>> {
        self.entry.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone> Default for CacheSlot<T> {
    fn default() -> Self {
        Self::with_ttl_hours(DEFAULT_TTL_HOURS)
    }
}

fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 3_600_000.0
}

fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_slot_misses() {
        let slot: CacheSlot<u32> = CacheSlot::default();
        assert!(slot.is_empty());
        assert!(slot.lookup("alice", t0()).is_none());
    }

    #[test]
    fn test_hit_reports_age_and_remaining_ttl() {
        let slot = CacheSlot::default();
        slot.store("alice", 7u32, t0());

        let hit = slot.lookup("alice", t0() + Duration::hours(1)).unwrap();
        assert_eq!(hit.data, 7);
        assert!(hit.info.cached);
        assert_eq!(hit.info.cache_age_hours, 1.0);
        assert_eq!(hit.info.next_refresh_hours, 23.0);
    }

    #[test]
    fn test_other_username_misses_and_store_replaces() {
        let slot = CacheSlot::default();
        slot.store("alice", 1u32, t0());

        assert!(slot.lookup("bob", t0() + Duration::hours(1)).is_none());

        slot.store("bob", 2u32, t0() + Duration::hours(1));
        assert_eq!(slot.username().as_deref(), Some("bob"));
        assert!(slot.lookup("alice", t0() + Duration::hours(1)).is_none());
        assert_eq!(slot.lookup("bob", t0() + Duration::hours(2)).unwrap().data, 2);
    }

    #[test]
    fn test_entry_expires_at_ttl() {
        let slot = CacheSlot::default();
        slot.store("alice", 1u32, t0());

        assert!(slot.lookup("alice", t0() + Duration::minutes(24 * 60 - 1)).is_some());
        assert!(slot.lookup("alice", t0() + Duration::hours(24)).is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let slot = CacheSlot::with_ttl_hours(2);
        slot.store("alice", 1u32, t0());

        let hit = slot.lookup("alice", t0() + Duration::minutes(30)).unwrap();
        assert_eq!(hit.info.cache_age_hours, 0.5);
        assert_eq!(hit.info.next_refresh_hours, 1.5);
        assert!(slot.lookup("alice", t0() + Duration::hours(3)).is_none());
    }

    #[test]
    fn test_fresh_info() {
        let info = CacheInfo::fresh(Duration::hours(24));
        assert!(!info.cached);
        assert_eq!(info.cache_age_hours, 0.0);
        assert_eq!(info.next_refresh_hours, 24.0);

        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["cached"], false);
    }
}
