// In-memory single-slot cache for the most recently computed report.
// Nothing is persisted: a restart starts with an empty slot.

pub mod cache;

pub use cache::{CacheInfo, CacheSlot, CachedValue, DEFAULT_TTL_HOURS};
