// In-memory result cache keyed by exact (url, device), with lazy TTL expiry.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::audit::{AuditResult, DeviceProfile};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    device: DeviceProfile,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AuditResult,
    created_at: Instant,
}

pub struct AuditCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    capacity: Option<usize>,
}

impl AuditCache {
    /// Create a cache whose entries stay valid for `ttl`.
    ///
    /// With `capacity` set, inserting a new key into a full cache evicts the
    /// oldest entry. Without it the cache grows for the life of the process.
    pub fn new(ttl: Duration, capacity: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Return the stored result if it is younger than the TTL.
    ///
    /// Stale entries are reported as a miss and left in place; they are only
    /// replaced by the next `put` for the same key.
    pub fn get(&self, url: &str, device: DeviceProfile) -> Option<AuditResult> {
        let key = CacheKey {
            url: url.to_string(),
            device,
        };
        let entries = self.entries.read();
        let entry = entries.get(&key)?;
        let age = entry.created_at.elapsed();
        if age < self.ttl {
            Some(entry.result.clone())
        } else {
            debug!(
                "cache entry stale url={} device={} age_ms={}",
                url,
                device,
                age.as_millis()
            );
            None
        }
    }

    /// Store `result`, replacing any previous entry for the key.
    pub fn put(&self, url: &str, device: DeviceProfile, result: AuditResult) {
        let key = CacheKey {
            url: url.to_string(),
            device,
        };
        let mut entries = self.entries.write();

        if let Some(capacity) = self.capacity {
            if !entries.contains_key(&key) && entries.len() >= capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.created_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(
                        "cache full ({}), evicting url={} device={}",
                        capacity, oldest.url, oldest.device
                    );
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                result,
                created_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
