//! In-memory credential store keyed by Telegram user id.
//!
//! Records expire at an absolute UTC instant. There is no background sweep:
//! an expired record is removed the first time it is read.
//!
//! # Concurrency
//!
//! Entries live in a `DashMap`, so `put` and `get` lock only the shard that
//! owns the key. Eviction is a conditional remove that re-checks expiry under
//! the shard lock, which means a fresh `put` racing with an eviction of the
//! old record is never clobbered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info, warn};

/// Session lifetime used when nothing better is known about the token.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// =============================================================================
// Credential Record
// =============================================================================

/// Cached proof that a user was verified by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Telegram user id
    pub user_id: i64,

    /// Backend bearer token for this user
    pub token: String,

    /// When this record stops being valid
    pub expires_at: DateTime<Utc>,

    /// Backend resident id (informational)
    pub resident_id: Option<String>,

    /// Capabilities reported by the backend (informational, never enforced here)
    pub permissions: Vec<String>,
}

impl CredentialRecord {
    /// Whether the record is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Counters for session lookups.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub evictions: AtomicU64,
}

impl SessionStats {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats.
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

// =============================================================================
// Session Store
// =============================================================================

/// Owns every credential record. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct SessionStore {
    records: DashMap<i64, CredentialRecord>,
    stats: SessionStats,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `user_id`, valid for `ttl` from now.
    ///
    /// A zero `ttl` would produce an already-expired record, so nothing is
    /// stored and any previous record for the user is dropped.
    pub fn put(
        &self,
        user_id: i64,
        token: impl Into<String>,
        ttl: Duration,
        resident_id: Option<String>,
        permissions: Vec<String>,
    ) {
        let now = Utc::now();

        if ttl.is_zero() {
            warn!(user_id, "Refusing to store session with zero TTL");
            self.records.remove(&user_id);
            return;
        }

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let record = CredentialRecord {
            user_id,
            token: token.into(),
            expires_at,
            resident_id,
            permissions,
        };

        self.records.insert(user_id, record);
        self.stats.record_insert();
        info!(user_id, expires_at = %expires_at, "Stored session token");
    }

    /// Token for `user_id`, or `None` if absent or expired.
    pub fn get(&self, user_id: i64) -> Option<String> {
        self.get_at(user_id, Utc::now())
    }

    /// Full record for `user_id`, with the same expiry handling as [`get`](Self::get).
    pub fn record(&self, user_id: i64) -> Option<CredentialRecord> {
        self.lookup(user_id, Utc::now(), CredentialRecord::clone)
    }

    /// Whether `user_id` holds an unexpired record.
    ///
    /// Does not count towards the hit/miss stats and leaves eviction to `get`.
    pub fn contains(&self, user_id: i64) -> bool {
        let now = Utc::now();
        self.records
            .get(&user_id)
            .is_some_and(|record| !record.is_expired_at(now))
    }

    /// Drop the record for `user_id`, e.g. after the backend rejected its token.
    pub fn remove(&self, user_id: i64) -> bool {
        let removed = self.records.remove(&user_id).is_some();
        if removed {
            info!(user_id, "Removed session token");
        }
        removed
    }

    pub(crate) fn get_at(&self, user_id: i64, now: DateTime<Utc>) -> Option<String> {
        self.lookup(user_id, now, |record| record.token.clone())
    }

    fn lookup<T>(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        read: impl FnOnce(&CredentialRecord) -> T,
    ) -> Option<T> {
        {
            let Some(entry) = self.records.get(&user_id) else {
                self.stats.record_miss();
                return None;
            };

            if !entry.is_expired_at(now) {
                self.stats.record_hit();
                return Some(read(entry.value()));
            }
            // shard read lock must be released before removing
        }

        // Only remove if the record is still the expired one; a concurrent
        // put may already have replaced it.
        if let Some((_, expired)) = self
            .records
            .remove_if(&user_id, |_, record| record.is_expired_at(now))
        {
            self.stats.record_eviction();
            info!(user_id, expired_at = %expired.expires_at, "Session token expired");
        } else {
            debug!(user_id, "Expired session already replaced or evicted");
        }

        self.stats.record_miss();
        None
    }

    /// Number of stored records, including ones that expired but were not read yet.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_then_get() {
        let store = SessionStore::new();
        store.put(42, "token-a", DEFAULT_SESSION_TTL, None, vec![]);

        assert_eq!(store.get(42), Some("token-a".to_string()));
    }

    #[test]
    fn test_get_unknown_user() {
        let store = SessionStore::new();
        assert_eq!(store.get(7), None);
        assert_eq!(store.record(7), None);
    }

    #[test]
    fn test_expired_record_is_evicted_permanently() {
        let store = SessionStore::new();
        let ttl = Duration::from_secs(60);
        store.put(42, "token-a", ttl, None, vec![]);

        let later = Utc::now() + chrono::Duration::seconds(61);
        assert_eq!(store.get_at(42, later), None);
        assert!(store.is_empty());

        // Still gone, even when read at the present time again
        assert_eq!(store.get(42), None);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let store = SessionStore::new();
        store.put(1, "t", Duration::from_secs(30), None, vec![]);
        let expires_at = store.record(1).unwrap().expires_at;

        let just_before = expires_at - chrono::Duration::milliseconds(1);
        assert_eq!(store.get_at(1, just_before), Some("t".to_string()));
        assert_eq!(store.get_at(1, expires_at), None);
    }

    #[test]
    fn test_real_time_expiry() {
        let store = SessionStore::new();
        store.put(5, "short", Duration::from_millis(10), None, vec![]);

        assert!(store.get(5).is_some());
        std::thread::sleep(Duration::from_millis(20));
        assert!(store.get(5).is_none());
    }

    #[test]
    fn test_put_overwrites_instead_of_merging() {
        let store = SessionStore::new();
        store.put(
            42,
            "old",
            DEFAULT_SESSION_TTL,
            Some("resident-1".to_string()),
            vec!["gate:pedestrian".to_string()],
        );
        store.put(42, "new", DEFAULT_SESSION_TTL, None, vec![]);

        let record = store.record(42).unwrap();
        assert_eq!(record.token, "new");
        assert_eq!(record.resident_id, None);
        assert!(record.permissions.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let store = SessionStore::new();
        store.put(42, "old", DEFAULT_SESSION_TTL, None, vec![]);
        store.put(42, "never-valid", Duration::ZERO, None, vec![]);

        assert_eq!(store.get(42), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_keeps_metadata() {
        let store = SessionStore::new();
        let before = Utc::now();
        store.put(
            9,
            "t",
            Duration::from_secs(3600),
            Some("r-9".to_string()),
            vec!["camera:front_door".to_string()],
        );

        let record = store.record(9).unwrap();
        assert_eq!(record.user_id, 9);
        assert_eq!(record.resident_id.as_deref(), Some("r-9"));
        assert_eq!(record.permissions, vec!["camera:front_door".to_string()]);
        assert!(record.expires_at >= before + chrono::Duration::seconds(3600));
    }

    #[test]
    fn test_eviction_does_not_clobber_fresh_put() {
        let store = SessionStore::new();
        store.put(3, "old", Duration::from_secs(10), None, vec![]);
        store.put(3, "fresh", DEFAULT_SESSION_TTL, None, vec![]);

        // A reader that believes "now" is past the old expiry must not evict
        // the replacement record.
        let later = Utc::now() + chrono::Duration::seconds(11);
        assert_eq!(store.get_at(3, later), Some("fresh".to_string()));
    }

    #[test]
    fn test_concurrent_access_is_consistent() {
        let store = Arc::new(SessionStore::new());

        std::thread::scope(|scope| {
            for worker in 0..8i64 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for i in 0..200i64 {
                        let user = i % 10;
                        let token = format!("token-{}-{}", worker, i);
                        store.put(user, token, DEFAULT_SESSION_TTL, None, vec![]);
                        let token = store.get(user).expect("token present after put");
                        assert!(token.starts_with("token-"));
                    }
                });
            }
        });

        assert_eq!(store.len(), 10);
        assert_eq!(store.stats().inserts, 8 * 200);
    }

    #[test]
    fn test_stats() {
        let store = SessionStore::new();
        store.put(1, "t", DEFAULT_SESSION_TTL, None, vec![]);
        store.get(1);
        store.get(1);
        store.get(2);

        let stats = store.stats();
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_contains_leaves_stats_alone() {
        let store = SessionStore::new();
        store.put(1, "t", DEFAULT_SESSION_TTL, None, vec![]);
        store.put(2, "short", Duration::from_millis(1), None, vec![]);
        std::thread::sleep(Duration::from_millis(5));

        assert!(store.contains(1));
        assert!(!store.contains(2));
        assert!(!store.contains(3));

        let stats = store.stats();
        assert_eq!((stats.hits, stats.misses, stats.evictions), (0, 0, 0));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        store.put(1, "t", DEFAULT_SESSION_TTL, None, vec![]);

        assert!(store.remove(1));
        assert!(!store.remove(1));
        assert_eq!(store.get(1), None);
    }
}
