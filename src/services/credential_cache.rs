//! TTL-bounded mapping from API key to a user snapshot.
//!
//! The cache is a side channel: the store never sees it, and the dispatcher
//! is responsible for deleting an entry before a mutation of that user is
//! reported as successful. Entries are never patched in place.
//!
//! Every delete bumps a generation counter for that API key. A lookup that
//! read the store before a delete of the same key cannot re-insert what it
//! read afterwards, see [`CredentialCache::insert_if_current`]. Deletes of
//! other keys do not affect it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::user::User;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    user: User,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Debug)]
pub struct CredentialCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    /// Per-key delete counters. Kept after the entry goes away; one counter
    /// per API key ever invalidated.
    generations: Arc<DashMap<String, u64>>,
    ttl: Duration,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CredentialCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            generations: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Returns a clone of the live snapshot. Expired entries are dropped on
    /// the way out and reported as a miss.
    pub fn get(&self, apikey: &str) -> Option<User> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(apikey) {
            if !entry.is_expired(now) {
                return Some(entry.user.clone());
            }
        }
        self.entries.remove_if(apikey, |_, entry| entry.is_expired(now));
        None
    }

    pub fn set(&self, apikey: &str, user: User, ttl: Duration) {
        let entry = CacheEntry {
            user,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(apikey.to_string(), entry);
    }

    /// Current invalidation generation of `apikey`. Take it before reading
    /// the store.
    pub fn generation(&self, apikey: &str) -> u64 {
        self.generations.get(apikey).map(|g| *g).unwrap_or(0)
    }

    /// Inserts with the configured TTL unless `apikey` was deleted since
    /// `generation` was taken. Returns whether the entry was stored.
    pub fn insert_if_current(&self, apikey: &str, user: User, generation: u64) -> bool {
        // the entry shard lock is held across check and insert, so a
        // concurrent delete either bumps first or removes what we wrote
        let slot = self.entries.entry(apikey.to_string());
        if self.generation(apikey) != generation {
            return false;
        }
        slot.insert(CacheEntry {
            user,
            expires_at: Instant::now() + self.ttl,
        });
        true
    }

    pub fn delete(&self, apikey: &str) {
        // bump and release before touching `entries`; insert_if_current
        // takes the locks in the opposite order
        *self.generations.entry(apikey.to_string()).or_insert(0) += 1;
        self.entries.remove(apikey);
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::time;

    fn user(name: &str) -> User {
        let now = time::now();
        User {
            username: name.to_string(),
            password: String::new(),
            email: format!("{}@x.com", name),
            apikey: format!("key-{}", name),
            secret_token: String::new(),
            is_deleted: false,
            is_active: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn hit_within_ttl_returns_same_snapshot() {
        let cache = CredentialCache::default();
        let alice = user("a");
        cache.set("key-a", alice.clone(), DEFAULT_TTL);
        assert_eq!(cache.get("key-a"), Some(alice.clone()));
        assert_eq!(cache.get("key-a"), Some(alice));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_entries_are_misses_and_get_dropped() {
        let cache = CredentialCache::default();
        cache.set("key-a", user("a"), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(cache.get("key-a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn delete_forces_a_miss() {
        let cache = CredentialCache::default();
        cache.set("key-a", user("a"), DEFAULT_TTL);
        cache.delete("key-a");
        cache.delete("key-a");
        assert_eq!(cache.get("key-a"), None);
    }

    #[test]
    fn insert_after_delete_with_stale_generation_is_dropped() {
        let cache = CredentialCache::default();
        let generation = cache.generation("key-a");
        cache.delete("key-a");
        assert!(!cache.insert_if_current("key-a", user("a"), generation));
        assert_eq!(cache.get("key-a"), None);

        let generation = cache.generation("key-a");
        assert!(cache.insert_if_current("key-a", user("a"), generation));
        assert!(cache.get("key-a").is_some());
    }

    #[test]
    fn delete_of_another_key_does_not_block_insert() {
        let cache = CredentialCache::default();
        let generation = cache.generation("key-a");
        cache.delete("key-b");
        cache.delete("key-b");
        assert_eq!(cache.generation("key-a"), generation);
        assert!(cache.insert_if_current("key-a", user("a"), generation));
        assert!(cache.get("key-a").is_some());
        assert_eq!(cache.generation("key-b"), 2);
    }

    #[test]
    fn purge_only_drops_expired_entries() {
        let cache = CredentialCache::default();
        cache.set("short", user("s"), Duration::from_millis(5));
        cache.set("long", user("l"), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn concurrent_access_is_safe() {
        let cache = CredentialCache::default();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let key = format!("key-{}", i % 2);
                    for _ in 0..200 {
                        cache.set(&key, user("x"), DEFAULT_TTL);
                        let _ = cache.get(&key);
                        cache.delete(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 2);
    }
}
