use std::time::{Duration, Instant};

use moka::{Expiry, sync::Cache};
use serde::{Serialize, de::DeserializeOwned};

use crate::domain::UserId;

pub const USER_TTL: Duration = Duration::from_secs(60 * 60);
pub const USER_PROFILE_TTL: Duration = Duration::from_secs(5 * 60);
pub const VERIFICATION_TTL: Duration = Duration::from_secs(30 * 60);
pub const RESEND_VERIFICATION_TTL: Duration = Duration::from_secs(10 * 60);
pub const PASSWORD_RESET_TTL: Duration = Duration::from_secs(30 * 60);
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub mod keys {
    use super::UserId;

    pub fn user(id: UserId) -> String {
        format!("user:{}", id)
    }

    pub fn user_profile(id: UserId) -> String {
        format!("user:profile:{}", id)
    }

    pub fn verification(code: &str) -> String {
        format!("verification:{}", code)
    }

    pub fn password_reset(token: &str) -> String {
        format!("reset:{}", token)
    }

    pub fn refresh_token(id: UserId) -> String {
        format!("refresh:{}", id)
    }
}

/// Process-local key/value store with per-entry expiry.
pub trait CacheStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    fn del(&self, key: &str);
    fn exists(&self, key: &str) -> bool;
    fn flush(&self);
}

pub trait CacheStoreExt: CacheStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Dropping unreadable cache entry {}: {}", key, e);
                self.del(key);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, raw, ttl),
            Err(e) => log::warn!("Failed to serialize cache entry {}: {}", key, e),
        }
    }

    /// Drops every cached view of a user.
    fn invalidate_user(&self, id: UserId) {
        self.del(&keys::user(id));
        self.del(&keys::user_profile(id));
    }
}

impl<C: CacheStore + ?Sized> CacheStoreExt for C {}

#[derive(Clone)]
struct CacheEntry {
    value: String,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MokaCacheStore {
    entries: Cache<String, CacheEntry>,
}

impl MokaCacheStore {
    pub fn new() -> Self {
        let entries = Cache::builder().expire_after(EntryTtl).build();
        Self { entries }
    }
}

impl CacheStore for MokaCacheStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value)
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries.insert(key.to_string(), CacheEntry { value, ttl });
    }

    fn del(&self, key: &str) {
        self.entries.invalidate(key);
    }

    fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn flush(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_del() {
        let cache = MokaCacheStore::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert!(cache.exists("a"));
        cache.del("a");
        assert_eq!(cache.get("a"), None);
        assert!(!cache.exists("a"));
    }

    #[test]
    fn test_entries_expire() {
        let cache = MokaCacheStore::new();
        cache.set("short", "x".to_string(), Duration::from_millis(20));
        cache.set("long", "y".to_string(), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some("y".to_string()));
    }

    #[test]
    fn test_only_ttl_evicts() {
        let cache = MokaCacheStore::new();
        for i in 0..150_000 {
            cache.set(&format!("k{}", i), i.to_string(), Duration::from_secs(60));
        }
        cache.entries.run_pending_tasks();
        assert_eq!(cache.entries.entry_count(), 150_000);
        assert_eq!(cache.get("k0"), Some("0".to_string()));
    }

    #[test]
    fn test_flush() {
        let cache = MokaCacheStore::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        cache.set("b", "2".to_string(), Duration::from_secs(60));
        cache.flush();
        assert!(!cache.exists("a"));
        assert!(!cache.exists("b"));
    }

    #[test]
    fn test_json_helpers() {
        let cache = MokaCacheStore::new();
        let id = UserId::new();
        cache.set_json(&keys::verification("123456"), &id, VERIFICATION_TTL);
        assert_eq!(cache.get_json::<UserId>("verification:123456"), Some(id));

        cache.set("broken", "{".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get_json::<UserId>("broken"), None);
        assert!(!cache.exists("broken"));
    }
}
