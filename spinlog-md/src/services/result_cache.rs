//! Per-operation TTL'd result cache for expensive remote calls
//!
//! One instance per operation family, each with its own TTL: release
//! detail is near-immutable (long TTL) while search rankings are more
//! volatile (short TTL). Eviction is lazy at read; inserts additionally
//! enforce a max-entry bound so unbounded keyspaces cannot grow without
//! limit.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Sentinel standing in for a missing argument, so equivalent calls
/// collide regardless of call site
const MISSING_ARG: &str = "~";

struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

/// TTL'd key-value store memoizing one family of remote calls
pub struct ResultCache<T: Clone> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Look up a key, returning a clone of the stored value on an
    /// unexpired hit. Expired entries are evicted here, at read.
    pub async fn get(&self, key: &str) -> Option<T> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired, fall through to evict
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check under the write lock; another task may have refreshed it
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value with this cache's TTL
    pub async fn set(&self, key: String, value: T) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);

            // Still full after dropping expired entries: evict the entry
            // closest to expiry
            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Build a deterministic cache key from an operation name and its ordered
/// argument tuple
///
/// Missing arguments are normalized to a sentinel, so
/// `("search", [Some("a"), None])` and a logically identical call from a
/// different call site produce the same key. Delimiter and sentinel
/// characters inside present values are backslash-escaped, so only
/// equal-by-value tuples collide: a value containing `:` cannot shift
/// segment boundaries, and a literal `"~"` value stays distinct from a
/// missing argument.
pub fn cache_key(operation: &str, args: &[Option<&str>]) -> String {
    let mut key = String::from(operation);
    for arg in args {
        key.push(':');
        match arg {
            Some(value) => {
                for c in value.chars() {
                    if matches!(c, ':' | '~' | '\\') {
                        key.push('\\');
                    }
                    key.push(c);
                }
            }
            None => key.push_str(MISSING_ARG),
        }
    }
    key
}
