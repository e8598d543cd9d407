use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration for catalog response caching
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Get the platform-appropriate cache directory for market-match
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("market-match/catalog-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/market-match/catalog-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the catalog cache directory
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// A cached API body together with when it was fetched
#[derive(Debug, Serialize, Deserialize)]
struct CachedBody {
    fetched_at: DateTime<Utc>,
    body: String,
}

/// Disk cache for raw catalog responses, keyed by request URL.
///
/// Entries older than the TTL are treated as misses but left on disk; the
/// next successful fetch overwrites them.
#[derive(Clone, Debug)]
pub struct CatalogCache {
    cache_path: PathBuf,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(cache_path: PathBuf, ttl: Duration) -> Self {
        Self { cache_path, ttl }
    }

    /// Return the cached body for `key` if it is younger than the TTL
    pub fn get_fresh(&self, key: &str) -> Option<String> {
        self.get_fresh_at(key, Utc::now())
    }

    fn get_fresh_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        let cached: CachedBody = serde_json::from_slice(&bytes).ok()?;

        let age = now.signed_duration_since(cached.fetched_at).to_std().ok()?;
        if age < self.ttl {
            debug!(key, age_secs = age.as_secs(), "catalog cache hit");
            Some(cached.body)
        } else {
            debug!(key, age_secs = age.as_secs(), "catalog cache stale");
            None
        }
    }

    /// Store a freshly fetched body
    pub fn put(&self, key: &str, body: &str) -> Result<()> {
        self.put_at(key, body, Utc::now())
    }

    fn put_at(&self, key: &str, body: &str, fetched_at: DateTime<Utc>) -> Result<()> {
        let entry = CachedBody {
            fetched_at,
            body: body.to_string(),
        };
        let json = serde_json::to_vec(&entry)?;
        cacache::write_sync(&self.cache_path, key, json)
            .with_context(|| format!("Failed to write catalog cache at {}", self.cache_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().to_path_buf(), Duration::from_secs(3600));
        cache.put("https://api/products", "[]").unwrap();
        assert_eq!(cache.get_fresh("https://api/products").as_deref(), Some("[]"));
    }

    #[test]
    fn test_stale_entry_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        let fetched = Utc::now() - chrono::Duration::minutes(5);
        cache.put_at("k", "[1]", fetched).unwrap();
        assert!(cache.get_fresh("k").is_none());
        // Still inside the window from the fetch's point of view
        assert!(cache.get_fresh_at("k", fetched + chrono::Duration::seconds(30)).is_some());
    }

    #[test]
    fn test_missing_key_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().to_path_buf(), Duration::from_secs(60));
        assert!(cache.get_fresh("absent").is_none());
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(clear_cache(&dir.path().join("never-created")).is_ok());
    }

    #[test]
    fn test_clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let cache = CatalogCache::new(path.clone(), Duration::from_secs(3600));
        cache.put("k", "body").unwrap();
        clear_cache(&path).unwrap();
        assert!(cache.get_fresh("k").is_none());
    }
}
