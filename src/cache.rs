//! Content-addressed memoization for pipeline stages.
//!
//! A [`CacheKey`] is the SHA-256 of an operation name followed by every
//! input field. Each field is prefixed with its length (u64, little endian)
//! so `("ab", "c")` and `("a", "bc")` never hash alike.
//!
//! [`ContentCache`] is an unbounded map from key to value. There is no
//! eviction: a cache belongs to one session and is dropped with it, and a
//! session holds at most a few dozen scanned pages.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Digest identifying one stage invocation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Start a key for the named operation.
    pub fn for_operation(operation: &str) -> KeyBuilder {
        KeyBuilder::new(operation)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 12 hex chars is plenty for log lines.
        write!(f, "CacheKey({})", &self.to_hex()[..12])
    }
}

/// Incremental, length-prefixed hasher producing a [`CacheKey`].
pub struct KeyBuilder {
    hasher: Sha256,
}

impl KeyBuilder {
    fn new(operation: &str) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
        };
        builder.absorb(operation.as_bytes());
        builder
    }

    fn absorb(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Add one input field.
    pub fn field(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.absorb(bytes.as_ref());
        self
    }

    /// Add an ordered sequence of fields; order is significant.
    pub fn fields<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.hasher.update((items.len() as u64).to_le_bytes());
        for item in &items {
            self.absorb(item.as_ref());
        }
        self
    }

    pub fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finalize().into())
    }
}

/// Hit/miss counters for a [`ContentCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Unbounded memo table keyed by [`CacheKey`].
pub struct ContentCache<V> {
    entries: Mutex<HashMap<CacheKey, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ContentCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let found = self.lock().get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.lock().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, V>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<V: Clone> Default for ContentCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The memo tables owned by one session: one for stage text results and
/// one for assembled documents.
#[derive(Default)]
pub struct StageCache {
    pub texts: ContentCache<String>,
    pub documents: ContentCache<Arc<[u8]>>,
}

impl StageCache {
    pub fn new() -> Self {
        Self::default()
    }
}
