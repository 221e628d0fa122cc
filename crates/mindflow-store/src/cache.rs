use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mindflow_lesson::Lesson;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::lesson::LessonStore;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// In-memory map whose entries expire `ttl` after insertion.
///
/// Expired entries are never returned; they are dropped lazily on access or eagerly by
/// [`TtlCache::purge_expired`].
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<K, V> TtlCache<K, V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, (Instant, V)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, (expires, _)| *expires > now);
        before - entries.len()
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries();
        if let Some((expires, value)) = entries.get(key)
            && *expires > now
        {
            return Some(value.clone());
        }
        entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let expires = Instant::now() + self.ttl;
        self.entries().insert(key, (expires, value));
    }

    /// Remove `key`. Returns `true` if an entry, fresh or stale, was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries().remove(key).is_some()
    }
}

/// Read-through cache in front of any [`LessonStore`].
#[derive(Debug)]
pub struct CachedLessonStore<S> {
    inner: S,
    cache: TtlCache<String, Lesson>,
}

impl<S: LessonStore> CachedLessonStore<S> {
    #[must_use]
    pub fn new(inner: S, cache: TtlCache<String, Lesson>) -> Self {
        Self { inner, cache }
    }

    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    #[must_use]
    pub fn cache(&self) -> &TtlCache<String, Lesson> {
        &self.cache
    }
}

impl<S: LessonStore> LessonStore for CachedLessonStore<S> {
    async fn get(&self, lesson_id: &str) -> Result<Option<Lesson>, StoreError> {
        let key = lesson_id.to_owned();
        if let Some(lesson) = self.cache.get(&key) {
            tracing::debug!(lesson_id, "lesson cache hit");
            return Ok(Some(lesson));
        }
        let lesson = self.inner.get(lesson_id).await?;
        if let Some(lesson) = &lesson {
            self.cache.insert(key, lesson.clone());
        }
        Ok(lesson)
    }

    async fn put(&self, lesson_id: &str, title: &str, lesson: &Lesson) -> Result<(), StoreError> {
        self.inner.put(lesson_id, title, lesson).await?;
        self.cache.insert(lesson_id.to_owned(), lesson.clone());
        Ok(())
    }
}
