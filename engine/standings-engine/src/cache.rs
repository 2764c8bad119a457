use crate::config::{CacheConfig, StalenessPolicy};
use crate::diagnostics::EngineWarning;
use crate::head_to_head::{HeadToHeadIndex, TaggedMatch};
use crate::MAX_CACHE_TTL_SECS;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Caller-owned cache of the head-to-head index
///
/// Nothing is global: whoever needs repeated pairwise lookups holds one of
/// these and hands it the corpus version it currently has. Under
/// [`StalenessPolicy::Ttl`] only the age of the index matters; under
/// [`StalenessPolicy::CorpusVersion`] only the version does.
#[derive(Debug)]
pub struct MatchupCache {
    policy: StalenessPolicy,
    ttl: Duration,
    entry: Option<CachedIndex>,
    hits: u64,
    misses: u64,
    rebuilds: u64,
}

#[derive(Debug, Clone)]
struct CachedIndex {
    index: Arc<HeadToHeadIndex>,
    built_at: DateTime<Utc>,
    corpus_version: u64,
    warnings: Vec<EngineWarning>,
}

impl MatchupCache {
    /// Create a new, empty cache
    ///
    /// TTLs above [`MAX_CACHE_TTL_SECS`] are clamped to it.
    pub fn new(config: &CacheConfig) -> Self {
        let ttl_seconds = config.ttl_seconds.min(MAX_CACHE_TTL_SECS) as i64;
        Self {
            policy: config.staleness,
            ttl: Duration::seconds(ttl_seconds),
            entry: None,
            hits: 0,
            misses: 0,
            rebuilds: 0,
        }
    }

    /// Whether the cached index may still be served at `now`
    pub fn is_fresh_at(&self, corpus_version: u64, now: DateTime<Utc>) -> bool {
        let Some(entry) = &self.entry else {
            return false;
        };
        match self.policy {
            StalenessPolicy::Ttl => now - entry.built_at <= self.ttl,
            StalenessPolicy::CorpusVersion => entry.corpus_version == corpus_version,
        }
    }

    /// Cached index, if still fresh
    pub fn get(&mut self, corpus_version: u64) -> Option<Arc<HeadToHeadIndex>> {
        self.get_at(corpus_version, Utc::now())
    }

    pub fn get_at(
        &mut self,
        corpus_version: u64,
        now: DateTime<Utc>,
    ) -> Option<Arc<HeadToHeadIndex>> {
        if self.is_fresh_at(corpus_version, now) {
            self.hits += 1;
            self.entry.as_ref().map(|entry| Arc::clone(&entry.index))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Serve the cached index or rebuild it from `corpus`
    pub fn get_or_build<'a>(
        &mut self,
        corpus_version: u64,
        corpus: impl IntoIterator<Item = &'a TaggedMatch>,
    ) -> Arc<HeadToHeadIndex> {
        self.get_or_build_at(corpus_version, corpus, Utc::now())
    }

    pub fn get_or_build_at<'a>(
        &mut self,
        corpus_version: u64,
        corpus: impl IntoIterator<Item = &'a TaggedMatch>,
        now: DateTime<Utc>,
    ) -> Arc<HeadToHeadIndex> {
        if let Some(index) = self.get_at(corpus_version, now) {
            debug!("Serving cached head-to-head index (corpus version {})", corpus_version);
            return index;
        }

        let (index, warnings) = HeadToHeadIndex::build(corpus).into_parts();
        let index = Arc::new(index);
        self.entry = Some(CachedIndex {
            index: Arc::clone(&index),
            built_at: now,
            corpus_version,
            warnings,
        });
        self.rebuilds += 1;
        info!("Rebuilt head-to-head index for corpus version {}", corpus_version);
        index
    }

    /// Drop the cached index so the next lookup rebuilds
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("Head-to-head cache invalidated");
        }
    }

    /// Warnings raised by the most recent rebuild
    pub fn last_build_warnings(&self) -> &[EngineWarning] {
        self.entry.as_ref().map(|entry| entry.warnings.as_slice()).unwrap_or_default()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            rebuilds: self.rebuilds,
            built_at: self.entry.as_ref().map(|entry| entry.built_at),
            corpus_version: self.entry.as_ref().map(|entry| entry.corpus_version),
            matches: self.entry.as_ref().map_or(0, |entry| entry.index.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub rebuilds: u64,
    pub built_at: Option<DateTime<Utc>>,
    pub corpus_version: Option<u64>,
    pub matches: usize,
}
