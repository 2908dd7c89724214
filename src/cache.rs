// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TTL cache with stale fallback.
//!
//! Shared by the signing key cache and the provider configuration cache.
//!
//! ## Semantics
//!
//! - An entry is valid while `now - fetched_at < ttl`.
//! - An invalid (or missing) entry triggers a refresh.
//! - A failed refresh keeps the previous entry, which is then reported as
//!   [`CacheRead::Stale`] (or [`CacheRead::Empty`] if nothing was ever cached).
//! - The value is held behind an `Arc` and the whole slot is replaced on
//!   refresh, so readers never observe a partially updated value. Concurrent
//!   refreshes may race; the last write wins.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::clock::Clock;

/// Default TTL for cached provider data (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A cached value with its fetch time.
#[derive(Debug)]
pub struct CacheEntry<T> {
    value: Arc<T>,
    fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self {
            value: Arc::new(value),
            fetched_at,
        }
    }

    /// Age of the entry relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.fetched_at
    }

    pub fn is_valid(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.age(now) < ttl
    }
}

/// Outcome of a cache read.
#[derive(Debug)]
pub enum CacheRead<T> {
    /// Value within its TTL (either cached or just fetched).
    Fresh(Arc<T>),
    /// Refresh failed or was not attempted; this is the last known value.
    Stale { value: Arc<T>, age: TimeDelta },
    /// Nothing has ever been cached.
    Empty,
}

impl<T> CacheRead<T> {
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheRead::Fresh(_))
    }

    /// The value regardless of freshness.
    pub fn into_value(self) -> Option<Arc<T>> {
        match self {
            CacheRead::Fresh(value) | CacheRead::Stale { value, .. } => Some(value),
            CacheRead::Empty => None,
        }
    }
}

/// A single-slot TTL cache.
pub struct TtlCache<T> {
    name: &'static str,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Send + Sync> TtlCache<T> {
    /// Create an empty cache. `name` only appears in logs.
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            slot: RwLock::new(None),
        }
    }

    /// Read the slot without refreshing.
    pub async fn peek(&self) -> CacheRead<T> {
        let now = self.clock.now();
        let slot = self.slot.read().await;
        match &*slot {
            Some(entry) if entry.is_valid(now, self.ttl) => CacheRead::Fresh(entry.value.clone()),
            Some(entry) => CacheRead::Stale {
                value: entry.value.clone(),
                age: entry.age(now),
            },
            None => CacheRead::Empty,
        }
    }

    /// Return the cached value if valid, otherwise run `refresh`.
    ///
    /// A refresh failure is logged and the previous value (if any) is
    /// returned as stale. The lock is not held while `refresh` runs.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> CacheRead<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let current = self.peek().await;
        if current.is_fresh() {
            debug!(cache = self.name, "Serving cached value");
            return current;
        }

        match refresh().await {
            Ok(value) => CacheRead::Fresh(self.store(value).await),
            Err(e) => {
                match &current {
                    CacheRead::Stale { age, .. } => warn!(
                        cache = self.name,
                        error = %e,
                        age_secs = age.num_seconds(),
                        "Cache refresh failed, serving stale value"
                    ),
                    _ => warn!(
                        cache = self.name,
                        error = %e,
                        "Cache refresh failed and nothing is cached"
                    ),
                }
                current
            }
        }
    }

    /// Replace the slot with a freshly fetched value.
    pub async fn store(&self, value: T) -> Arc<T> {
        let entry = CacheEntry::new(value, self.clock.now());
        let value = entry.value.clone();
        *self.slot.write().await = Some(entry);
        value
    }
}
