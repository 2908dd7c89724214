// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signing Key Warmer
//!
//! Background task that reads the key cache on a fixed interval so an
//! expired key set is refreshed off the request path.
//!
//! Each sweep goes through the same TTL check as a request: within the TTL it
//! is a no-op, after it a refetch is attempted, and a failed refetch keeps the
//! previous keys.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::KeyCache;
use crate::cache::CacheRead;

pub struct KeyWarmer {
    keys: Arc<KeyCache>,
    interval: Duration,
}

impl KeyWarmer {
    pub fn new(keys: Arc<KeyCache>, interval: Duration) -> Self {
        Self { keys, interval }
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(warmer.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Signing key warmer starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Signing key warmer shutting down");
                return;
            }

            self.warm().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Signing key warmer shutting down");
                    return;
                }
            }
        }
    }

    async fn warm(&self) {
        match self.keys.read().await {
            CacheRead::Fresh(keys) => debug!(count = keys.len(), "Signing keys are fresh"),
            CacheRead::Stale { age, .. } => warn!(
                age_secs = age.num_seconds(),
                "Serving stale signing keys"
            ),
            CacheRead::Empty => warn!("No signing keys available"),
        }
    }
}
