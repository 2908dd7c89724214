// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group membership resolution.
//!
//! Group membership only refines the decision context (the role label); it
//! never gates access. [`GroupResolver::resolve_groups`] therefore turns every
//! lookup failure into an empty set. Callers that need to see the failure use
//! [`GroupResolver::lookup`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{error, info};

use super::error::GroupLookupError;
use super::provider::ConfigCache;

/// Identity provider operation listing a user's groups.
pub trait GroupDirectory: Send + Sync {
    fn list_groups<'a>(
        &'a self,
        user_pool_id: &'a str,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, GroupLookupError>>;
}

/// Directory used when no credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledDirectory;

impl GroupDirectory for DisabledDirectory {
    fn list_groups<'a>(
        &'a self,
        _user_pool_id: &'a str,
        _username: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, GroupLookupError>> {
        Box::pin(async {
            Err(GroupLookupError::NotConfigured(
                "no AWS credentials available".to_string(),
            ))
        })
    }
}

/// Failure-tolerant group lookup for a verified subject.
pub struct GroupResolver {
    directory: Arc<dyn GroupDirectory>,
    config: Arc<ConfigCache>,
    timeout: Duration,
}

impl GroupResolver {
    pub fn new(
        directory: Arc<dyn GroupDirectory>,
        config: Arc<ConfigCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            config,
            timeout,
        }
    }

    /// Look up the subject's groups, surfacing any failure.
    pub async fn lookup(&self, subject: &str) -> Result<BTreeSet<String>, GroupLookupError> {
        let config = self
            .config
            .get_config()
            .await
            .ok_or_else(|| GroupLookupError::NotConfigured("provider configuration".into()))?;

        let groups = tokio::time::timeout(
            self.timeout,
            self.directory.list_groups(&config.user_pool_id, subject),
        )
        .await
        .map_err(|_| GroupLookupError::Timeout)??;

        Ok(groups.into_iter().collect())
    }

    /// The subject's groups, or an empty set if they cannot be retrieved.
    pub async fn resolve_groups(&self, subject: &str) -> BTreeSet<String> {
        match self.lookup(subject).await {
            Ok(groups) => {
                info!(user_id = subject, groups = ?groups, "Retrieved user groups");
                groups
            }
            Err(e) => {
                error!(user_id = subject, error = %e, "Failed to retrieve user groups");
                BTreeSet::new()
            }
        }
    }
}
