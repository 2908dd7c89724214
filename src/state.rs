// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::cognito::CognitoGroupDirectory;
use crate::auth::error::GroupLookupError;
use crate::auth::groups::DisabledDirectory;
use crate::auth::jwks::HttpKeyFetcher;
use crate::auth::provider::EnvConfigSource;
use crate::auth::{
    ConfigCache, GroupDirectory, GroupResolver, KeyCache, ProviderConfig, RoleMapping,
    TokenVerifier,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::decision::DecisionEngine;

/// Failures wiring the service together at start-up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to build key fetcher: {0}")]
    KeyFetcher(#[from] reqwest::Error),
    #[error("Failed to build group directory: {0}")]
    GroupDirectory(#[from] GroupLookupError),
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub keys: Arc<KeyCache>,
}

impl AppState {
    pub fn new(engine: Arc<DecisionEngine>, keys: Arc<KeyCache>) -> Self {
        Self { engine, keys }
    }

    /// Build the production object graph: HTTPS key fetcher, env-backed
    /// provider configuration and, when credentials exist, the Cognito group
    /// directory.
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let provider = ProviderConfig::new(
            &settings.region,
            &settings.user_pool_id,
            &settings.app_client_id,
        );

        let fetcher = HttpKeyFetcher::new(provider.jwks_url(), settings.http_timeout)?;
        info!(jwks_url = %fetcher.jwks_url(), "Configured key fetcher");
        let keys = Arc::new(KeyCache::new(
            Arc::new(fetcher),
            settings.cache_ttl,
            clock.clone(),
        ));

        let config = Arc::new(ConfigCache::new(
            Arc::new(EnvConfigSource::new(&settings.region)),
            settings.cache_ttl,
            clock.clone(),
        ));

        let directory: Arc<dyn GroupDirectory> = match &settings.aws_credentials {
            Some(credentials) => Arc::new(CognitoGroupDirectory::new(
                &settings.region,
                credentials.clone(),
                settings.http_timeout,
                clock.clone(),
            )?),
            None => {
                warn!("No AWS credentials configured; every user resolves to the default role");
                Arc::new(DisabledDirectory)
            }
        };

        let engine = DecisionEngine::new(
            TokenVerifier::new(keys.clone(), config.clone(), clock),
            GroupResolver::new(directory, config, settings.http_timeout),
            RoleMapping::default(),
        )
        .with_cookie_name(&settings.cookie_name);

        Ok(Self::new(Arc::new(engine), keys))
    }
}
