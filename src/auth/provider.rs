// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider (Cognito user pool) configuration.
//!
//! The pool id and app client id are read from the environment. They are
//! cached with the same TTL/stale policy as the signing keys, independently of
//! them, so a key fetch failure never affects configuration reads.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheRead, TtlCache};
use crate::clock::Clock;
use crate::config::{ConfigError, COGNITO_APP_CLIENT_ID_ENV, COGNITO_USER_POOL_ID_ENV};

/// Identifiers needed to validate `aud` and `iss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// AWS region hosting the user pool
    pub region: String,
    /// User pool id, e.g. `us-east-1_AbCdEf`
    pub user_pool_id: String,
    /// App client id, the expected `aud`
    pub app_client_id: String,
}

impl ProviderConfig {
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        app_client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            app_client_id: app_client_id.into(),
        }
    }

    /// The `iss` value of tokens minted by this pool.
    pub fn issuer(&self) -> String {
        format!(
            "https://cognito-idp.{}.amazonaws.com/{}",
            self.region, self.user_pool_id
        )
    }

    /// Well-known JWKS endpoint under the issuer.
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }
}

/// Where the provider configuration comes from.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<ProviderConfig, ConfigError>;
}

/// Reads pool and client ids from the process environment on every load.
#[derive(Debug, Clone)]
pub struct EnvConfigSource {
    region: String,
}

impl EnvConfigSource {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl ConfigSource for EnvConfigSource {
    fn load(&self) -> Result<ProviderConfig, ConfigError> {
        Ok(ProviderConfig {
            region: self.region.clone(),
            user_pool_id: crate::config::required_env(COGNITO_USER_POOL_ID_ENV)?,
            app_client_id: crate::config::required_env(COGNITO_APP_CLIENT_ID_ENV)?,
        })
    }
}

/// A fixed configuration.
impl ConfigSource for ProviderConfig {
    fn load(&self) -> Result<ProviderConfig, ConfigError> {
        Ok(self.clone())
    }
}

/// Cache in front of a [`ConfigSource`].
pub struct ConfigCache {
    source: Arc<dyn ConfigSource>,
    cache: TtlCache<ProviderConfig>,
}

impl ConfigCache {
    pub fn new(source: Arc<dyn ConfigSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: TtlCache::new("provider_config", ttl, clock),
        }
    }

    pub async fn read(&self) -> CacheRead<ProviderConfig> {
        self.cache
            .get_or_refresh(|| async {
                let config = self.source.load()?;
                info!(
                    user_pool_id = %config.user_pool_id,
                    "Loaded provider configuration"
                );
                Ok::<_, ConfigError>(config)
            })
            .await
    }

    /// Current configuration, or `None` if it has never loaded.
    pub async fn get_config(&self) -> Option<Arc<ProviderConfig>> {
        self.read().await.into_value()
    }
}
