// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - JWKS is fetched via HTTPS from the user pool's well-known endpoint
//! - Keys are cached with a configurable TTL (1 hour by default)
//! - Stale cache is used on fetch failure (availability over freshness)
//! - A `kid` missing from the cached set is a verification failure, never a
//!   refresh trigger
//!
//! ## Usage
//!
//! Build a [`KeyCache`] once at startup and share it (via `Arc`) with the
//! token verifier.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tracing::{debug, info};

use super::error::FetchError;
use crate::cache::{CacheRead, TtlCache};
use crate::clock::Clock;

/// Signing keys indexed by key id.
///
/// Built wholesale from one key document and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, Jwk>,
}

impl SigningKeySet {
    /// Index a key document by `kid`. Keys without a `kid` cannot be selected
    /// by a token header and are dropped.
    pub fn from_jwk_set(jwks: JwkSet) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());
        for jwk in jwks.keys {
            match jwk.common.key_id.clone() {
                Some(kid) => {
                    keys.insert(kid, jwk);
                }
                None => debug!("Skipping JWK without a key id"),
            }
        }
        Self { keys }
    }

    pub fn get(&self, kid: &str) -> Option<&Jwk> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Source of the provider's key document.
pub trait KeyFetcher: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<JwkSet, FetchError>>;
}

/// Fetches the key document over HTTPS.
#[derive(Clone)]
pub struct HttpKeyFetcher {
    /// JWKS URL (user pool well-known endpoint)
    jwks_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl HttpKeyFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    ///
    /// # Arguments
    /// - `jwks_url`: e.g. `https://cognito-idp.us-east-1.amazonaws.com/<pool>/.well-known/jwks.json`
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(jwks_url, client))
    }

    pub fn with_client(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            client,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }
}

impl KeyFetcher for HttpKeyFetcher {
    fn fetch(&self) -> BoxFuture<'_, Result<JwkSet, FetchError>> {
        Box::pin(async move {
            let response = self.client.get(&self.jwks_url).send().await?;

            if !response.status().is_success() {
                return Err(FetchError::Status(response.status()));
            }

            let body = response.bytes().await?;
            serde_json::from_slice::<JwkSet>(&body)
                .map_err(|e| FetchError::InvalidDocument(e.to_string()))
        })
    }
}

/// Process-wide cache of the provider's signing keys.
pub struct KeyCache {
    fetcher: Arc<dyn KeyFetcher>,
    cache: TtlCache<SigningKeySet>,
}

impl KeyCache {
    pub fn new(fetcher: Arc<dyn KeyFetcher>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache: TtlCache::new("jwks", ttl, clock),
        }
    }

    /// Read the key set, refreshing it first if the TTL has lapsed.
    pub async fn read(&self) -> CacheRead<SigningKeySet> {
        self.cache.get_or_refresh(|| self.fetch_key_set()).await
    }

    /// Current signing keys.
    ///
    /// Never fails: a failed refresh serves the previous set, and an empty set
    /// if nothing was ever fetched.
    pub async fn get_signing_keys(&self) -> Arc<SigningKeySet> {
        self.read()
            .await
            .into_value()
            .unwrap_or_else(|| Arc::new(SigningKeySet::default()))
    }

    /// Force a refetch regardless of the TTL.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let keys = self.fetch_key_set().await?;
        self.cache.store(keys).await;
        Ok(())
    }

    /// Check if the key set is cached and within its TTL.
    pub async fn is_cached(&self) -> bool {
        self.cache.peek().await.is_fresh()
    }

    async fn fetch_key_set(&self) -> Result<SigningKeySet, FetchError> {
        let keys = SigningKeySet::from_jwk_set(self.fetcher.fetch().await?);
        info!(count = keys.len(), "Retrieved JWKS keys");
        Ok(keys)
    }
}

/// A key descriptor that cannot be turned into a verification key.
#[derive(Debug, thiserror::Error)]
#[error("Unusable signing key: {0}")]
pub struct UnusableKey(pub String);

/// Convert a JWK to a DecodingKey and the algorithm it verifies.
pub fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), UnusableKey> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| UnusableKey(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                // Cognito publishes RS256
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| UnusableKey(format!("Failed to create EC key: {e}")))?;

            // Without `alg` the curve decides
            let alg = match (jwk.common.key_algorithm, &ec.curve) {
                (Some(KeyAlgorithm::ES384), _) => Algorithm::ES384,
                (Some(KeyAlgorithm::ES256), _) => Algorithm::ES256,
                (None, EllipticCurve::P384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(UnusableKey("Unsupported key type in JWKS".to_string())),
    }
}
