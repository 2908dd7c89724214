// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests: signing keys, token minting and stubs for
//! the key endpoint and group directory.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::auth::error::{FetchError, GroupLookupError};
use crate::auth::jwks::KeyFetcher;
use crate::auth::provider::ConfigSource;
use crate::auth::{
    ConfigCache, GroupDirectory, GroupResolver, KeyCache, ProviderConfig, RoleMapping,
    TokenVerifier,
};
use crate::clock::{Clock, ManualClock};
use crate::config::{ConfigError, COGNITO_USER_POOL_ID_ENV};
use crate::decision::DecisionEngine;

pub const KID: &str = "k1";
pub const REGION: &str = "us-east-1";
pub const POOL_ID: &str = "us-east-1_TestPool";
pub const CLIENT_ID: &str = "5hd2b0rrhq4e1v2k7jv8mpl3ce";
pub const ISSUER: &str = "https://cognito-idp.us-east-1.amazonaws.com/us-east-1_TestPool";

/// Private half of the `k1` key published by [`jwks_json`].
pub const SIGNING_KEY: &str = include_str!("../tests/fixtures/signing_key_k1.pem");
/// A key that is never published.
pub const ROGUE_KEY: &str = include_str!("../tests/fixtures/signing_key_rogue.pem");

const K1_MODULUS: &str = "z8fAaq1XQQVjN36fjFcZxhHh9J7sJF2E3_zSRQ49dsU4GHmkqaI6jJdYv1SE9JseW4eMvySjke7OdM5DlCM_SoLZIe-uOWgDBBvByUJFG1HtYCaSG3-p2D4OtcDex0PIr3BrbEfToA4riEgg17KknU5TIamD3hQQcvPByjqoZPqjyuoXaIs4naaJS-tRpH5bBuPydBtlCwAjMpfLMycDra1h_Bgxg-s43hQ1j6dtXH_carnE5yzPFL7LQq0pHUeAgCDdp4igV6nwKN8RWGHL7WfQ7jVQIkC1iw6kNBuZOYNBV3egKWGtuMquaPCkB6-0NXQpR4AR0TvKyh3KZaFEeQ";

const TEST_TTL: Duration = Duration::from_secs(3600);

/// JWKS document publishing the `k1` public key.
pub fn jwks_json() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": KID,
            "alg": "RS256",
            "use": "sig",
            "n": K1_MODULUS,
            "e": "AQAB"
        }]
    })
}

pub fn provider_config() -> ProviderConfig {
    ProviderConfig::new(REGION, POOL_ID, CLIENT_ID)
}

pub fn config_cache() -> Arc<ConfigCache> {
    Arc::new(ConfigCache::new(
        Arc::new(provider_config()),
        TEST_TTL,
        Arc::new(ManualClock::default()),
    ))
}

/// Valid claims for `sub`, expiring one hour after `clock`'s now.
pub fn claims_for(clock: &ManualClock, sub: &str) -> Value {
    let now = clock.now().timestamp();
    json!({
        "sub": sub,
        "aud": CLIENT_ID,
        "iss": ISSUER,
        "email": format!("{sub}@example.com"),
        "cognito:username": sub,
        "token_use": "id",
        "iat": now,
        "exp": now + 3600
    })
}

/// Sign `claims` with RS256 under header `kid`.
pub fn sign_token(kid: &str, claims: &Value, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Key fetcher serving a fixed document and counting calls.
pub struct CountingKeyFetcher {
    document: Value,
    pub calls: AtomicUsize,
    /// When set, every fetch fails
    pub fail: AtomicBool,
}

impl CountingKeyFetcher {
    pub fn serving(document: Value) -> Self {
        Self {
            document,
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let fetcher = Self::default();
        fetcher.fail.store(true, Ordering::SeqCst);
        fetcher
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingKeyFetcher {
    fn default() -> Self {
        Self::serving(jwks_json())
    }
}

impl KeyFetcher for CountingKeyFetcher {
    fn fetch(&self) -> BoxFuture<'_, Result<JwkSet, FetchError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
            }
            serde_json::from_value(self.document.clone())
                .map_err(|e| FetchError::InvalidDocument(e.to_string()))
        })
    }
}

/// Configuration source that never loads.
struct MissingConfig;

impl ConfigSource for MissingConfig {
    fn load(&self) -> Result<ProviderConfig, ConfigError> {
        Err(ConfigError::Missing(COGNITO_USER_POOL_ID_ENV))
    }
}

fn config_source(config: Option<ProviderConfig>) -> Arc<dyn ConfigSource> {
    match config {
        Some(config) => Arc::new(config),
        None => Arc::new(MissingConfig),
    }
}

/// A verifier over `fetcher`; `None` config means configuration never loads.
pub fn verifier(
    fetcher: CountingKeyFetcher,
    config: Option<ProviderConfig>,
    clock: Arc<ManualClock>,
) -> TokenVerifier {
    let keys = Arc::new(KeyCache::new(Arc::new(fetcher), TEST_TTL, clock.clone()));
    let config = Arc::new(ConfigCache::new(config_source(config), TEST_TTL, clock.clone()));
    TokenVerifier::new(keys, config, clock)
}

/// A verifier with its clock and key fetcher exposed.
pub struct Harness {
    pub verifier: TokenVerifier,
    pub clock: Arc<ManualClock>,
    pub fetcher: Arc<CountingKeyFetcher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fetcher(CountingKeyFetcher::default())
    }

    pub fn with_fetcher(fetcher: CountingKeyFetcher) -> Self {
        let clock = Arc::new(ManualClock::default());
        let fetcher = Arc::new(fetcher);
        let keys = Arc::new(KeyCache::new(fetcher.clone(), TEST_TTL, clock.clone()));
        let config = Arc::new(ConfigCache::new(
            config_source(Some(provider_config())),
            TEST_TTL,
            clock.clone(),
        ));
        Self {
            verifier: TokenVerifier::new(keys, config, clock.clone()),
            clock,
            fetcher,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectoryMode {
    Serve,
    Fail,
    Panic,
}

/// Group directory returning canned groups.
pub struct StubDirectory {
    groups: Vec<String>,
    mode: DirectoryMode,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
    last_username: Mutex<Option<String>>,
}

impl StubDirectory {
    fn with_mode(groups: &[&str], mode: DirectoryMode) -> Self {
        Self {
            groups: groups.iter().map(|g| g.to_string()).collect(),
            mode,
            delay: None,
            calls: AtomicUsize::new(0),
            last_username: Mutex::new(None),
        }
    }

    pub fn groups(groups: &[&str]) -> Self {
        Self::with_mode(groups, DirectoryMode::Serve)
    }

    /// Every lookup is rejected by the provider.
    pub fn failing() -> Self {
        Self::with_mode(&[], DirectoryMode::Fail)
    }

    /// Every lookup panics.
    pub fn panicking() -> Self {
        Self::with_mode(&[], DirectoryMode::Panic)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_username(&self) -> Option<String> {
        self.last_username.lock().unwrap().clone()
    }
}

impl GroupDirectory for StubDirectory {
    fn list_groups<'a>(
        &'a self,
        _user_pool_id: &'a str,
        username: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, GroupLookupError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_username.lock().unwrap() = Some(username.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.mode {
                DirectoryMode::Serve => Ok(self.groups.clone()),
                DirectoryMode::Fail => Err(GroupLookupError::Rejected {
                    status: 400,
                    message: "UserNotFoundException: User does not exist.".to_string(),
                }),
                DirectoryMode::Panic => panic!("group directory exploded"),
            }
        })
    }
}

/// A decision engine wired to stubs, sharing one manual clock.
pub struct EngineHarness {
    pub engine: DecisionEngine,
    pub clock: Arc<ManualClock>,
    pub fetcher: Arc<CountingKeyFetcher>,
    pub directory: Arc<StubDirectory>,
    pub keys: Arc<KeyCache>,
    config: Arc<ConfigCache>,
}

impl EngineHarness {
    pub fn new(directory: StubDirectory) -> Self {
        Self::build(CountingKeyFetcher::default(), directory, Some(provider_config()))
    }

    pub fn with_fetcher(fetcher: CountingKeyFetcher, directory: StubDirectory) -> Self {
        Self::build(fetcher, directory, Some(provider_config()))
    }

    pub fn without_config(directory: StubDirectory) -> Self {
        Self::build(CountingKeyFetcher::default(), directory, None)
    }

    fn build(
        fetcher: CountingKeyFetcher,
        directory: StubDirectory,
        config: Option<ProviderConfig>,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let fetcher = Arc::new(fetcher);
        let directory = Arc::new(directory);
        let keys = Arc::new(KeyCache::new(fetcher.clone(), TEST_TTL, clock.clone()));
        let config = Arc::new(ConfigCache::new(config_source(config), TEST_TTL, clock.clone()));

        let engine = engine_over(&keys, &config, &clock, &directory);
        Self {
            engine,
            clock,
            fetcher,
            directory,
            keys,
            config,
        }
    }

    /// A fresh engine over the same caches, clock and directory.
    pub fn rebuild_engine(&self) -> DecisionEngine {
        engine_over(&self.keys, &self.config, &self.clock, &self.directory)
    }
}

fn engine_over(
    keys: &Arc<KeyCache>,
    config: &Arc<ConfigCache>,
    clock: &Arc<ManualClock>,
    directory: &Arc<StubDirectory>,
) -> DecisionEngine {
    DecisionEngine::new(
        TokenVerifier::new(keys.clone(), config.clone(), clock.clone()),
        GroupResolver::new(directory.clone(), config.clone(), Duration::from_secs(1)),
        RoleMapping::default(),
    )
}
