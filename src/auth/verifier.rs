// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token verification.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. header parses and names a `kid`        → [`VerificationFailure::Malformed`]
//! 2. `kid` is in the cached signing keys    → [`VerificationFailure::UnknownKey`]
//! 3. signature verifies under that key      → [`VerificationFailure::BadSignature`]
//! 4. `exp` is in the future                 → [`VerificationFailure::Expired`]
//! 5. `aud` equals the app client id         → [`VerificationFailure::InvalidAudience`]
//! 6. `iss` equals the user pool issuer URL  → [`VerificationFailure::InvalidIssuer`]
//!
//! The header is read before the signature is checked, but only to select the
//! key. The payload is not decoded until the signature has verified.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::DateTime;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::{info, warn};

use super::claims::{TokenClaims, VerifiedClaims};
use super::error::{VerificationFailure, VerifyError};
use super::jwks::{jwk_to_decoding_key, KeyCache};
use super::provider::{ConfigCache, ProviderConfig};
use crate::clock::Clock;

/// Verifies ID tokens against the cached keys and provider configuration.
pub struct TokenVerifier {
    keys: Arc<KeyCache>,
    config: Arc<ConfigCache>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyCache>, config: Arc<ConfigCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            config,
            clock,
        }
    }

    /// Verify `token` and return its claims.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, VerifyError> {
        let config = self
            .config
            .get_config()
            .await
            .ok_or(VerifyError::ConfigUnavailable)?;

        match self.verify_with(token, &config).await {
            Ok(claims) => {
                info!(user_id = %claims.subject, "Token verified");
                Ok(claims)
            }
            Err(failure) => {
                warn!(
                    failure_kind = failure.kind(),
                    error = %failure,
                    "Token verification failed"
                );
                Err(failure.into())
            }
        }
    }

    async fn verify_with(
        &self,
        token: &str,
        config: &ProviderConfig,
    ) -> Result<VerifiedClaims, VerificationFailure> {
        if token.split('.').count() != 3 {
            return Err(VerificationFailure::Malformed);
        }

        // Untrusted: only used to pick the key
        let header = decode_header(token).map_err(|_| VerificationFailure::Malformed)?;
        let kid = header.kid.ok_or(VerificationFailure::Malformed)?;

        let keys = self.keys.get_signing_keys().await;
        let jwk = keys
            .get(&kid)
            .ok_or_else(|| VerificationFailure::UnknownKey(kid.clone()))?;

        let (decoding_key, algorithm) = jwk_to_decoding_key(jwk).map_err(|e| {
            warn!(kid = %kid, error = %e, "Cannot build verification key");
            VerificationFailure::BadSignature
        })?;

        // Signature only; claims are checked below against the injected clock.
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let claims = decode::<TokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey => VerificationFailure::BadSignature,
                _ => VerificationFailure::Malformed,
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(VerificationFailure::Expired);
        }

        if claims.audience() != Some(config.app_client_id.as_str()) {
            return Err(VerificationFailure::InvalidAudience);
        }

        let expected_issuer = config.issuer();
        if claims.iss.as_deref() != Some(expected_issuer.as_str()) {
            return Err(VerificationFailure::InvalidIssuer);
        }

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(VerificationFailure::Malformed)?;

        Ok(VerifiedClaims {
            subject: claims.sub,
            expires_at,
            audience: config.app_client_id.clone(),
            issuer: expected_issuer,
            email: claims.email,
            extra: claims.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::TimeDelta;
    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::clock::ManualClock;
    use crate::testutil::{
        claims_for, sign_token, verifier, CountingKeyFetcher, Harness, CLIENT_ID, KID, ROGUE_KEY,
        SIGNING_KEY,
    };

    async fn rejection(harness: &Harness, token: &str) -> VerificationFailure {
        match harness.verifier.verify(token).await {
            Err(VerifyError::Rejected(failure)) => failure,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, SIGNING_KEY);

        let verified = harness.verifier.verify(&token).await.unwrap();
        assert_eq!(verified.subject, "u-42");
        assert_eq!(verified.audience, CLIENT_ID);
        assert_eq!(verified.email.as_deref(), Some("u-42@example.com"));
        assert_eq!(verified.expires_at.timestamp(), claims["exp"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn rejects_token_without_three_parts() {
        let harness = Harness::new();
        assert_eq!(rejection(&harness, "not-a-jwt").await, VerificationFailure::Malformed);
        assert_eq!(rejection(&harness, "a.b").await, VerificationFailure::Malformed);
        assert_eq!(rejection(&harness, "a.b.c.d").await, VerificationFailure::Malformed);
    }

    #[tokio::test]
    async fn rejects_header_without_kid() {
        let harness = Harness::new();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u-42"}"#);
        let token = format!("{header}.{payload}.sig");
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::Malformed);
    }

    #[tokio::test]
    async fn rejects_unknown_kid_without_refetching() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");

        harness.verifier.verify(&sign_token(KID, &claims, SIGNING_KEY)).await.unwrap();
        let token = sign_token("k2", &claims, SIGNING_KEY);
        assert_eq!(
            rejection(&harness, &token).await,
            VerificationFailure::UnknownKey("k2".to_string())
        );
        assert_eq!(harness.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn empty_key_set_rejects_every_token() {
        let harness = Harness::with_fetcher(CountingKeyFetcher::failing());
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, SIGNING_KEY);
        assert_eq!(
            rejection(&harness, &token).await,
            VerificationFailure::UnknownKey(KID.to_string())
        );
    }

    #[tokio::test]
    async fn rejects_signature_from_other_key() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, ROGUE_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::BadSignature);
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, SIGNING_KEY);

        let mut parts: Vec<&str> = token.split('.').collect();
        let mut forged = claims.clone();
        forged["sub"] = "admin".into();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        parts[1] = &forged_payload;

        assert_eq!(
            rejection(&harness, &parts.join(".")).await,
            VerificationFailure::BadSignature
        );
    }

    #[tokio::test]
    async fn signature_is_checked_before_expiry() {
        let harness = Harness::new();
        let mut claims = claims_for(&harness.clock, "u-42");
        claims["exp"] = (harness.clock.now().timestamp() - 10).into();
        let token = sign_token(KID, &claims, ROGUE_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::BadSignature);
    }

    #[tokio::test]
    async fn rejects_algorithm_other_than_the_keys() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let mut header = jsonwebtoken::Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        let token = jsonwebtoken::encode(
            &header,
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::BadSignature);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, SIGNING_KEY);

        harness.clock.advance(TimeDelta::seconds(3601));
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::Expired);
    }

    #[tokio::test]
    async fn token_expires_at_exactly_exp() {
        let harness = Harness::new();
        let claims = claims_for(&harness.clock, "u-42");
        let token = sign_token(KID, &claims, SIGNING_KEY);
        let exp = claims["exp"].as_i64().unwrap();

        let until_exp = exp - harness.clock.now().timestamp();
        harness.clock.advance(TimeDelta::seconds(until_exp));
        assert_eq!(harness.clock.now().timestamp(), exp);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::Expired);
    }

    #[tokio::test]
    async fn rejects_wrong_audience() {
        let harness = Harness::new();
        let mut claims = claims_for(&harness.clock, "u-42");
        claims["aud"] = "another-client".into();
        let token = sign_token(KID, &claims, SIGNING_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::InvalidAudience);
    }

    #[tokio::test]
    async fn rejects_missing_audience() {
        let harness = Harness::new();
        let mut claims = claims_for(&harness.clock, "u-42");
        claims.as_object_mut().unwrap().remove("aud");
        let token = sign_token(KID, &claims, SIGNING_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::InvalidAudience);
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() {
        let harness = Harness::new();
        let mut claims = claims_for(&harness.clock, "u-42");
        claims["iss"] = "https://cognito-idp.eu-west-1.amazonaws.com/other-pool".into();
        let token = sign_token(KID, &claims, SIGNING_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::InvalidIssuer);
    }

    #[tokio::test]
    async fn signed_payload_without_subject_is_malformed() {
        let harness = Harness::new();
        let mut claims = claims_for(&harness.clock, "u-42");
        claims.as_object_mut().unwrap().remove("sub");
        let token = sign_token(KID, &claims, SIGNING_KEY);
        assert_eq!(rejection(&harness, &token).await, VerificationFailure::Malformed);
    }

    #[tokio::test]
    async fn missing_configuration_is_not_a_token_failure() {
        let clock = std::sync::Arc::new(ManualClock::default());
        let verifier = verifier(CountingKeyFetcher::default(), None, clock.clone());
        let token = sign_token(KID, &claims_for(&clock, "u-42"), SIGNING_KEY);

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::ConfigUnavailable));
    }
}
