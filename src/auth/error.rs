// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Verification failures stay distinct all the way to the decision engine so
//! they can be told apart in logs. They are only collapsed into a single
//! `Deny` at the decision boundary.

/// Why a token failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    /// Token cannot be split into header, payload and signature, or its
    /// header/claims cannot be decoded
    #[error("Token is malformed")]
    Malformed,
    /// Header `kid` is not in the current signing key set
    #[error("No signing key with id `{0}`")]
    UnknownKey(String),
    /// Signature does not verify under the matched key
    #[error("Token signature is invalid")]
    BadSignature,
    /// `exp` is at or before the evaluation time
    #[error("Token has expired")]
    Expired,
    /// `aud` is not the configured client id
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// `iss` is not the user pool issuer URL
    #[error("Token issuer is invalid")]
    InvalidIssuer,
}

impl VerificationFailure {
    /// Stable code for logs and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationFailure::Malformed => "malformed",
            VerificationFailure::UnknownKey(_) => "unknown_key",
            VerificationFailure::BadSignature => "bad_signature",
            VerificationFailure::Expired => "expired",
            VerificationFailure::InvalidAudience => "invalid_audience",
            VerificationFailure::InvalidIssuer => "invalid_issuer",
        }
    }
}

/// Error returned by the token verifier.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The token was checked and rejected.
    #[error(transparent)]
    Rejected(#[from] VerificationFailure),
    /// The verifier could not run because the provider configuration is
    /// unavailable. Not a property of the token.
    #[error("Provider configuration is unavailable")]
    ConfigUnavailable,
}

/// Failure fetching the signing key document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("JWKS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {0} from JWKS endpoint")]
    Status(reqwest::StatusCode),
    #[error("JWKS document is invalid: {0}")]
    InvalidDocument(String),
}

/// Failure listing a user's groups.
#[derive(Debug, thiserror::Error)]
pub enum GroupLookupError {
    #[error("Group lookup is not configured: {0}")]
    NotConfigured(String),
    #[error("Group lookup request could not be signed: {0}")]
    Signing(String),
    #[error("Group lookup request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Group lookup rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Group lookup timed out")]
    Timeout,
    #[error("Group lookup response is invalid: {0}")]
    InvalidResponse(String),
}
