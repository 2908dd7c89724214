// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Claims as they appear in a Cognito ID token payload.
///
/// Only deserialized after the signature has been verified. Nothing here is
/// trusted until the verifier has checked `exp`, `aud` and `iss`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenClaims {
    /// Subject (Cognito user id)
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Audience (app client id). A non-string value never matches.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,

    /// Issuer (user pool URL)
    #[serde(default)]
    pub iss: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Remaining claims (`cognito:username`, `token_use`, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn audience(&self) -> Option<&str> {
        self.aud.as_ref().and_then(serde_json::Value::as_str)
    }
}

/// The validated payload of a token.
///
/// Only produced by a successful verification; lives for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims {
    /// Canonical user id (`sub`)
    pub subject: String,
    pub expires_at: DateTime<Utc>,
    pub audience: String,
    pub issuer: String,
    pub email: Option<String>,
    pub extra: HashMap<String, serde_json::Value>,
}
