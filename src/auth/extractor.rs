// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ID token extraction from request cookies.
//!
//! Cookies arrive either as a list of `name=value` strings (API Gateway v2
//! payload) or as a single `Cookie` header string. Both are normalized to the
//! header form and scanned in order; the first cookie with the configured
//! name wins.
//!
//! The value is the text between the first and second `=`. A value that itself
//! contains `=` (e.g. base64 padding) is therefore truncated. Cognito ID tokens
//! are unpadded base64url so this does not occur in practice; truncation is
//! logged when it happens.

use serde::Deserialize;
use tracing::warn;

/// Cookies carried by the inbound request.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Cookies {
    /// One `name=value` entry per cookie
    List(Vec<String>),
    /// A raw `Cookie` header (`a=1; b=2`)
    Header(String),
}

impl Default for Cookies {
    fn default() -> Self {
        Cookies::List(Vec::new())
    }
}

impl Cookies {
    /// The cookies in `Cookie` header form.
    pub fn header_string(&self) -> String {
        match self {
            Cookies::List(list) => list.join("; "),
            Cookies::Header(header) => header.clone(),
        }
    }
}

/// Find the token cookie and return its value.
///
/// Returns `None` if the cookie is absent or its value is empty.
pub fn extract_token(cookies: &Cookies, cookie_name: &str) -> Option<String> {
    let header = cookies.header_string();
    let prefix = format!("{cookie_name}=");

    let cookie = header.split("; ").find(|c| c.starts_with(&prefix))?;

    let mut parts = cookie.split('=');
    let value = parts.nth(1).unwrap_or_default();
    if parts.next().is_some() {
        warn!(
            cookie = cookie_name,
            "Token cookie value contains '=' and was truncated"
        );
    }

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
