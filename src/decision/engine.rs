// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Decision Engine
//!
//! Turns one [`AuthorizerRequest`] into one [`AuthorizationDecision`].
//!
//! ## Outcomes
//!
//! | State | Effect | Principal |
//! |-------|--------|-----------|
//! | no token cookie | `Deny` | `anonymous` |
//! | token rejected by the verifier | `Deny` | `unauthorized` |
//! | token verified | `Allow` | token `sub` |
//! | internal error or panic | `Deny` | `error` |
//!
//! `authorize` never returns an error and never lets a panic escape.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use super::policy::{
    AuthorizationDecision, DecisionContext, ANONYMOUS_PRINCIPAL, ERROR_PRINCIPAL,
    UNAUTHORIZED_PRINCIPAL,
};
use super::request::AuthorizerRequest;
use crate::auth::extractor::extract_token;
use crate::auth::{GroupResolver, RoleMapping, TokenVerifier, VerifyError};
use crate::config::DEFAULT_ID_TOKEN_COOKIE;

/// Conditions that end in an `error` decision.
#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error("Provider configuration is unavailable")]
    ConfigUnavailable,
}

/// Orchestrates extraction, verification and group resolution.
pub struct DecisionEngine {
    verifier: TokenVerifier,
    groups: GroupResolver,
    roles: RoleMapping,
    cookie_name: String,
}

impl DecisionEngine {
    pub fn new(verifier: TokenVerifier, groups: GroupResolver, roles: RoleMapping) -> Self {
        Self {
            verifier,
            groups,
            roles,
            cookie_name: DEFAULT_ID_TOKEN_COOKIE.to_string(),
        }
    }

    /// Name of the cookie carrying the ID token.
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    /// Authorize a request. Always yields a decision.
    pub async fn authorize(&self, request: &AuthorizerRequest) -> AuthorizationDecision {
        let decision = match AssertUnwindSafe(self.evaluate(request)).catch_unwind().await {
            Ok(Ok(decision)) => decision,
            Ok(Err(e)) => {
                error!(error = %e, "Authorization error");
                AuthorizationDecision::deny(ERROR_PRINCIPAL, &request.route_arn)
            }
            Err(_) => {
                error!("Authorization panicked");
                AuthorizationDecision::deny(ERROR_PRINCIPAL, &request.route_arn)
            }
        };

        info!(
            principal = %decision.principal_id,
            effect = %decision.effect(),
            resource = %request.route_arn,
            "Generated policy"
        );
        decision
    }

    async fn evaluate(
        &self,
        request: &AuthorizerRequest,
    ) -> Result<AuthorizationDecision, AuthorizeError> {
        let Some(token) = extract_token(&request.cookies, &self.cookie_name) else {
            warn!("No token found in cookies");
            return Ok(AuthorizationDecision::deny(
                ANONYMOUS_PRINCIPAL,
                &request.route_arn,
            ));
        };

        let claims = match self.verifier.verify(&token).await {
            Ok(claims) => claims,
            // Failure kind is logged by the verifier
            Err(VerifyError::Rejected(_)) => {
                return Ok(AuthorizationDecision::deny(
                    UNAUTHORIZED_PRINCIPAL,
                    &request.route_arn,
                ));
            }
            Err(VerifyError::ConfigUnavailable) => return Err(AuthorizeError::ConfigUnavailable),
        };

        let groups = self.groups.resolve_groups(&claims.subject).await;
        let role = self.roles.role_for(&groups);
        info!(user_id = %claims.subject, role = %role, "Authorizing user");

        Ok(AuthorizationDecision::allow(
            claims.subject.clone(),
            &request.route_arn,
            DecisionContext {
                user_id: claims.subject,
                email: claims.email.unwrap_or_default(),
                user_role: role,
            },
        ))
    }
}
