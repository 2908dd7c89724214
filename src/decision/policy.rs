// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization decision and its IAM-style policy document.
//!
//! Serialized in the API Gateway authorizer response shape:
//!
//! ```json
//! {
//!   "principalId": "u-42",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [{"Action": "execute-api:Invoke", "Effect": "Allow", "Resource": "arn:..."}]
//!   },
//!   "context": {"userId": "u-42", "email": "a@b.c", "userRole": "seller"}
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

/// Policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The single action every statement covers.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal for requests without a token cookie.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";
/// Principal for requests whose token failed verification.
pub const UNAUTHORIZED_PRINCIPAL: &str = "unauthorized";
/// Principal for requests that hit an internal error.
pub const ERROR_PRINCIPAL: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Effect {
    Allow,
    Deny,
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// A one-statement policy over [`INVOKE_ACTION`] on `resource`.
    pub fn single(effect: Effect, resource: impl Into<String>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: resource.into(),
            }],
        }
    }
}

/// Identity attributes handed downstream with an `Allow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub user_id: String,
    /// Empty when the token has no `email` claim
    pub email: String,
    pub user_role: Role,
}

/// Result of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDecision {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DecisionContext>,
}

impl AuthorizationDecision {
    pub fn allow(
        principal_id: impl Into<String>,
        resource: impl Into<String>,
        context: DecisionContext,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument::single(Effect::Allow, resource),
            context: Some(context),
        }
    }

    pub fn deny(principal_id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            policy_document: PolicyDocument::single(Effect::Deny, resource),
            context: None,
        }
    }

    /// Effect of the (single) statement. Anything unexpected reads as `Deny`.
    pub fn effect(&self) -> Effect {
        match self.policy_document.statement.as_slice() {
            [statement] => statement.effect,
            _ => Effect::Deny,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }
}
