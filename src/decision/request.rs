// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Inbound authorization request.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::extractor::Cookies;

/// The request to authorize: its cookies and the route it targets.
///
/// Accepts the API Gateway HTTP API (payload v2) authorizer event; fields
/// other than `cookies` and `routeArn` are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub cookies: Cookies,
    /// Resource the decision applies to
    pub route_arn: String,
}

impl AuthorizerRequest {
    pub fn new(cookies: Cookies, route_arn: impl Into<String>) -> Self {
        Self {
            cookies,
            route_arn: route_arn.into(),
        }
    }
}
