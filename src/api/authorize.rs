// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::decision::{AuthorizationDecision, AuthorizerRequest};
use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

/// Decide whether a request may invoke its route.
///
/// Always answers 200 with a decision once the body parses; denial is a
/// `Deny` policy, not an HTTP error.
#[utoipa::path(
    post,
    path = "/v1/authorize",
    tag = "Authorization",
    request_body = AuthorizerRequest,
    responses(
        (status = 200, description = "Authorization decision", body = AuthorizationDecision),
        (status = 400, description = "Body is not a request", body = ErrorBody),
        (status = 422, description = "Body is missing required fields", body = ErrorBody)
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    payload: Result<Json<AuthorizerRequest>, JsonRejection>,
) -> Result<Json<AuthorizationDecision>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.engine.authorize(&request).await))
}
