// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    decision::{
        AuthorizationDecision, AuthorizerRequest, DecisionContext, Effect, PolicyDocument,
        Statement,
    },
    error::ErrorBody,
    state::AppState,
};

pub mod authorize;
pub mod health;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/authorize", post(authorize::authorize))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        authorize::authorize,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AuthorizerRequest,
            AuthorizationDecision,
            PolicyDocument,
            Statement,
            Effect,
            DecisionContext,
            Role,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Authorization", description = "Allow/deny decisions for API routes"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
