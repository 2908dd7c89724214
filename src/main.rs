// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use marketplace_authorizer::api::router;
use marketplace_authorizer::config::{LogFormat, Settings, DEFAULT_LOG_FILTER};
use marketplace_authorizer::jwks_warmer::KeyWarmer;
use marketplace_authorizer::state::AppState;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match LogFormat::from_env() {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Missing pool or client id is fatal
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_settings(&settings) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();

    let warmer = settings.refresh_interval.map(|interval| {
        tokio::spawn(KeyWarmer::new(state.keys.clone(), interval).run(shutdown.clone()))
    });

    let addr: SocketAddr = match format!("{}:{}", settings.host, settings.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, host = %settings.host, "Failed to parse bind address");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        %addr,
        user_pool_id = %settings.user_pool_id,
        "Marketplace authorizer listening on http://{addr} (docs at /docs)"
    );

    let served = axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    shutdown.cancel();
    if let Some(warmer) = warmer {
        let _ = warmer.await;
    }

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
