// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup; a missing required value is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `COGNITO_REGION` | AWS region of the user pool | `us-east-1` |
//! | `COGNITO_USER_POOL_ID` | User pool id | Required |
//! | `COGNITO_APP_CLIENT_ID` | App client id (expected `aud`) | Required |
//! | `ID_TOKEN_COOKIE` | Cookie carrying the ID token | `id_token` |
//! | `JWKS_CACHE_TTL_SECS` | Key and configuration cache TTL | `3600` |
//! | `JWKS_REFRESH_INTERVAL_SECS` | Background key warmer period, `0` disables | `300` |
//! | `HTTP_TIMEOUT_SECS` | Timeout for outbound calls | `10` |
//! | `AWS_ACCESS_KEY_ID` | Credentials for the group lookup | Optional |
//! | `AWS_SECRET_ACCESS_KEY` | Credentials for the group lookup | Optional |
//! | `AWS_SESSION_TOKEN` | Session token for temporary credentials | Optional |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::cognito::AwsCredentials;

pub const COGNITO_REGION_ENV: &str = "COGNITO_REGION";
pub const COGNITO_USER_POOL_ID_ENV: &str = "COGNITO_USER_POOL_ID";
pub const COGNITO_APP_CLIENT_ID_ENV: &str = "COGNITO_APP_CLIENT_ID";
pub const ID_TOKEN_COOKIE_ENV: &str = "ID_TOKEN_COOKIE";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_REFRESH_INTERVAL_ENV: &str = "JWKS_REFRESH_INTERVAL_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "HTTP_TIMEOUT_SECS";
pub const AWS_ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ID_TOKEN_COOKIE: &str = "id_token";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("Environment variable {name} has invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Read a required, non-empty environment variable.
pub fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_env(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match optional_env(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Start-up settings for the authorizer service.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: String,
    pub user_pool_id: String,
    pub app_client_id: String,
    pub cookie_name: String,
    pub cache_ttl: Duration,
    pub refresh_interval: Option<Duration>,
    pub http_timeout: Duration,
    pub aws_credentials: Option<AwsCredentials>,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Load settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache_ttl = parsed_env(JWKS_CACHE_TTL_ENV, crate::cache::DEFAULT_CACHE_TTL.as_secs())?;
        let refresh_secs =
            parsed_env(JWKS_REFRESH_INTERVAL_ENV, DEFAULT_REFRESH_INTERVAL.as_secs())?;
        let http_timeout = parsed_env(HTTP_TIMEOUT_ENV, DEFAULT_HTTP_TIMEOUT.as_secs())?;

        let aws_credentials = match (
            optional_env(AWS_ACCESS_KEY_ID_ENV),
            optional_env(AWS_SECRET_ACCESS_KEY_ENV),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
                session_token: optional_env(AWS_SESSION_TOKEN_ENV),
            }),
            _ => None,
        };

        Ok(Self {
            region: optional_env(COGNITO_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            user_pool_id: required_env(COGNITO_USER_POOL_ID_ENV)?,
            app_client_id: required_env(COGNITO_APP_CLIENT_ID_ENV)?,
            cookie_name: optional_env(ID_TOKEN_COOKIE_ENV)
                .unwrap_or_else(|| DEFAULT_ID_TOKEN_COOKIE.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl),
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            http_timeout: Duration::from_secs(http_timeout),
            aws_credentials,
            host: optional_env(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed_env(PORT_ENV, 8080)?,
        })
    }
}
