// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Marketplace Authorizer - Cognito-backed authorization gate
//!
//! Decides, per API request, whether the caller may invoke the target route.
//! The caller's Cognito ID token is read from a cookie and verified against the
//! user pool's published signing keys. Group membership then selects a role
//! label for downstream handlers.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verification, key and configuration caches, group lookup
//! - `cache` - TTL cache with stale fallback
//! - `decision` - Allow/deny policy documents and the decision engine
//! - `jwks_warmer` - Background signing key refresh

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod jwks_warmer;
pub mod state;

#[cfg(test)]
mod testutil;
