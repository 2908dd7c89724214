// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Cognito ID token verification for the marketplace API.
//!
//! ## Auth Flow
//!
//! 1. The web app signs the user in with the Cognito hosted UI
//! 2. The `id_token` cookie is sent with every API request
//! 3. The authorizer:
//!    - Fetches the user pool JWKS via HTTPS (cached, 1 hour TTL)
//!    - Verifies the JWT signature, expiry, audience and issuer
//!    - Lists the user's groups in the pool
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `email`
//!      - group membership → role label
//!
//! ## Security
//!
//! - The token header is only trusted to select the signing key
//! - Claims are read after the signature has verified
//! - A `kid` not in the cached key set is rejected, never refetched
//! - Key fetch and group lookup failures degrade to cached/empty data

pub mod claims;
pub mod cognito;
pub mod error;
pub mod extractor;
pub mod groups;
pub mod jwks;
pub mod provider;
pub mod roles;
pub mod sigv4;
pub mod verifier;

pub use claims::VerifiedClaims;
pub use error::{VerificationFailure, VerifyError};
pub use groups::{GroupDirectory, GroupResolver};
pub use jwks::{KeyCache, SigningKeySet};
pub use provider::{ConfigCache, ProviderConfig};
pub use roles::{Role, RoleMapping};
pub use verifier::TokenVerifier;
