// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization decisions: request in, allow/deny policy out.

pub mod engine;
pub mod policy;
pub mod request;

pub use engine::DecisionEngine;
pub use policy::{AuthorizationDecision, DecisionContext, Effect, PolicyDocument, Statement};
pub use request::AuthorizerRequest;
