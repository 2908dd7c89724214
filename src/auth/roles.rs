// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Marketplace roles derived from user pool groups.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role label passed downstream in the decision context.
///
/// - `Seller` - lists land on the marketplace
/// - `Buyer` - browses and purchases (default for authenticated users)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Buyer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group name to role table.
///
/// Rules are checked in order; the first group the user belongs to decides
/// the role. Users in none of the groups get the fallback.
#[derive(Debug, Clone)]
pub struct RoleMapping {
    rules: Vec<(String, Role)>,
    fallback: Role,
}

impl RoleMapping {
    pub fn new(fallback: Role) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    pub fn with_rule(mut self, group: impl Into<String>, role: Role) -> Self {
        self.rules.push((group.into(), role));
        self
    }

    pub fn role_for(&self, groups: &BTreeSet<String>) -> Role {
        self.rules
            .iter()
            .find(|(group, _)| groups.contains(group))
            .map(|(_, role)| *role)
            .unwrap_or(self.fallback)
    }
}

impl Default for RoleMapping {
    /// `Seller` group → seller, everyone else → buyer.
    fn default() -> Self {
        RoleMapping::new(Role::Buyer).with_rule("Seller", Role::Seller)
    }
}
