// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles carried in every session token.
///
/// ## Role Hierarchy
///
/// - `User` - Regular account created through registration
/// - `Admin` - Operator account, may use the privileged login
/// - `Sudo` - Superuser, may use the privileged login
///
/// What each role may actually reach is decided by the policy set, not by
/// this enum. The enum only knows which roles count as privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account
    User,
    /// Operator
    Admin,
    /// Superuser
    Sudo,
}

impl Role {
    /// Whether the role may open a session through the privileged login.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::Sudo)
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "sudo" => Some(Role::Sudo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Sudo => "sudo",
        }
    }
}

impl Default for Role {
    /// Accounts created by registration start as `User`.
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_and_sudo_are_privileged() {
        assert!(!Role::User.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(Role::Sudo.is_privileged());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("SUDO"), Some(Role::Sudo));
        assert_eq!(Role::parse(" User "), Some(Role::User));
        assert_eq!(Role::parse("client"), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Sudo).unwrap(), r#""sudo""#);
        let parsed: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(parsed, Role::Admin);
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
