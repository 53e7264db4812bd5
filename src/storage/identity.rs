// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity store contract.
//!
//! Accounts are owned by a separate identity service. This subsystem only
//! needs to create them, look them up, check contact uniqueness and write the
//! current refresh credential hash. Lookups and updates use closed enums so a
//! caller can never pass a filter key the store silently ignores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Role;

/// Account record as held by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Normalised contact address (e-mail)
    pub contact: String,
    pub display_name: String,
    pub role: Role,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Hash of the only refresh token currently accepted for this account
    #[serde(default)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub id: Uuid,
    pub contact: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
}

/// Single-account lookup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    ById(Uuid),
    ByContact(String),
    ByRefreshHash(String),
}

impl AccountFilter {
    /// Query parameter name and value for transport encodings.
    pub fn as_query(&self) -> (&'static str, String) {
        match self {
            AccountFilter::ById(id) => ("id", id.to_string()),
            AccountFilter::ByContact(contact) => ("contact", contact.clone()),
            AccountFilter::ByRefreshHash(hash) => ("refresh_token_hash", hash.clone()),
        }
    }
}

/// Account fields this subsystem is allowed to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountUpdate {
    /// Replace the stored refresh credential hash.
    RefreshTokenHash(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("account not found")]
    NotFound,

    #[error("account conflict: {0}")]
    Conflict(String),

    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity store operations consumed by the session issuer.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create_account(&self, account: NewAccount) -> IdentityResult<Account>;

    async fn get_account(&self, filter: AccountFilter) -> IdentityResult<Account>;

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> IdentityResult<()>;

    /// Returns `true` when an account with this contact already exists.
    async fn check_uniqueness(&self, contact: &str) -> IdentityResult<bool>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> IdentityResult<()>;
}

/// Process-local identity store.
///
/// Used in development mode (no `IDENTITY_STORE_URL`) and in tests. State is
/// lost on restart.
#[derive(Default)]
pub struct InMemoryIdentityStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed account, bypassing the registration flow.
    ///
    /// Used to seed operator accounts.
    pub async fn insert(&self, account: Account) {
        self.accounts.write().await.insert(account.id, account);
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn create_account(&self, account: NewAccount) -> IdentityResult<Account> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.id) {
            return Err(IdentityError::Conflict(format!("id {}", account.id)));
        }
        if accounts.values().any(|a| a.contact == account.contact) {
            return Err(IdentityError::Conflict("contact already registered".to_string()));
        }

        let now = Utc::now();
        let created = Account {
            id: account.id,
            contact: account.contact,
            display_name: account.display_name,
            role: account.role,
            password_hash: account.password_hash,
            refresh_token_hash: account.refresh_token_hash,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_account(&self, filter: AccountFilter) -> IdentityResult<Account> {
        let accounts = self.accounts.read().await;
        let found = match &filter {
            AccountFilter::ById(id) => accounts.get(id),
            AccountFilter::ByContact(contact) => accounts.values().find(|a| &a.contact == contact),
            AccountFilter::ByRefreshHash(hash) => accounts
                .values()
                .find(|a| a.refresh_token_hash.as_deref() == Some(hash.as_str())),
        };
        found.cloned().ok_or(IdentityError::NotFound)
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> IdentityResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or(IdentityError::NotFound)?;
        match update {
            AccountUpdate::RefreshTokenHash(hash) => account.refresh_token_hash = Some(hash),
        }
        account.updated_at = Utc::now();
        Ok(())
    }

    async fn check_uniqueness(&self, contact: &str) -> IdentityResult<bool> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().any(|a| a.contact == contact))
    }

    async fn ping(&self) -> IdentityResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(contact: &str) -> NewAccount {
        NewAccount {
            id: Uuid::new_v4(),
            contact: contact.to_string(),
            display_name: "Ann".to_string(),
            role: Role::User,
            password_hash: "$argon2id$stub".to_string(),
            refresh_token_hash: Some("v1$salt$digest".to_string()),
        }
    }

    #[tokio::test]
    async fn create_then_get_by_each_filter() {
        let store = InMemoryIdentityStore::new();
        let created = store.create_account(new_account("a@x.com")).await.unwrap();

        let by_id = store.get_account(AccountFilter::ById(created.id)).await.unwrap();
        let by_contact = store
            .get_account(AccountFilter::ByContact("a@x.com".to_string()))
            .await
            .unwrap();
        let by_hash = store
            .get_account(AccountFilter::ByRefreshHash("v1$salt$digest".to_string()))
            .await
            .unwrap();

        assert_eq!(by_id, created);
        assert_eq!(by_contact, created);
        assert_eq!(by_hash, created);
    }

    #[tokio::test]
    async fn duplicate_contact_is_a_conflict() {
        let store = InMemoryIdentityStore::new();
        store.create_account(new_account("a@x.com")).await.unwrap();
        let result = store.create_account(new_account("a@x.com")).await;
        assert!(matches!(result, Err(IdentityError::Conflict(_))));
        assert!(store.check_uniqueness("a@x.com").await.unwrap());
        assert!(!store.check_uniqueness("b@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn update_replaces_refresh_hash() {
        let store = InMemoryIdentityStore::new();
        let created = store.create_account(new_account("a@x.com")).await.unwrap();

        store
            .update_account(created.id, AccountUpdate::RefreshTokenHash("v1$new$hash".to_string()))
            .await
            .unwrap();

        let account = store.get_account(AccountFilter::ById(created.id)).await.unwrap();
        assert_eq!(account.refresh_token_hash.as_deref(), Some("v1$new$hash"));
        assert!(store
            .get_account(AccountFilter::ByRefreshHash("v1$salt$digest".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn update_unknown_account_is_not_found() {
        let store = InMemoryIdentityStore::new();
        let result = store
            .update_account(Uuid::new_v4(), AccountUpdate::RefreshTokenHash("x".to_string()))
            .await;
        assert_eq!(result, Err(IdentityError::NotFound));
    }

    #[test]
    fn filters_map_to_query_pairs() {
        let id = Uuid::new_v4();
        assert_eq!(AccountFilter::ById(id).as_query(), ("id", id.to_string()));
        assert_eq!(
            AccountFilter::ByContact("a@x.com".to_string()).as_query(),
            ("contact", "a@x.com".to_string())
        );
        assert_eq!(
            AccountFilter::ByRefreshHash("h".to_string()).as_query().0,
            "refresh_token_hash"
        );
    }
}
