// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Refresh credential vault.
//!
//! The vault keeps exactly one refresh credential hash per account, stored on
//! the account record in the identity store. Plaintext refresh tokens never
//! leave this module's call frame.
//!
//! ## Hash format
//!
//! ```text
//! hmac-sha256$<base64 salt>$<base64 HMAC-SHA256(key = salt, msg = token)>
//! ```
//!
//! Refresh tokens are long random-looking JWTs, so a salted keyed hash is
//! enough; a password KDF would only add latency to every refresh.
//! Comparison goes through `Mac::verify_slice`, which is constant time.

use std::sync::Arc;

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use super::identity::{Account, AccountFilter, AccountUpdate, IdentityError, IdentityStore};

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "hmac-sha256";
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("account not found")]
    AccountNotFound,

    #[error("vault backend unavailable: {0}")]
    Unavailable(String),

    #[error("vault hashing failed: {0}")]
    Hashing(String),
}

impl From<IdentityError> for VaultError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::NotFound => VaultError::AccountNotFound,
            IdentityError::Conflict(msg) | IdentityError::Unavailable(msg) => {
                VaultError::Unavailable(msg)
            }
        }
    }
}

/// Stores and checks hashed refresh credentials.
#[derive(Clone)]
pub struct RefreshVault {
    identity: Arc<dyn IdentityStore>,
}

impl RefreshVault {
    pub fn new(identity: Arc<dyn IdentityStore>) -> Self {
        Self { identity }
    }

    /// Produce the stored representation of a refresh token.
    ///
    /// Exposed so account creation can persist the first hash together with
    /// the account in a single write.
    pub fn seal(&self, refresh_token: &str) -> Result<String, VaultError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| VaultError::Hashing(format!("system RNG failure: {e}")))?;
        let digest = keyed_digest(&salt, refresh_token)?;
        Ok(format!(
            "{SCHEME}${}${}",
            Base64::encode_string(&salt),
            Base64::encode_string(&digest)
        ))
    }

    /// Replace the account's refresh hash with the hash of `refresh_token`.
    ///
    /// Overwrites unconditionally; the previously stored token stops
    /// matching as soon as this returns `Ok`.
    pub async fn store(&self, account_id: Uuid, refresh_token: &str) -> Result<(), VaultError> {
        let sealed = self.seal(refresh_token)?;
        self.identity
            .update_account(account_id, AccountUpdate::RefreshTokenHash(sealed))
            .await?;
        Ok(())
    }

    /// Whether `presented` is the account's current refresh token.
    ///
    /// Unknown accounts and accounts without a stored hash never match.
    pub async fn matches(&self, account_id: Uuid, presented: &str) -> Result<bool, VaultError> {
        let account = match self.identity.get_account(AccountFilter::ById(account_id)).await {
            Ok(account) => account,
            Err(IdentityError::NotFound) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(self.matches_record(&account, presented))
    }

    /// [`matches`](Self::matches) against an already fetched account record.
    pub fn matches_record(&self, account: &Account, presented: &str) -> bool {
        account
            .refresh_token_hash
            .as_deref()
            .is_some_and(|stored| verify_sealed(stored, presented))
    }
}

fn keyed_digest(salt: &[u8], token: &str) -> Result<Vec<u8>, VaultError> {
    let mut mac = HmacSha256::new_from_slice(salt)
        .map_err(|e| VaultError::Hashing(format!("invalid HMAC key: {e}")))?;
    mac.update(token.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify_sealed(stored: &str, presented: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(salt), Some(digest), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::warn!("Stored refresh hash has an unknown format");
        return false;
    };
    let (Ok(salt), Ok(digest)) = (Base64::decode_vec(salt), Base64::decode_vec(digest)) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
        return false;
    };
    mac.update(presented.as_bytes());
    mac.verify_slice(&digest).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::storage::identity::{InMemoryIdentityStore, NewAccount};

    async fn vault_with_account() -> (RefreshVault, Arc<InMemoryIdentityStore>, Uuid) {
        let store = Arc::new(InMemoryIdentityStore::new());
        let account = store
            .create_account(NewAccount {
                id: Uuid::new_v4(),
                contact: "a@x.com".to_string(),
                display_name: "Ann".to_string(),
                role: Role::User,
                password_hash: "$argon2id$stub".to_string(),
                refresh_token_hash: None,
            })
            .await
            .unwrap();
        (RefreshVault::new(store.clone()), store, account.id)
    }

    #[tokio::test]
    async fn stored_token_matches_and_others_do_not() {
        let (vault, _, id) = vault_with_account().await;
        vault.store(id, "refresh-one").await.unwrap();

        assert!(vault.matches(id, "refresh-one").await.unwrap());
        assert!(!vault.matches(id, "refresh-two").await.unwrap());
    }

    #[tokio::test]
    async fn store_supersedes_previous_token() {
        let (vault, _, id) = vault_with_account().await;
        vault.store(id, "refresh-one").await.unwrap();
        vault.store(id, "refresh-two").await.unwrap();

        assert!(!vault.matches(id, "refresh-one").await.unwrap());
        assert!(vault.matches(id, "refresh-two").await.unwrap());
    }

    #[tokio::test]
    async fn plaintext_is_never_stored() {
        let (vault, store, id) = vault_with_account().await;
        vault.store(id, "refresh-one").await.unwrap();

        let account = store.get_account(AccountFilter::ById(id)).await.unwrap();
        let stored = account.refresh_token_hash.unwrap();
        assert!(stored.starts_with("hmac-sha256$"));
        assert!(!stored.contains("refresh-one"));
    }

    #[tokio::test]
    async fn account_without_hash_or_unknown_account_never_matches() {
        let (vault, _, id) = vault_with_account().await;
        assert!(!vault.matches(id, "anything").await.unwrap());
        assert!(!vault.matches(Uuid::new_v4(), "anything").await.unwrap());
    }

    #[tokio::test]
    async fn store_for_unknown_account_fails() {
        let (vault, _, _) = vault_with_account().await;
        assert_eq!(
            vault.store(Uuid::new_v4(), "refresh-one").await,
            Err(VaultError::AccountNotFound)
        );
    }

    #[test]
    fn sealing_is_salted() {
        let vault = RefreshVault::new(Arc::new(InMemoryIdentityStore::new()));
        let a = vault.seal("same-token").unwrap();
        let b = vault.seal("same-token").unwrap();
        assert_ne!(a, b);

        let salt_a = a.split('$').nth(1).unwrap();
        let salt_b = b.split('$').nth(1).unwrap();
        assert_ne!(salt_a, salt_b);
        assert_eq!(Base64::decode_vec(salt_a).unwrap().len(), SALT_LEN);
        assert!(verify_sealed(&a, "same-token"));
        assert!(verify_sealed(&b, "same-token"));
    }

    #[test]
    fn malformed_stored_hash_never_matches() {
        assert!(!verify_sealed("plain", "plain"));
        assert!(!verify_sealed("hmac-sha256$!!$!!", "token"));
        assert!(!verify_sealed("md5$AAAA$AAAA", "token"));
    }
}
