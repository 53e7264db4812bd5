// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Issuer
//!
//! Orchestrates registration, confirmation, password login and refresh
//! rotation on top of the codec, the refresh vault and the two stores.
//!
//! ## Rotation
//!
//! Every successful confirm, login and refresh ends with a single
//! "replace stored refresh hash" write. A refresh token is therefore
//! single-use: once rotated, the old token no longer matches the vault and
//! fails with [`SessionError::UnknownSession`] even if it has not expired.
//! If that write fails, the whole call fails and the previous hash stays
//! authoritative.
//!
//! ## Origin binding
//!
//! Each refresh token carries the network address it was issued to. A refresh
//! from a different address still rotates, but a security notice is sent to
//! the account's contact in the background.
//!
//! ## Deadlines
//!
//! Every call into a store is bounded by `upstream_timeout`; an elapsed
//! deadline is reported as [`SessionError::UpstreamUnavailable`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::SessionError;
use super::validation::{
    normalize_contact, validate_contact, validate_display_name, validate_password,
};
use crate::auth::claims::TokenKind;
use crate::auth::codec::{CredentialCodec, TokenPair};
use crate::auth::password::{hash_password, verify_against_dummy, verify_password};
use crate::auth::Role;
use crate::notify::{dispatch_detached, NotificationSender, Notification};
use crate::storage::{
    Account, AccountFilter, IdentityError, IdentityStore, NewAccount, PendingRegistration,
    PendingRegistrationStore, RefreshVault,
};

/// Pending registration lifetime (3 minutes).
pub const DEFAULT_REGISTRATION_TTL: Duration = Duration::from_secs(180);

/// Deadline for a single store call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Access token lifetime for `admin` and `sudo` sessions.
pub const DEFAULT_PRIVILEGED_ACCESS_TTL: Duration = Duration::from_secs(5 * 60);

const CODE_DIGITS: usize = 6;

#[derive(Debug, Clone)]
pub struct IssuerSettings {
    pub registration_ttl: Duration,
    pub upstream_timeout: Duration,
    pub privileged_access_ttl: Duration,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            registration_ttl: DEFAULT_REGISTRATION_TTL,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            privileged_access_ttl: DEFAULT_PRIVILEGED_ACCESS_TTL,
        }
    }
}

/// A freshly authenticated account and its token pair.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account: Account,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionIssuer {
    identity: Arc<dyn IdentityStore>,
    pending: Arc<dyn PendingRegistrationStore>,
    vault: RefreshVault,
    codec: CredentialCodec,
    notifier: Arc<dyn NotificationSender>,
    settings: IssuerSettings,
}

impl SessionIssuer {
    pub fn new(
        identity: Arc<dyn IdentityStore>,
        pending: Arc<dyn PendingRegistrationStore>,
        codec: CredentialCodec,
        notifier: Arc<dyn NotificationSender>,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            vault: RefreshVault::new(identity.clone()),
            identity,
            pending,
            codec,
            notifier,
            settings,
        }
    }

    /// Start a registration and send the confirmation code.
    ///
    /// A second registration for the same contact replaces the first one,
    /// including its code and deadline.
    pub async fn register(
        &self,
        contact: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(), SessionError> {
        let contact = validate_contact(contact)?;
        let display_name = validate_display_name(display_name)?;
        validate_password(password)?;

        let exists = self
            .within("check_uniqueness", self.identity.check_uniqueness(&contact))
            .await??;
        if exists {
            info!("Registration rejected: contact already registered");
            return Err(SessionError::DuplicateContact);
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let code = generate_code();
        let record = PendingRegistration {
            contact: contact.clone(),
            code: code.clone(),
            display_name,
            password_hash,
        };
        self.within(
            "pending_put",
            self.pending.put(&contact, record, self.settings.registration_ttl),
        )
        .await??;

        // The record is already stored; a lost code only costs the user a retry.
        let notice = Notification::registration_code(&contact, &code);
        match self.within("notify", self.notifier.send(&notice)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to deliver registration code"),
            Err(_) => warn!("Registration code delivery timed out"),
        }

        info!(
            ttl_secs = self.settings.registration_ttl.as_secs(),
            "Registration pending confirmation"
        );
        Ok(())
    }

    /// Confirm a pending registration and open the first session.
    ///
    /// This is the only path that creates accounts.
    pub async fn confirm_registration(
        &self,
        contact: &str,
        code: &str,
        origin: &str,
    ) -> Result<IssuedSession, SessionError> {
        let contact = normalize_contact(contact);
        let pending = self
            .within("pending_get", self.pending.get(&contact))
            .await??
            .ok_or(SessionError::ExpiredOrNotFound)?;

        if !codes_match(&pending.code, code.trim()) {
            info!("Registration confirmation code mismatch");
            return Err(SessionError::CodeMismatch);
        }

        let id = Uuid::new_v4();
        let role = Role::User;
        let tokens = self
            .codec
            .mint(&id.to_string(), role, origin, self.access_ttl_for(role))?;
        let refresh_token_hash = self.vault.seal(&tokens.refresh_token)?;

        let account = self
            .within(
                "create_account",
                self.identity.create_account(NewAccount {
                    id,
                    contact: pending.contact,
                    display_name: pending.display_name,
                    role,
                    password_hash: pending.password_hash,
                    refresh_token_hash: Some(refresh_token_hash),
                }),
            )
            .await??;

        // Consume the code. If this fails the record still dies with its TTL
        // and a replay hits the contact uniqueness check.
        match self.within("pending_delete", self.pending.delete(&contact)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to delete consumed registration"),
            Err(_) => warn!("Deleting consumed registration timed out"),
        }

        info!(account_id = %account.id, origin = %origin, "Account created");
        Ok(IssuedSession { account, tokens })
    }

    /// Password login.
    ///
    /// Unknown contact and wrong password are indistinguishable to the
    /// caller, including in response time.
    pub async fn login(
        &self,
        contact: &str,
        password: &str,
        origin: &str,
    ) -> Result<IssuedSession, SessionError> {
        let account = self.authenticate(contact, password).await?;
        self.start_session(account, origin).await
    }

    /// Password login restricted to `admin` and `sudo`.
    ///
    /// The password is checked first, so a caller without valid credentials
    /// learns nothing about the account's role.
    pub async fn login_privileged(
        &self,
        contact: &str,
        password: &str,
        origin: &str,
    ) -> Result<IssuedSession, SessionError> {
        let account = self.authenticate(contact, password).await?;
        if !account.role.is_privileged() {
            warn!(account_id = %account.id, "Privileged login refused for non-privileged role");
            return Err(SessionError::PermissionDenied);
        }
        self.start_session(account, origin).await
    }

    /// Exchange a refresh token for a new pair bound to `origin`.
    pub async fn refresh_session(
        &self,
        presented: &str,
        origin: &str,
    ) -> Result<TokenPair, SessionError> {
        let claims = self.codec.verify(presented, TokenKind::Refresh)?;
        let account_id =
            Uuid::parse_str(&claims.sub).map_err(|_| SessionError::InvalidCredential)?;

        let account = match self
            .within("get_account", self.identity.get_account(AccountFilter::ById(account_id)))
            .await?
        {
            Ok(account) => account,
            Err(IdentityError::NotFound) => return Err(SessionError::UnknownSession),
            Err(e) => return Err(e.into()),
        };

        if !self.vault.matches_record(&account, presented) {
            warn!(account_id = %account.id, origin = %origin, "Superseded refresh token presented");
            return Err(SessionError::UnknownSession);
        }

        let tokens = self.codec.mint(
            &account.id.to_string(),
            account.role,
            origin,
            self.access_ttl_for(account.role),
        )?;
        self.within("vault_store", self.vault.store(account.id, &tokens.refresh_token))
            .await??;

        // Only a completed rotation notifies; a failed one leaves the old
        // token live and the retry reports the move.
        if claims.origin != origin {
            warn!(
                account_id = %account.id,
                issued_to = %claims.origin,
                origin = %origin,
                "Refresh token presented from a different origin"
            );
            dispatch_detached(
                self.notifier.clone(),
                Notification::origin_mismatch(&account.contact, &claims.origin, origin),
            );
        }

        info!(account_id = %account.id, "Session refreshed");
        Ok(tokens)
    }

    async fn authenticate(&self, contact: &str, password: &str) -> Result<Account, SessionError> {
        let contact = normalize_contact(contact);
        let account = match self
            .within(
                "get_account",
                self.identity.get_account(AccountFilter::ByContact(contact)),
            )
            .await?
        {
            Ok(account) => Some(account),
            Err(IdentityError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let verifier = account.as_ref().map(|a| a.password_hash.clone());
        let verified = verify_blocking(password.to_string(), verifier).await?;

        match account {
            Some(account) if verified => Ok(account),
            _ => {
                info!("Login failed");
                Err(SessionError::InvalidCredentials)
            }
        }
    }

    async fn start_session(
        &self,
        account: Account,
        origin: &str,
    ) -> Result<IssuedSession, SessionError> {
        let tokens = self.codec.mint(
            &account.id.to_string(),
            account.role,
            origin,
            self.access_ttl_for(account.role),
        )?;
        self.within("vault_store", self.vault.store(account.id, &tokens.refresh_token))
            .await??;

        info!(account_id = %account.id, role = %account.role, origin = %origin, "Session issued");
        Ok(IssuedSession { account, tokens })
    }

    fn access_ttl_for(&self, role: Role) -> Option<Duration> {
        role.is_privileged()
            .then_some(self.settings.privileged_access_ttl)
    }

    /// Run a store call under the upstream deadline.
    async fn within<F: Future>(
        &self,
        operation: &'static str,
        call: F,
    ) -> Result<F::Output, SessionError> {
        tokio::time::timeout(self.settings.upstream_timeout, call)
            .await
            .map_err(|_| {
                warn!(
                    operation,
                    timeout_ms = self.settings.upstream_timeout.as_millis() as u64,
                    "Upstream call timed out"
                );
                SessionError::UpstreamUnavailable
            })
    }
}

fn generate_code() -> String {
    let n: u32 = OsRng.gen_range(0..10u32.pow(CODE_DIGITS as u32));
    format!("{n:0width$}", width = CODE_DIGITS)
}

fn codes_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

// Argon2 is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String) -> Result<String, SessionError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| SessionError::Internal(format!("hashing task failed: {e}")))?
        .map_err(SessionError::from)
}

async fn verify_blocking(password: String, verifier: Option<String>) -> Result<bool, SessionError> {
    tokio::task::spawn_blocking(move || match verifier {
        Some(verifier) => verify_password(&password, &verifier),
        None => verify_against_dummy(&password),
    })
    .await
    .map_err(|e| SessionError::Internal(format!("verification task failed: {e}")))
}
