// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::codec::CredentialCodec;
use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::notify::{Notification, NotificationSender, NotifyError};
use crate::policy::PolicyGate;
use crate::session::{IssuerSettings, SessionIssuer};
use crate::state::AppState;
use crate::storage::identity::IdentityResult;
use crate::storage::{
    Account, AccountFilter, AccountUpdate, IdentityError, IdentityStore, InMemoryIdentityStore,
    InMemoryPendingStore, NewAccount,
};

pub const SECRET: &[u8] = b"test-secret-test-secret-test-secret!";
pub const ISSUER: &str = "identity-session";

pub fn codec() -> CredentialCodec {
    CredentialCodec::new(SECRET, ISSUER)
}

/// Forwards every notification to a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<Notification>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                fail: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        let (notifier, _) = Self::new();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("relay down".to_string()));
        }
        let _ = self.tx.send(notification.clone());
        Ok(())
    }
}

/// In-memory identity store with switchable faults.
#[derive(Default)]
pub struct FaultyIdentityStore {
    inner: InMemoryIdentityStore,
    fail_updates: AtomicBool,
    stall: AtomicBool,
}

impl FaultyIdentityStore {
    /// Make `update_account` report the store as unavailable.
    pub fn fail_updates(&self, on: bool) {
        self.fail_updates.store(on, Ordering::SeqCst);
    }

    /// Make every call hang far past any test deadline.
    pub fn stall(&self, on: bool) {
        self.stall.store(on, Ordering::SeqCst);
    }

    async fn maybe_stall(&self) {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

#[async_trait]
impl IdentityStore for FaultyIdentityStore {
    async fn create_account(&self, account: NewAccount) -> IdentityResult<Account> {
        self.maybe_stall().await;
        self.inner.create_account(account).await
    }

    async fn get_account(&self, filter: AccountFilter) -> IdentityResult<Account> {
        self.maybe_stall().await;
        self.inner.get_account(filter).await
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> IdentityResult<()> {
        self.maybe_stall().await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("injected failure".to_string()));
        }
        self.inner.update_account(id, update).await
    }

    async fn check_uniqueness(&self, contact: &str) -> IdentityResult<bool> {
        self.maybe_stall().await;
        self.inner.check_uniqueness(contact).await
    }

    async fn ping(&self) -> IdentityResult<()> {
        self.maybe_stall().await;
        self.inner.ping().await
    }
}

pub struct Harness {
    pub issuer: SessionIssuer,
    pub codec: CredentialCodec,
    pub identity: Arc<FaultyIdentityStore>,
    pub pending: Arc<InMemoryPendingStore>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
    notifier_fail: Arc<AtomicBool>,
}

impl Harness {
    pub fn notifier_fails(&self, on: bool) {
        self.notifier_fail.store(on, Ordering::SeqCst);
    }
}

pub fn harness() -> Harness {
    harness_with(IssuerSettings::default())
}

pub fn harness_with(settings: IssuerSettings) -> Harness {
    let identity = Arc::new(FaultyIdentityStore::default());
    let pending = Arc::new(InMemoryPendingStore::new(100));
    let (notifier, notifications) = RecordingNotifier::new();
    let notifier_fail = notifier.fail.clone();
    let codec = codec();
    let issuer = SessionIssuer::new(
        identity.clone(),
        pending.clone(),
        codec.clone(),
        Arc::new(notifier),
        settings,
    );
    Harness {
        issuer,
        codec,
        identity,
        pending,
        notifications,
        notifier_fail,
    }
}

/// Create an account directly in the identity store.
pub async fn seed_account(h: &Harness, contact: &str, password: &str, role: Role) -> Account {
    h.identity
        .create_account(NewAccount {
            id: Uuid::new_v4(),
            contact: contact.to_string(),
            display_name: "Seeded".to_string(),
            role,
            password_hash: hash_password(password).unwrap(),
            refresh_token_hash: None,
        })
        .await
        .unwrap()
}

/// HTTP state over the harness collaborators.
pub fn app_state(h: &Harness, policy: PolicyGate, trust_forwarded_for: bool) -> AppState {
    AppState::new(
        h.issuer.clone(),
        h.codec.clone(),
        Arc::new(policy),
        h.identity.clone(),
        trust_forwarded_for,
    )
}
