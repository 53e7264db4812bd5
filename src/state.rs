// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::codec::CredentialCodec;
use crate::auth::password::hash_password;
use crate::auth::Role;
use crate::config::{ConfigError, Settings, IDENTITY_STORE_URL_ENV, NOTIFY_WEBHOOK_URL_ENV};
use crate::notify::{LogNotifier, NotificationSender, WebhookNotifier};
use crate::policy::PolicyGate;
use crate::session::validation::validate_contact;
use crate::session::SessionIssuer;
use crate::storage::{
    Account, HttpIdentityStore, IdentityStore, InMemoryIdentityStore, InMemoryPendingStore,
};

#[derive(Clone)]
pub struct AppState {
    pub issuer: SessionIssuer,
    pub codec: CredentialCodec,
    pub policy: Arc<PolicyGate>,
    pub identity: Arc<dyn IdentityStore>,
    /// Take the client origin from `X-Forwarded-For` when present.
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(
        issuer: SessionIssuer,
        codec: CredentialCodec,
        policy: Arc<PolicyGate>,
        identity: Arc<dyn IdentityStore>,
        trust_forwarded_for: bool,
    ) -> Self {
        Self {
            issuer,
            codec,
            policy,
            identity,
            trust_forwarded_for,
        }
    }

    /// Construct every collaborator from settings.
    pub async fn build(settings: &Settings, policy: Arc<PolicyGate>) -> Result<Self, ConfigError> {
        let identity: Arc<dyn IdentityStore> = match &settings.identity_store_url {
            Some(url) => {
                info!(url = %url, "Using remote identity store");
                if settings.seed_admin.is_some() {
                    warn!("SEED_ADMIN_CONTACT ignored, seeding only applies to the in-memory store");
                }
                Arc::new(
                    HttpIdentityStore::new(url.clone(), settings.upstream_timeout).map_err(
                        |e| ConfigError::Invalid {
                            var: IDENTITY_STORE_URL_ENV,
                            reason: e.to_string(),
                        },
                    )?,
                )
            }
            None => {
                warn!("IDENTITY_STORE_URL not set, accounts are kept in memory (development mode)");
                let store = InMemoryIdentityStore::new();
                if let Some(seed) = &settings.seed_admin {
                    seed_admin(&store, &seed.contact, &seed.password).await?;
                }
                Arc::new(store)
            }
        };

        let notifier: Arc<dyn NotificationSender> = match &settings.notify_webhook_url {
            Some(url) => Arc::new(
                WebhookNotifier::new(url.clone(), settings.upstream_timeout).map_err(|e| {
                    ConfigError::Invalid {
                        var: NOTIFY_WEBHOOK_URL_ENV,
                        reason: e.to_string(),
                    }
                })?,
            ),
            None => {
                info!("NOTIFY_WEBHOOK_URL not set, notifications are only logged");
                Arc::new(LogNotifier)
            }
        };

        let pending = Arc::new(InMemoryPendingStore::new(settings.pending_capacity));
        let codec = settings.codec();
        let issuer = SessionIssuer::new(
            identity.clone(),
            pending,
            codec.clone(),
            notifier,
            settings.issuer_settings(),
        );

        Ok(Self::new(
            issuer,
            codec,
            policy,
            identity,
            settings.trust_forwarded_for,
        ))
    }
}

async fn seed_admin(
    store: &InMemoryIdentityStore,
    contact: &str,
    password: &str,
) -> Result<(), ConfigError> {
    let contact = validate_contact(contact).map_err(|e| ConfigError::Invalid {
        var: crate::config::SEED_ADMIN_CONTACT_ENV,
        reason: e.to_string(),
    })?;
    let password_hash = hash_password(password).map_err(|e| ConfigError::Invalid {
        var: crate::config::SEED_ADMIN_PASSWORD_ENV,
        reason: e.to_string(),
    })?;
    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        contact,
        display_name: "Administrator".to_string(),
        role: Role::Sudo,
        password_hash,
        refresh_token_hash: None,
        created_at: now,
        updated_at: now,
    };
    info!(account_id = %account.id, "Seeded sudo account");
    store.insert(account).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicySet;
    use crate::storage::AccountFilter;

    fn settings(extra: &[(&str, &str)]) -> Settings {
        let mut env: Vec<(String, String)> = vec![(
            "TOKEN_SIGNING_SECRET".to_string(),
            "0123456789abcdef0123456789abcdef".to_string(),
        )];
        env.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Settings::from_lookup(|key| {
            env.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn development_mode_seeds_sudo_account() {
        let settings = settings(&[
            ("SEED_ADMIN_CONTACT", "Root@X.com"),
            ("SEED_ADMIN_PASSWORD", "Sup3rSecret"),
        ]);
        let state = AppState::build(&settings, Arc::new(PolicyGate::new(PolicySet::deny_all())))
            .await
            .unwrap();

        let admin = state
            .identity
            .get_account(AccountFilter::ByContact("root@x.com".to_string()))
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Sudo);

        let session = state
            .issuer
            .login_privileged("root@x.com", "Sup3rSecret", "127.0.0.1")
            .await
            .unwrap();
        assert_eq!(session.account.id, admin.id);
    }

    #[tokio::test]
    async fn remote_store_is_selected_by_url() {
        let settings = settings(&[("IDENTITY_STORE_URL", "http://127.0.0.1:9/")]);
        let state = AppState::build(&settings, Arc::new(PolicyGate::new(PolicySet::deny_all())))
            .await
            .unwrap();
        assert!(state.identity.ping().await.is_err());
    }
}
