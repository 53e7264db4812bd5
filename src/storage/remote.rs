// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the remote identity service.
//!
//! ## Contract
//!
//! | Operation | Request | Success |
//! |-----------|---------|---------|
//! | create | `POST /accounts` (JSON `NewAccount`) | `201` + `Account` |
//! | get | `GET /accounts?id=…` / `?contact=…` / `?refresh_token_hash=…` | `200` + `Account` |
//! | update | `PATCH /accounts/{id}` (JSON `AccountUpdate`) | `204` |
//! | uniqueness | `GET /accounts/exists?contact=…` | `200` + `{"exists": bool}` |
//! | ping | `GET /health` | `2xx` |
//!
//! `404` maps to [`IdentityError::NotFound`], `409` to
//! [`IdentityError::Conflict`]; every transport failure and any other status
//! maps to [`IdentityError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::identity::{
    Account, AccountFilter, AccountUpdate, IdentityError, IdentityResult, IdentityStore, NewAccount,
};

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    exists: bool,
}

/// Identity store reached over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpIdentityStore {
    base_url: Url,
    http: Client,
}

impl HttpIdentityStore {
    /// Create a client for the identity service rooted at `base_url`.
    ///
    /// `timeout` bounds every request at the transport level; the session
    /// issuer applies its own per-call deadline on top.
    pub fn new(mut base_url: Url, timeout: Duration) -> IdentityResult<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url, http })
    }

    fn endpoint(&self, path: &str) -> IdentityResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::Unavailable(format!("invalid identity store path: {e}")))
    }
}

fn transport(e: reqwest::Error) -> IdentityError {
    IdentityError::Unavailable(e.to_string())
}

fn status_error(status: StatusCode) -> IdentityError {
    match status {
        StatusCode::NOT_FOUND => IdentityError::NotFound,
        StatusCode::CONFLICT => IdentityError::Conflict("rejected by identity store".to_string()),
        other => IdentityError::Unavailable(format!("identity store returned HTTP {other}")),
    }
}

fn ensure_success(response: Response) -> IdentityResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response.status()))
    }
}

#[async_trait]
impl IdentityStore for HttpIdentityStore {
    async fn create_account(&self, account: NewAccount) -> IdentityResult<Account> {
        let response = self
            .http
            .post(self.endpoint("accounts")?)
            .json(&account)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response)?.json().await.map_err(transport)
    }

    async fn get_account(&self, filter: AccountFilter) -> IdentityResult<Account> {
        let (key, value) = filter.as_query();
        let response = self
            .http
            .get(self.endpoint("accounts")?)
            .query(&[(key, value)])
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response)?.json().await.map_err(transport)
    }

    async fn update_account(&self, id: Uuid, update: AccountUpdate) -> IdentityResult<()> {
        let response = self
            .http
            .patch(self.endpoint(&format!("accounts/{id}"))?)
            .json(&update)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).map(|_| ())
    }

    async fn check_uniqueness(&self, contact: &str) -> IdentityResult<bool> {
        let response = self
            .http
            .get(self.endpoint("accounts/exists")?)
            .query(&[("contact", contact)])
            .send()
            .await
            .map_err(transport)?;
        let body: ExistsResponse = ensure_success(response)?.json().await.map_err(transport)?;
        Ok(body.exists)
    }

    async fn ping(&self) -> IdentityResult<()> {
        let response = self
            .http
            .get(self.endpoint("health")?)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode as AxumStatus,
        routing::{get, patch, post},
        Json, Router,
    };

    use crate::auth::Role;
    use crate::storage::identity::InMemoryIdentityStore;

    type Backing = Arc<InMemoryIdentityStore>;

    async fn create(
        State(store): State<Backing>,
        Json(account): Json<NewAccount>,
    ) -> Result<(AxumStatus, Json<Account>), AxumStatus> {
        match store.create_account(account).await {
            Ok(created) => Ok((AxumStatus::CREATED, Json(created))),
            Err(IdentityError::Conflict(_)) => Err(AxumStatus::CONFLICT),
            Err(_) => Err(AxumStatus::INTERNAL_SERVER_ERROR),
        }
    }

    async fn lookup(
        State(store): State<Backing>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Account>, AxumStatus> {
        let filter = if let Some(id) = params.get("id") {
            AccountFilter::ById(id.parse().map_err(|_| AxumStatus::BAD_REQUEST)?)
        } else if let Some(contact) = params.get("contact") {
            AccountFilter::ByContact(contact.clone())
        } else if let Some(hash) = params.get("refresh_token_hash") {
            AccountFilter::ByRefreshHash(hash.clone())
        } else {
            return Err(AxumStatus::BAD_REQUEST);
        };
        store
            .get_account(filter)
            .await
            .map(Json)
            .map_err(|_| AxumStatus::NOT_FOUND)
    }

    async fn update(
        State(store): State<Backing>,
        Path(id): Path<Uuid>,
        Json(update): Json<AccountUpdate>,
    ) -> AxumStatus {
        match store.update_account(id, update).await {
            Ok(()) => AxumStatus::NO_CONTENT,
            Err(_) => AxumStatus::NOT_FOUND,
        }
    }

    async fn exists(
        State(store): State<Backing>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        let contact = params.get("contact").cloned().unwrap_or_default();
        let exists = store.check_uniqueness(&contact).await.unwrap_or(false);
        Json(serde_json::json!({ "exists": exists }))
    }

    async fn spawn_fake_identity_service() -> Url {
        let backing: Backing = Arc::new(InMemoryIdentityStore::new());
        let app = Router::new()
            .route("/v1/accounts", post(create).get(lookup))
            .route("/v1/accounts/exists", get(exists))
            .route("/v1/accounts/{id}", patch(update))
            .route("/v1/health", get(|| async { "ok" }))
            .with_state(backing);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/v1")).unwrap()
    }

    fn new_account(contact: &str) -> NewAccount {
        NewAccount {
            id: Uuid::new_v4(),
            contact: contact.to_string(),
            display_name: "Ann".to_string(),
            role: Role::User,
            password_hash: "$argon2id$stub".to_string(),
            refresh_token_hash: None,
        }
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let store = HttpIdentityStore::new(
            Url::parse("http://users.internal:9000/api").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            store.endpoint("accounts").unwrap().as_str(),
            "http://users.internal:9000/api/accounts"
        );
    }

    #[test]
    fn statuses_map_to_identity_errors() {
        assert_eq!(status_error(StatusCode::NOT_FOUND), IdentityError::NotFound);
        assert!(matches!(status_error(StatusCode::CONFLICT), IdentityError::Conflict(_)));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY),
            IdentityError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn full_contract_against_fake_service() {
        let base = spawn_fake_identity_service().await;
        let store = HttpIdentityStore::new(base, Duration::from_secs(5)).unwrap();

        store.ping().await.unwrap();
        assert!(!store.check_uniqueness("a@x.com").await.unwrap());

        let created = store.create_account(new_account("a@x.com")).await.unwrap();
        assert!(store.check_uniqueness("a@x.com").await.unwrap());
        assert!(matches!(
            store.create_account(new_account("a@x.com")).await,
            Err(IdentityError::Conflict(_))
        ));

        store
            .update_account(created.id, AccountUpdate::RefreshTokenHash("v1$s$d".to_string()))
            .await
            .unwrap();
        let fetched = store
            .get_account(AccountFilter::ByContact("a@x.com".to_string()))
            .await
            .unwrap();
        assert_eq!(fetched.refresh_token_hash.as_deref(), Some("v1$s$d"));

        assert_eq!(
            store.get_account(AccountFilter::ById(Uuid::new_v4())).await,
            Err(IdentityError::NotFound)
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Bind then drop to obtain a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpIdentityStore::new(
            Url::parse(&format!("http://{addr}/")).unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(store.ping().await, Err(IdentityError::Unavailable(_))));
    }
}
