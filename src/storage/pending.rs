// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pending (unconfirmed) registrations keyed by contact address.
//!
//! Each entry carries its own TTL. A `get` after the TTL elapsed behaves
//! exactly like a `get` after `delete`. Writing a key that is already present
//! replaces both the record and its deadline.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};

/// A signup waiting for its confirmation code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    /// Normalised contact address
    pub contact: String,
    /// Six-digit confirmation code
    pub code: String,
    pub display_name: String,
    /// Argon2id verifier of the claimed password
    pub password_hash: String,
}

impl std::fmt::Debug for PendingRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRegistration")
            .field("contact", &self.contact)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PendingStoreError {
    #[error("pending registration store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PendingRegistrationStore: Send + Sync {
    async fn put(
        &self,
        contact: &str,
        record: PendingRegistration,
        ttl: Duration,
    ) -> Result<(), PendingStoreError>;

    /// `Ok(None)` covers both "never registered" and "window expired".
    async fn get(&self, contact: &str) -> Result<Option<PendingRegistration>, PendingStoreError>;

    async fn delete(&self, contact: &str) -> Result<(), PendingStoreError>;
}

struct CacheEntry {
    record: PendingRegistration,
    expires_at: Instant,
}

/// In-process pending registration store with per-entry expiry.
///
/// Bounded by `capacity`; when full, the least recently used registration is
/// evicted, which to its owner looks the same as an expired window.
pub struct InMemoryPendingStore {
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl InMemoryPendingStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, CacheEntry>>, PendingStoreError> {
        self.cache
            .lock()
            .map_err(|_| PendingStoreError::Unavailable("cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl PendingRegistrationStore for InMemoryPendingStore {
    async fn put(
        &self,
        contact: &str,
        record: PendingRegistration,
        ttl: Duration,
    ) -> Result<(), PendingStoreError> {
        let mut cache = self.lock()?;
        cache.put(
            contact.to_string(),
            CacheEntry {
                record,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, contact: &str) -> Result<Option<PendingRegistration>, PendingStoreError> {
        let mut cache = self.lock()?;
        if let Some(entry) = cache.get(contact) {
            if Instant::now() < entry.expires_at {
                return Ok(Some(entry.record.clone()));
            }
            // Expired
            cache.pop(contact);
        }
        Ok(None)
    }

    async fn delete(&self, contact: &str) -> Result<(), PendingStoreError> {
        let mut cache = self.lock()?;
        cache.pop(contact);
        Ok(())
    }
}
