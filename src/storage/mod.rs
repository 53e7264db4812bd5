// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Collaborators
//!
//! Everything the session subsystem persists lives outside this process:
//!
//! - **Identity store** (`identity`, `remote`): account records, reached over
//!   HTTP in production or held in memory in development mode
//! - **Refresh vault** (`vault`): the hashed current refresh credential per
//!   account, written onto the account record
//! - **Pending registrations** (`pending`): short-lived signup records with
//!   native expiry
//!
//! Handles are constructed once at startup and passed down explicitly.

pub mod identity;
pub mod pending;
pub mod remote;
pub mod vault;

pub use identity::{
    Account, AccountFilter, AccountUpdate, IdentityError, IdentityStore, InMemoryIdentityStore,
    NewAccount,
};
pub use pending::{
    InMemoryPendingStore, PendingRegistration, PendingRegistrationStore, PendingStoreError,
};
pub use remote::HttpIdentityStore;
pub use vault::{RefreshVault, VaultError};
