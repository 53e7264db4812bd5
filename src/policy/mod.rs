// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Policy Gate
//!
//! Deny-by-default role/resource/method authorisation evaluated before every
//! protected route.
//!
//! ## Reload
//!
//! The live [`PolicySet`] sits behind an `RwLock<Arc<_>>`. Readers clone the
//! `Arc` and evaluate without holding the lock. [`PolicyGate::reload`]
//! parses and validates the whole file first and only then swaps the pointer,
//! so a bad file leaves the previous policy in effect. A poisoned lock denies
//! every request.

pub mod pattern;
pub mod set;

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{error, info, warn};

pub use pattern::PathPattern;
pub use set::{PolicyDocument, PolicySet, RuleSpec};

use crate::auth::Role;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse policy: {0}")]
    Parse(String),

    #[error("unknown role in policy: {0}")]
    UnknownRole(String),

    #[error("invalid resource pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid method {method:?} for resource {resource:?}")]
    InvalidMethod { resource: String, method: String },

    #[error("role inheritance cycle through {0}")]
    InheritanceCycle(String),

    #[error("policy has no file source to reload from")]
    NoSource,

    #[error("policy lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub struct PolicyGate {
    current: RwLock<Arc<PolicySet>>,
    source: Option<PathBuf>,
}

impl PolicyGate {
    /// Gate over a fixed set with no file to reload from.
    pub fn new(set: PolicySet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
            source: None,
        }
    }

    /// Load the policy file at `path`; later reloads read the same file.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, PolicyError> {
        let path = path.into();
        let set = load_file(&path)?;
        info!(path = %path.display(), rules = set.rule_count(), "Policy loaded");
        Ok(Self {
            current: RwLock::new(Arc::new(set)),
            source: Some(path),
        })
    }

    pub fn authorize(&self, role: Role, path: &str, method: &str) -> Decision {
        let Some(set) = self.snapshot() else {
            return Decision::Deny;
        };
        if set.allows(role, path, method) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Re-read the policy file and swap it in.
    ///
    /// Returns the new rule count. On any error the previous policy stays.
    pub fn reload(&self) -> Result<usize, PolicyError> {
        let path = self.source.as_deref().ok_or(PolicyError::NoSource)?;
        let result = load_file(path).and_then(|set| {
            let count = set.rule_count();
            self.replace(set)?;
            Ok(count)
        });
        match &result {
            Ok(count) => info!(path = %path.display(), rules = count, "Policy reloaded"),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Policy reload failed, keeping previous policy"
            ),
        }
        result
    }

    pub fn replace(&self, set: PolicySet) -> Result<(), PolicyError> {
        let mut current = self.current.write().map_err(|_| PolicyError::Poisoned)?;
        *current = Arc::new(set);
        Ok(())
    }

    /// The live set, or `None` if the lock is poisoned.
    pub fn snapshot(&self) -> Option<Arc<PolicySet>> {
        match self.current.read() {
            Ok(set) => Some(Arc::clone(&set)),
            Err(_) => {
                error!("Policy lock poisoned, denying");
                None
            }
        }
    }

    pub fn rule_count(&self) -> usize {
        self.snapshot().map_or(0, |set| set.rule_count())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn load_file(path: &Path) -> Result<PolicySet, PolicyError> {
    let json = std::fs::read_to_string(path).map_err(|e| PolicyError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    PolicySet::from_json(&json)
}
