// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Policy Reloader
//!
//! Background task that reloads the policy file whenever the process
//! receives `SIGHUP`, so operators can change authorisation rules without a
//! restart. A failed reload is logged and the previous policy stays live.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` and exits when the server's
//! shutdown token is cancelled.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::policy::PolicyGate;

pub struct PolicyReloader {
    gate: Arc<PolicyGate>,
}

impl PolicyReloader {
    pub fn new(gate: Arc<PolicyGate>) -> Self {
        Self { gate }
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(PolicyReloader::new(gate).run(shutdown.clone()));
    /// ```
    #[cfg(unix)]
    pub async fn run(self, shutdown: CancellationToken) {
        use tokio::signal::unix::{signal, SignalKind};

        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGHUP, policy reload by signal disabled");
                shutdown.cancelled().await;
                return;
            }
        };
        info!("Policy reloader listening for SIGHUP");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Policy reloader shutting down");
                    return;
                }
                received = hangup.recv() => {
                    if received.is_none() {
                        return;
                    }
                    info!("SIGHUP received, reloading policy");
                    self.reload_step();
                }
            }
        }
    }

    #[cfg(not(unix))]
    pub async fn run(self, shutdown: CancellationToken) {
        shutdown.cancelled().await;
        info!("Policy reloader shutting down");
    }

    // PolicyGate::reload logs the outcome itself.
    fn reload_step(&self) {
        let _ = self.gate.reload();
    }
}
