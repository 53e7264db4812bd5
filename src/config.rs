// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup and passed down
//! explicitly. Missing required values and unparsable values abort startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_SIGNING_SECRET` | HS256 signing secret, at least 32 bytes | Required |
//! | `TOKEN_ISSUER` | `iss` claim of issued tokens | `identity-session` |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime | `900` |
//! | `PRIVILEGED_ACCESS_TOKEN_TTL_SECS` | Access token lifetime for `admin`/`sudo` | `300` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `604800` |
//! | `REGISTRATION_TTL_SECS` | Pending registration lifetime | `180` |
//! | `PENDING_REGISTRATION_CAPACITY` | Max live pending registrations | `10000` |
//! | `UPSTREAM_TIMEOUT_MS` | Deadline for each store call | `5000` |
//! | `IDENTITY_STORE_URL` | Remote identity store base URL | In-memory store |
//! | `NOTIFY_WEBHOOK_URL` | Notification relay endpoint | Log only |
//! | `POLICY_PATH` | JSON policy file | `config/policy.json` |
//! | `TRUST_FORWARDED_FOR` | Take client origin from `X-Forwarded-For` | `false` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Plain HTTP |
//! | `SEED_ADMIN_CONTACT` / `SEED_ADMIN_PASSWORD` | Seed a `sudo` account (in-memory store only) | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::codec::CredentialCodec;
use crate::session::IssuerSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Shared HS256 secret for session tokens.
///
/// Every instance behind the same load balancer must use the same value,
/// otherwise tokens minted by one instance fail verification on another.
pub const TOKEN_SIGNING_SECRET_ENV: &str = "TOKEN_SIGNING_SECRET";
pub const TOKEN_ISSUER_ENV: &str = "TOKEN_ISSUER";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const PRIVILEGED_ACCESS_TOKEN_TTL_ENV: &str = "PRIVILEGED_ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const REGISTRATION_TTL_ENV: &str = "REGISTRATION_TTL_SECS";
pub const PENDING_CAPACITY_ENV: &str = "PENDING_REGISTRATION_CAPACITY";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_MS";

/// Base URL of the identity service. When unset the service runs against an
/// in-memory store and loses every account on restart.
pub const IDENTITY_STORE_URL_ENV: &str = "IDENTITY_STORE_URL";
pub const NOTIFY_WEBHOOK_URL_ENV: &str = "NOTIFY_WEBHOOK_URL";
pub const POLICY_PATH_ENV: &str = "POLICY_PATH";

/// Only enable behind a proxy that overwrites `X-Forwarded-For`; otherwise
/// clients choose their own origin.
pub const TRUST_FORWARDED_FOR_ENV: &str = "TRUST_FORWARDED_FOR";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const SEED_ADMIN_CONTACT_ENV: &str = "SEED_ADMIN_CONTACT";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_POLICY_PATH: &str = "config/policy.json";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub contact: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub signing_secret: Vec<u8>,
    pub token_issuer: String,
    pub access_ttl: Duration,
    pub privileged_access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub registration_ttl: Duration,
    pub pending_capacity: usize,
    pub upstream_timeout: Duration,
    pub identity_store_url: Option<Url>,
    pub notify_webhook_url: Option<Url>,
    pub policy_path: PathBuf,
    pub trust_forwarded_for: bool,
    pub tls: Option<TlsPaths>,
    pub seed_admin: Option<SeedAdmin>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_addr", &self.bind_addr)
            .field("token_issuer", &self.token_issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("identity_store_url", &self.identity_store_url)
            .field("policy_path", &self.policy_path)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("tls", &self.tls.is_some())
            .finish_non_exhaustive()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&get, PORT_ENV, 8080)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: HOST_ENV,
                reason: e.to_string(),
            })?;

        let signing_secret = get(TOKEN_SIGNING_SECRET_ENV)
            .ok_or(ConfigError::Missing(TOKEN_SIGNING_SECRET_ENV))?
            .into_bytes();
        if signing_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: TOKEN_SIGNING_SECRET_ENV,
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let seed_admin = match (get(SEED_ADMIN_CONTACT_ENV), lookup(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(contact), Some(password)) => Some(SeedAdmin { contact, password }),
            (None, _) => None,
            (Some(_), None) => return Err(ConfigError::Missing(SEED_ADMIN_PASSWORD_ENV)),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    reason: format!("expected 'json' or 'pretty', got {other:?}"),
                })
            }
        };

        Ok(Self {
            bind_addr,
            signing_secret,
            token_issuer: get(TOKEN_ISSUER_ENV).unwrap_or_else(|| "identity-session".to_string()),
            access_ttl: secs(&get, ACCESS_TOKEN_TTL_ENV, 900)?,
            privileged_access_ttl: secs(&get, PRIVILEGED_ACCESS_TOKEN_TTL_ENV, 300)?,
            refresh_ttl: secs(&get, REFRESH_TOKEN_TTL_ENV, 7 * 24 * 60 * 60)?,
            registration_ttl: secs(&get, REGISTRATION_TTL_ENV, 180)?,
            pending_capacity: parse_or(&get, PENDING_CAPACITY_ENV, 10_000)?,
            upstream_timeout: Duration::from_millis(parse_or(&get, UPSTREAM_TIMEOUT_ENV, 5_000)?),
            identity_store_url: url(&get, IDENTITY_STORE_URL_ENV)?,
            notify_webhook_url: url(&get, NOTIFY_WEBHOOK_URL_ENV)?,
            policy_path: get(POLICY_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_POLICY_PATH.to_string())
                .into(),
            trust_forwarded_for: parse_or(&get, TRUST_FORWARDED_FOR_ENV, false)?,
            tls,
            seed_admin,
            log_format,
        })
    }

    pub fn codec(&self) -> CredentialCodec {
        CredentialCodec::new(&self.signing_secret, self.token_issuer.clone())
            .with_access_ttl(self.access_ttl)
            .with_refresh_ttl(self.refresh_ttl)
    }

    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            registration_ttl: self.registration_ttl,
            upstream_timeout: self.upstream_timeout,
            privileged_access_ttl: self.privileged_access_ttl,
        }
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

fn secs(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let value: u64 = parse_or(get, var, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(value))
}

fn url(get: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<Url>, ConfigError> {
    get(var)
        .map(|raw| {
            Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            })
        })
        .transpose()
}
