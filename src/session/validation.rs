// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input checks for registration and login.
//!
//! Password rules are deliberately minimal: at least eight characters with
//! at least one letter and one digit.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::error::SessionError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_DISPLAY_NAME_LEN: usize = 64;
pub const MAX_CONTACT_LEN: usize = 254;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn is_email(contact: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(contact))
}

/// Canonical form of a contact address: trimmed, NFKC, lower-case.
pub fn normalize_contact(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}

/// Normalise and validate a contact address.
pub fn validate_contact(raw: &str) -> Result<String, SessionError> {
    let contact = normalize_contact(raw);
    if contact.is_empty() {
        return Err(SessionError::InvalidInput("contact is required".to_string()));
    }
    if contact.len() > MAX_CONTACT_LEN || !is_email(&contact) {
        return Err(SessionError::InvalidInput(
            "contact must be a valid e-mail address".to_string(),
        ));
    }
    Ok(contact)
}

pub fn validate_password(password: &str) -> Result<(), SessionError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(SessionError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(SessionError::InvalidInput(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(SessionError::InvalidInput(
            "password must contain letters and numbers".to_string(),
        ));
    }
    Ok(())
}

/// Trim and validate a display name.
pub fn validate_display_name(raw: &str) -> Result<String, SessionError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SessionError::InvalidInput("display name is required".to_string()));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(SessionError::InvalidInput(format!(
            "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(SessionError::InvalidInput(
            "display name contains control characters".to_string(),
        ));
    }
    Ok(name.to_string())
}
