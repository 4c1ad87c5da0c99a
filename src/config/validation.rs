//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use std::collections::HashSet;

use super::Config;
use crate::modules::bundled;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("server.network is required")]
    MissingNetworkName,
    #[error("server.sid must be exactly 3 characters, got {0}")]
    InvalidSid(usize),
    #[error("server.sid must match pattern [0-9][A-Z0-9][A-Z0-9], got '{0}'")]
    InvalidSidFormat(String),
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("limits.list_caps.{0} must be greater than zero")]
    ZeroListCap(char),
    #[error("limits.max_line_len must be at least 64, got {0}")]
    LineLengthTooSmall(usize),
    #[error("channels.default_modes contains '{0}', which is not a core simple mode")]
    InvalidDefaultMode(char),
    #[error("duplicate oper block name '{0}'")]
    DuplicateOper(String),
    #[error("unknown module '{0}' in modules.load")]
    UnknownModule(String),
}

/// Simple channel modes that may appear in `channels.default_modes`.
const DEFAULT_MODE_LETTERS: &str = "imnpst";

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }
    if config.server.network.is_empty() {
        errors.push(ValidationError::MissingNetworkName);
    }

    // SID validation (TS6 format)
    let sid = &config.server.sid;
    if sid.len() != 3 {
        errors.push(ValidationError::InvalidSid(sid.len()));
    } else {
        let bytes = sid.as_bytes();
        let valid = bytes[0].is_ascii_digit()
            && (bytes[1].is_ascii_uppercase() || bytes[1].is_ascii_digit())
            && (bytes[2].is_ascii_uppercase() || bytes[2].is_ascii_digit());
        if !valid {
            errors.push(ValidationError::InvalidSidFormat(sid.clone()));
        }
    }

    let limits = &config.limits;
    for (name, value) in [
        ("max_modes", limits.max_modes),
        ("max_list_entries", limits.max_list_entries),
        ("sendq", limits.sendq),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit(name));
        }
    }
    for (letter, cap) in &limits.list_caps {
        if *cap == 0 {
            errors.push(ValidationError::ZeroListCap(*letter));
        }
    }
    if limits.max_line_len < 64 {
        errors.push(ValidationError::LineLengthTooSmall(limits.max_line_len));
    }

    for c in config.channels.default_modes.chars().filter(|c| *c != '+') {
        if !DEFAULT_MODE_LETTERS.contains(c) {
            errors.push(ValidationError::InvalidDefaultMode(c));
        }
    }

    let mut seen = HashSet::new();
    for oper in &config.oper {
        if !seen.insert(oper.name.as_str()) {
            errors.push(ValidationError::DuplicateOper(oper.name.clone()));
        }
    }

    for name in &config.modules.load {
        if !bundled::NAMES.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownModule(name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
