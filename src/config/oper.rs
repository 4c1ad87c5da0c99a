//! Operator block configuration.

use serde::Deserialize;
use subtle::ConstantTimeEq;

/// Operator block configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OperBlock {
    /// Operator name (used in OPER command).
    pub name: String,
    /// Plaintext password.
    pub password: String,
}

impl OperBlock {
    /// Compare in constant time.
    pub fn verify_password(&self, password: &str) -> bool {
        self.password.as_bytes().ct_eq(password.as_bytes()).into()
    }
}
