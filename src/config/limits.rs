//! Mode, list and queue limits.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Mode items honoured per MODE request, and parameters per broadcast
    /// line (default: 12).
    #[serde(default = "default_max_modes")]
    pub max_modes: usize,
    /// Default cap on entries per list mode per channel (default: 100).
    #[serde(default = "default_max_list_entries")]
    pub max_list_entries: usize,
    /// Per-letter overrides of `max_list_entries`.
    #[serde(default)]
    pub list_caps: BTreeMap<char, usize>,
    /// Outbound queue capacity per connection, in messages (default: 1024).
    #[serde(default = "default_sendq")]
    pub sendq: usize,
    /// Maximum inbound line length in bytes (default: 512).
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
}

impl LimitsConfig {
    /// Entry cap for list mode `letter`.
    pub fn list_cap(&self, letter: char) -> usize {
        self.list_caps
            .get(&letter)
            .copied()
            .unwrap_or(self.max_list_entries)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_modes: default_max_modes(),
            max_list_entries: default_max_list_entries(),
            list_caps: BTreeMap::new(),
            sendq: default_sendq(),
            max_line_len: default_max_line_len(),
        }
    }
}

fn default_max_modes() -> usize {
    12
}

fn default_max_list_entries() -> usize {
    100
}

fn default_sendq() -> usize {
    1024
}

fn default_max_line_len() -> usize {
    slirc_proto::MAX_LINE_LEN
}
