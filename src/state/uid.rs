//! TS6 user identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a user (TS6 UID string).
pub type Uid = String;

const UID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const UID_SUFFIX_LEN: usize = 6;

/// Hands out UIDs of the form `SID + 6 base36 chars`, e.g. `001AAAAAB`.
///
/// Shared between the gateway (which names a connection before the core
/// sees it) and the core, so it is lock-free.
#[derive(Debug)]
pub struct UidGenerator {
    sid: String,
    counter: AtomicU64,
}

impl UidGenerator {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn next_uid(&self) -> Uid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.sid, encode_suffix(n))
    }
}

fn encode_suffix(mut n: u64) -> String {
    let mut out = [b'A'; UID_SUFFIX_LEN];
    for slot in out.iter_mut().rev() {
        *slot = UID_ALPHABET[(n % 36) as usize];
        n /= 36;
    }
    out.iter().map(|b| *b as char).collect()
}
