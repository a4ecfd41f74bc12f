//! Content fingerprinting for the seen-record set
//!
//! The fingerprint must be stable across runs and process restarts: the
//! seen set persists between invocations, so the same field content has to
//! hash to the same value no matter how the fields were ordered when the
//! record was assembled. Pairs are sorted by name before hashing.

use super::types::ActivityRecord;
use sha2::{Digest, Sha256};

/// Digest a set of name/value pairs, order-independently.
pub fn fingerprint(fields: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = fields.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for (name, value) in sorted {
        hasher.update(name.as_bytes());
        hasher.update([0x1f]);
        hasher.update(value.as_bytes());
        hasher.update([0x1e]);
    }

    hex::encode(hasher.finalize())
}

impl ActivityRecord {
    /// Fingerprint over the record's full field set.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.fields())
    }
}
