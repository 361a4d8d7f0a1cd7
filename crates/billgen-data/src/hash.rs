//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

use crate::model::BillingDataset;

impl BillingDataset {
    /// SHA-256 over the canonical JSON form of the dataset
    ///
    /// Field order follows the struct definitions and `extra` is a
    /// `BTreeMap`, so equal datasets always hash equally and any changed
    /// field changes the hash.
    pub fn content_hash(&self) -> String {
        // Serializing plain structs, strings, finite floats and string maps cannot fail.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        sha256_tagged(&canonical)
    }
}

/// `sha256:<hex>` digest of arbitrary bytes
pub fn sha256_tagged(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!(
        "sha256:{}",
        result.iter().map(|b| format!("{:02x}", b)).collect::<String>()
    )
}
