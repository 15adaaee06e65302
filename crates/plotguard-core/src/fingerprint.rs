//! Content fingerprints for plans and generator output.
use serde::Serialize;

/// `blake3:<hex>` digest of raw bytes
pub fn hash_bytes(data: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(data))
}

/// Digest of a value's canonical JSON encoding.
///
/// Values that fail to serialize hash as the empty document.
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hash_bytes(&bytes)
}
