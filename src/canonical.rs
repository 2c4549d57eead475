//! Canonical serialization for artifact fingerprints.
//!
//! Graph artifacts and policies are fingerprinted by hashing their canonical
//! JSON encoding with xxh64. Callers must feed values whose serialization
//! order is fixed: sorted vectors and BTreeMaps, never HashMaps.

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Seed for every canonical hash; changing it invalidates stored fingerprints.
const CANONICAL_SEED: u64 = 0;

/// Serialize a value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// xxh64 of a value's canonical bytes.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<u64, serde_json::Error> {
    Ok(xxh64(&to_canonical_bytes(value)?, CANONICAL_SEED))
}

/// Canonical hash as a zero-padded 16 digit hex string.
pub fn canonical_hash_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}
