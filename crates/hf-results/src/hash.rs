//! Content-based hashing for cache keys.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ResultsResult;
use crate::types::CacheKey;

/// SHA-256 of the parameters' canonical JSON form.
///
/// Parameters pass through `serde_json::Value` first, whose objects are
/// sorted maps, so field and map order never change the digest.
pub fn params_digest<P: Serialize + ?Sized>(params: &P) -> ResultsResult<String> {
    let canonical = serde_json::to_value(params)?;
    let bytes = serde_json::to_vec(&canonical)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Digest of a whole key; names the key's file in a [`crate::FileStore`].
pub fn key_digest(key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.schematic_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(key.version.to_le_bytes());
    hasher.update(key.operation.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(key.params_digest.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operation;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct PathParams<'a> {
        start: &'a str,
        end: &'a str,
        flow_lpm: f64,
    }

    #[derive(Serialize)]
    struct Reordered<'a> {
        flow_lpm: f64,
        end: &'a str,
        start: &'a str,
    }

    #[test]
    fn hash_stability() {
        let p = PathParams {
            start: "P1",
            end: "H203",
            flow_lpm: 180.0,
        };
        assert_eq!(params_digest(&p).unwrap(), params_digest(&p).unwrap());
        assert_eq!(params_digest(&p).unwrap().len(), 64);
    }

    #[test]
    fn field_order_does_not_matter() {
        let a = PathParams {
            start: "P1",
            end: "H203",
            flow_lpm: 180.0,
        };
        let b = Reordered {
            flow_lpm: 180.0,
            end: "H203",
            start: "P1",
        };
        assert_eq!(params_digest(&a).unwrap(), params_digest(&b).unwrap());

        let hashed: HashMap<&str, u32> = [("b", 2), ("a", 1), ("c", 3)].into_iter().collect();
        let sorted: BTreeMap<&str, u32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(params_digest(&hashed).unwrap(), params_digest(&sorted).unwrap());
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = PathParams {
            start: "P1",
            end: "H203",
            flow_lpm: 180.0,
        };
        let b = PathParams {
            start: "P1",
            end: "H203",
            flow_lpm: 181.0,
        };
        assert_ne!(params_digest(&a).unwrap(), params_digest(&b).unwrap());
    }

    #[test]
    fn key_digest_separates_fields() {
        let a = CacheKey::new("ab", 1, Operation::AnalyzeSchematic, &()).unwrap();
        let mut b = a.clone();
        b.schematic_id = "a".into();
        assert_ne!(key_digest(&a), key_digest(&b));

        let mut c = a.clone();
        c.version = 2;
        assert_ne!(key_digest(&a), key_digest(&c));
    }
}
