// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content integrity: SHA-256 fingerprints of stored blobs.

use folio_core::error::StoreError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Recorded in the index at commit time and compared again by `verify`.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check that `data` still matches the digest recorded at commit time.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), StoreError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(StoreError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex_of_fixed_length() {
        let digest = hash_bytes(b"%PDF-1.5");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn single_byte_change_is_detected() {
        let original = b"image bytes".to_vec();
        let recorded = hash_bytes(&original);

        let mut flipped = original.clone();
        flipped[0] ^= 0x01;
        assert!(verify_hash(&original, &recorded).is_ok());
        assert!(verify_hash(&flipped, &recorded).is_err());
    }

    #[test]
    fn uppercase_recorded_digest_still_matches() {
        let recorded = hash_bytes(b"folio").to_uppercase();
        assert!(verify_hash(b"folio", &recorded).is_ok());
    }

    #[test]
    fn mismatch_carries_both_digests() {
        let Err(StoreError::IntegrityMismatch { expected, actual }) = verify_hash(b"a", "0000")
        else {
            panic!("expected an integrity mismatch");
        };
        assert_eq!(expected, "0000");
        assert_eq!(actual, hash_bytes(b"a"));
    }
}
