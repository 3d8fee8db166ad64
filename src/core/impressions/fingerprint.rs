// src/core/impressions/fingerprint.rs

//! The impression fingerprint (§3): a 64-bit hash over
//! `(key, feature, treatment, label, changeNumber)`. `time` and
//! `previousTime` are explicitly excluded: this identifies "the same
//! evaluation outcome", not "the same event".

use crate::core::model::Impression;
use std::io::Cursor;

pub type Fingerprint = u64;

/// Hashes the fingerprint-relevant fields of an impression with MurmurHash3
/// x64-128, truncated to 64 bits (the same hash family `spineldb` reaches
/// for when it needs a fast, non-cryptographic digest; `murmur3` is a
/// dependency of the teacher crate).
pub fn fingerprint(imp: &Impression) -> Fingerprint {
    let joined = format!(
        "{}\u{1}{}\u{1}{}\u{1}{}\u{1}{}",
        imp.key, imp.feature, imp.treatment, imp.label, imp.change_number
    );
    let mut cursor = Cursor::new(joined.as_bytes());
    let hash = murmur3::murmur3_x64_128(&mut cursor, 0).expect("hashing an in-memory buffer cannot fail");
    hash as u64
}
