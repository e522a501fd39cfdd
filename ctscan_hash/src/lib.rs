// SPDX-License-Identifier: Apache-2.0
use sha1::{Digest, Sha1};

/// SHA-1 fingerprint of a leaf certificate's DER encoding, as lowercase hex
/// with no separators. This is the fingerprint CT tooling conventionally
/// uses to dedupe and cross-reference leaf certificates.
#[must_use]
pub fn fingerprint(der: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(der);
    hex::encode(hasher.finalize())
}
