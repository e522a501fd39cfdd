// SPDX-License-Identifier: Apache-2.0
//! Pure decode functions from a raw CT log `get-entries` row to a normalized
//! `CertRecord`: Merkle Tree Leaf envelope parsing, X.509 field extraction,
//! and the domain-set builder. Nothing in this crate performs I/O.

pub mod merkle;
pub mod record;
pub mod x509;

pub use merkle::CodecError;
pub use record::{decode, CertRecord, RawEntry};
pub use x509::X509Error;
