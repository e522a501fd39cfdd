// SPDX-License-Identifier: Apache-2.0
//! The normalized artifact the codec produces, and the raw wire entry it
//! consumes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::merkle::{self, LogEntryType, MerkleTreeLeaf};
use crate::x509;

/// A single `get-entries` row, annotated with where it came from. Still
/// base64-encoded, exactly as the log sent it: base64-decoding is step 1 of
/// `decode()`; a log sending malformed base64 is a per-entry decode
/// failure, not a fetch-level one. Ephemeral: discarded once the codec has
/// turned it into a `CertRecord` (or dropped it).
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub leaf_input: String,
    pub extra_data: String,
    pub log_url: String,
    pub index: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CertRecord {
    pub subject_cn: String,
    pub issuer_cn: Option<String>,
    pub serial_number: String,
    pub fingerprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// CN first, then each SAN `DNS:` entry, de-duplicated, order preserved.
    pub all_domains: Vec<String>,
    /// Comma-joined rendering of `all_domains`, for full-text search.
    pub domains: String,
    /// Decoded subject fields and extensions, kept for downstream analytics.
    pub raw_data: serde_json::Value,
}

/// Decode a single raw entry into a `CertRecord`, or `None` if the entry is
/// malformed or has no usable subject CN. Never panics, never propagates an
/// error: CT logs routinely contain malformed or experimental entries, and a
/// codec that aborts on them would stall ingestion of an otherwise-healthy
/// log.
#[must_use]
pub fn decode(raw: &RawEntry) -> Option<CertRecord> {
    let leaf_input = match base64::decode(&raw.leaf_input) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!(
                "{}: leaf_input is not valid base64 at index {}: {:?}",
                raw.log_url,
                raw.index,
                err
            );
            return None;
        }
    };

    let leaf = match MerkleTreeLeaf::parse(&leaf_input) {
        Ok(leaf) => leaf,
        Err(err) => {
            log::debug!(
                "{}: malformed Merkle tree leaf at index {}: {:?}",
                raw.log_url,
                raw.index,
                err
            );
            return None;
        }
    };

    let extra_data = if raw.extra_data.is_empty() {
        Vec::new()
    } else {
        match base64::decode(&raw.extra_data) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::debug!(
                    "{}: extra_data is not valid base64 at index {}: {:?}",
                    raw.log_url,
                    raw.index,
                    err
                );
                Vec::new()
            }
        }
    };

    let der = match leaf.entry_type {
        LogEntryType::X509 => merkle::x509_leaf_der(leaf.entry),
        LogEntryType::Precert => {
            let extra = if extra_data.is_empty() {
                None
            } else {
                Some(extra_data.as_slice())
            };
            merkle::precert_leaf_der(leaf.entry, extra)
        }
    };

    let cert = match x509::parse(&der) {
        Ok(cert) => cert,
        Err(err) => {
            log::debug!(
                "{}: malformed leaf certificate at index {}: {:?}",
                raw.log_url,
                raw.index,
                err
            );
            return None;
        }
    };

    let subject_cn = cert.subject.cn.clone().unwrap_or_default();
    if subject_cn.is_empty() {
        log::debug!(
            "{}: dropping entry {} with empty subject CN",
            raw.log_url,
            raw.index
        );
        return None;
    }

    let mut all_domains = Vec::with_capacity(1 + cert.san_dns_names.len());
    all_domains.push(subject_cn.clone());
    for dns in &cert.san_dns_names {
        if !all_domains.contains(dns) {
            all_domains.push(dns.clone());
        }
    }

    let raw_data = serde_json::json!({
        "subject": cert.subject,
        "extensions": cert.extensions,
    });

    Some(CertRecord {
        subject_cn,
        issuer_cn: cert.issuer_cn,
        serial_number: cert.serial_number,
        fingerprint: ctscan_hash::fingerprint(&der),
        not_before: cert.not_before,
        not_after: cert.not_after,
        domains: all_domains.join(","),
        all_domains,
        raw_data,
    })
}
