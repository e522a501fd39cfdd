// SPDX-License-Identifier: Apache-2.0
//! Decodes a leaf certificate's DER bytes into the subject fields, serial,
//! validity window, and extension set spec.md §4.1 asks for.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use oid_registry::{
    OID_X509_COMMON_NAME, OID_X509_COUNTRY_NAME, OID_X509_LOCALITY_NAME,
    OID_X509_ORGANIZATION_NAME, OID_X509_ORGANIZATIONAL_UNIT, OID_X509_STATE_OR_PROVINCE_NAME,
};
use x509_parser::prelude::*;

/// The decoded subject (and issuer) fields this engine cares about.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Subject {
    pub cn: Option<String>,
    pub c: Option<String>,
    pub st: Option<String>,
    pub l: Option<String>,
    pub o: Option<String>,
    pub ou: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ParsedCert {
    pub subject: Subject,
    pub issuer_cn: Option<String>,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub san_dns_names: Vec<String>,
    /// Every extension whose OID resolves to a known short name, skipping
    /// any that resolve to `UNDEF`.
    pub extensions: BTreeMap<String, String>,
}

#[derive(Debug)]
pub enum X509Error {
    Malformed,
    ParseFailed,
}

fn first_attr(name: &X509Name, oid: &oid_registry::Oid) -> Option<String> {
    name.iter_rdn()
        .flat_map(|rdn| rdn.iter())
        .find(|atv| atv.attr_type() == oid)
        .and_then(|atv| atv.as_str().ok())
        .map(str::to_owned)
}

fn subject_of(name: &X509Name) -> Subject {
    Subject {
        cn: first_attr(name, &OID_X509_COMMON_NAME),
        c: first_attr(name, &OID_X509_COUNTRY_NAME),
        st: first_attr(name, &OID_X509_STATE_OR_PROVINCE_NAME),
        l: first_attr(name, &OID_X509_LOCALITY_NAME),
        o: first_attr(name, &OID_X509_ORGANIZATION_NAME),
        ou: first_attr(name, &OID_X509_ORGANIZATIONAL_UNIT),
    }
}

/// Lowercase, unpadded hex rendering of a certificate's serial number: the
/// leading `0x00` padding byte DER sometimes adds to keep an INTEGER
/// non-negative is stripped, along with any further leading zero nibbles.
fn serial_to_hex(raw: &[u8]) -> String {
    let full = hex::encode(raw);
    let trimmed = full.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn short_name(registry: &oid_registry::OidRegistry, oid: &oid_registry::Oid) -> String {
    registry
        .get(oid)
        .map(|entry| entry.sn().to_string())
        .unwrap_or_else(|| "UNDEF".to_string())
}

/// Renders a `GeneralName` the way OpenSSL's extension printer does:
/// `DNS:example.com`, `email:a@example.com`, `URI:https://example.com`.
/// Anything rarer (directory names, other-names, IP addresses, …) falls back
/// to its debug form rather than inventing a format certlib.py never needed.
fn render_general_name(name: &GeneralName) -> String {
    match name {
        GeneralName::DNSName(s) => format!("DNS:{s}"),
        GeneralName::RFC822Name(s) => format!("email:{s}"),
        GeneralName::URI(s) => format!("URI:{s}"),
        other => format!("{other:?}"),
    }
}

/// Renders a parsed extension's value as a human-readable string, mirroring
/// `certlib.py::dump_extensions`'s use of OpenSSL's `X509Extension.__str__()`
/// rather than the raw DER bytes underneath it. Extension types this crate
/// doesn't have a dedicated renderer for fall back to their debug form,
/// which is still a usable string for downstream analytics, unlike hex of
/// the TLV.
fn render_extension(parsed: &ParsedExtension) -> String {
    match parsed {
        ParsedExtension::SubjectAlternativeName(san) => san
            .general_names
            .iter()
            .map(render_general_name)
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::BasicConstraints(bc) => {
            let mut rendered = format!("CA:{}", if bc.ca { "TRUE" } else { "FALSE" });
            if let Some(path_len) = bc.path_len_constraint {
                rendered.push_str(&format!(", pathlen:{path_len}"));
            }
            rendered
        }
        other => format!("{other:?}"),
    }
}

/// Parse a leaf certificate's DER bytes. Every failure mode is folded into
/// `X509Error`; the caller (the entry codec's `decode`) treats any error as
/// "skip this entry", never as a reason to abort ingestion.
pub fn parse(der: &[u8]) -> Result<ParsedCert, X509Error> {
    let (_, cert) = parse_x509_certificate(der).map_err(|_| X509Error::ParseFailed)?;
    let tbs = &cert.tbs_certificate;

    let subject = subject_of(&tbs.subject);
    let issuer_cn = first_attr(&tbs.issuer, &OID_X509_COMMON_NAME);

    let not_before = DateTime::<Utc>::from_timestamp(tbs.validity.not_before.timestamp(), 0)
        .ok_or(X509Error::Malformed)?;
    let not_after = DateTime::<Utc>::from_timestamp(tbs.validity.not_after.timestamp(), 0)
        .ok_or(X509Error::Malformed)?;

    // `with_all_crypto()` alone only loads the signature/public-key OID
    // databases; the certificate-extension OIDs (subjectAltName, keyUsage,
    // basicConstraints, …) live in the X.509 database `with_x509()` adds.
    // Without it every extension's OID misses the registry and resolves to
    // `UNDEF`, which `short_name`'s caller then filters out entirely.
    let registry = oid_registry::OidRegistry::default()
        .with_x509()
        .with_all_crypto();
    let mut san_dns_names = Vec::new();
    let mut extensions = BTreeMap::new();
    for ext in tbs.extensions() {
        let parsed = ext.parsed_extension();
        if let ParsedExtension::SubjectAlternativeName(san) = parsed {
            for name in &san.general_names {
                if let GeneralName::DNSName(dns) = name {
                    san_dns_names.push((*dns).to_string());
                }
            }
        }
        let name = short_name(&registry, &ext.oid);
        if name == "UNDEF" {
            continue;
        }
        extensions.insert(name, render_extension(parsed));
    }

    Ok(ParsedCert {
        subject,
        issuer_cn,
        serial_number: serial_to_hex(tbs.raw_serial()),
        not_before,
        not_after,
        san_dns_names,
        extensions,
    })
}
