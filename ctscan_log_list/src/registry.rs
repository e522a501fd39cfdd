// SPDX-License-Identifier: Apache-2.0
//! Discovers the set of CT logs to follow (spec.md §4.2).
//!
//! On `bootstrap()`, fetches Google's canonical "all logs" catalog, filters
//! to `usable` logs, strips a denylist of known-dead operators, and yields
//! the set of `LogSource`s the supervisor spawns one follower per. A fetch
//! failure at any stage falls back to a hardcoded snapshot of well-known
//! active logs rather than leaving the engine with nothing to follow.

use crate::{fetcher::Fetcher, LogList};
use log::warn;

pub const CATALOG_URL: &str = "https://www.gstatic.com/ct/log_list/v3/all_logs_list.json";

/// Substrings of retired or compromised log operators' URLs. A catalog entry
/// whose URL contains any of these is excluded even if the catalog still
/// lists it as `usable` (stale or erroneous catalog data).
pub const BAD_CT_SERVERS: &[&str] = &[
    "log.certly.io",
    "ct.izenpe.com",
    "ct.ws.symantec.com",
    "vega.ws.symantec.com",
    "deneb.ws.symantec.com",
    "sirius.ws.symantec.com",
    "plausible.ct.nordu.net",
    "ct.startssl.com",
    "ctlog.wosign.com",
    "ct.wosign.com",
    "ctlog.gdca.com.cn",
    "ctlog2.gdca.com.cn",
    "ct.akamai.com",
    "alpha.ctlogs.org",
];

/// A CT log worth following: just enough to address it and to attribute
/// entries back to an operator. Immutable for the lifetime of a run; built
/// once at startup and handed to the supervisor, which spawns one follower
/// per source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    pub description: String,
    /// Full base URL (scheme + host + path), no trailing slash, e.g.
    /// `https://ct.googleapis.com/logs/argon2023`.
    pub url: String,
    pub operator: String,
}

impl LogSource {
    #[must_use]
    pub fn get_sth_url(&self) -> String {
        format!("{}/ct/v1/get-sth", self.url)
    }

    #[must_use]
    pub fn get_entries_url(&self, start: u64, end: u64) -> String {
        format!("{}/ct/v1/get-entries?start={}&end={}", self.url, start, end)
    }
}

/// Normalizes a catalog URL (which arrives as `https://host/path/`) into the
/// trailing-slash-free form `LogSource::url` expects. Keeps whatever scheme
/// the catalog supplied rather than assuming `https`, so a `LogSource` built
/// from a local test server's plain-HTTP address still round-trips through
/// `get_sth_url`/`get_entries_url`.
fn normalize_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

fn is_denylisted(url: &str, extra_denylist: &[String]) -> bool {
    BAD_CT_SERVERS
        .iter()
        .any(|bad| url.contains(bad))
        || extra_denylist.iter().any(|bad| url.contains(bad.as_str()))
}

/// Filters a fetched catalog down to the `LogSource`s this engine should
/// follow: `usable` state only, denylist applied. `extra_denylist` is the
/// operator-supplied override from configuration (spec.md §6), appended to
/// the built-in `BAD_CT_SERVERS`.
#[must_use]
pub fn usable_logs(catalog: &LogList, extra_denylist: &[String]) -> Vec<LogSource> {
    let mut sources = Vec::new();
    for operator in &catalog.operators {
        for log in &operator.logs {
            if !log.is_usable() {
                continue;
            }
            let url = normalize_url(&log.url);
            if is_denylisted(&url, extra_denylist) {
                continue;
            }
            sources.push(LogSource {
                description: log.description.clone(),
                url,
                operator: operator.name.clone(),
            });
        }
    }
    sources
}

/// A fixed snapshot of well-known, historically active logs, used only when
/// the live catalog fetch fails. Not refreshed at runtime: if these logs
/// retire, `bootstrap()` will pick up their replacements on the next
/// successful catalog fetch.
#[must_use]
pub fn fallback_logs() -> Vec<LogSource> {
    let entries: &[(&str, &str, &str)] = &[
        (
            "Google 'Argon2024' log",
            "ct.googleapis.com/logs/us1/argon2024",
            "Google",
        ),
        (
            "Google 'Xenon2024' log",
            "ct.googleapis.com/logs/eu1/xenon2024",
            "Google",
        ),
        (
            "Cloudflare 'Nimbus2024' Log",
            "ct.cloudflare.com/logs/nimbus2024",
            "Cloudflare",
        ),
        (
            "Let's Encrypt 'Oak2024H2' log",
            "oak.ct.letsencrypt.org/2024h2",
            "Let's Encrypt",
        ),
        (
            "DigiCert Yeti2024 Log",
            "yeti2024.ct.digicert.com/log",
            "DigiCert",
        ),
        (
            "DigiCert Nessie2024 Log",
            "nessie2024.ct.digicert.com/log",
            "DigiCert",
        ),
        (
            "Sectigo 'Sabre2024h2'",
            "sabre2024h2.ct.sectigo.com",
            "Sectigo",
        ),
        (
            "Sectigo 'Mammoth2024h2'",
            "mammoth2024h2.ct.sectigo.com",
            "Sectigo",
        ),
        (
            "TrustAsia Log2024",
            "ct2024.trustasia.com/log2024",
            "TrustAsia",
        ),
        (
            "SSLMate 'Sceptic2024h2'",
            "sceptic2024h2.ct.sectigo.com",
            "SSLMate",
        ),
    ];
    entries
        .iter()
        .map(|(description, url, operator)| LogSource {
            description: (*description).to_string(),
            url: format!("https://{url}"),
            operator: (*operator).to_string(),
        })
        .collect()
}

/// Fetches the catalog and filters it to usable, non-denylisted logs. Falls
/// back to `fallback_logs()` on any fetch or parse error.
pub async fn bootstrap(fetcher: &Fetcher, extra_denylist: &[String]) -> Vec<LogSource> {
    match fetcher.fetch_catalog().await {
        Ok(catalog) => {
            let sources = usable_logs(&catalog, extra_denylist);
            if sources.is_empty() {
                warn!("CT log catalog fetch returned zero usable logs, using fallback list");
                fallback_logs()
            } else {
                sources
            }
        }
        Err(err) => {
            warn!(
                "Failed to fetch CT log catalog ({:?}), using fallback list",
                err
            );
            fallback_logs()
        }
    }
}
