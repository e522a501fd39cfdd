// SPDX-License-Identifier: Apache-2.0
//! HTTP client for the three outbound calls this engine makes (spec.md §6):
//! the Google catalog, and each log's `get-sth`/`get-entries` endpoints.

use super::{log_data::GetEntriesItem, registry::LogSource, LogList};
use log::warn;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);
const STH_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSth {
    pub tree_size: u64,
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

#[derive(Debug)]
#[allow(dead_code)] // Debug trait is ignored for dead code analysis, but some fields are only here for better messages
pub enum FetchError {
    Reqwest(reqwest::Error),
    BadStatus(StatusCode),
    DeserializeError {
        serde_error: serde_json::Error,
        input: bytes::Bytes,
    },
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "From",
            reqwest::header::HeaderValue::from_static("ctscan@example.invalid"),
        );
        Self {
            client: reqwest::Client::builder()
                .user_agent("ctscan/0.1")
                .default_headers(headers)
                .brotli(true)
                .gzip(true)
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap(),
        }
    }

    /// Fetches and parses Google's canonical CT log catalog (spec.md §4.2).
    pub async fn fetch_catalog(&self) -> Result<LogList, FetchError> {
        let res = self
            .client
            .get(crate::registry::CATALOG_URL)
            .timeout(CATALOG_TIMEOUT)
            .send()
            .await
            .map_err(FetchError::Reqwest)?;
        if res.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(res.status()));
        }
        let bytes = res.bytes().await.map_err(FetchError::Reqwest)?;
        serde_json::from_slice(&bytes).map_err(|serde_error| FetchError::DeserializeError {
            serde_error,
            input: bytes,
        })
    }

    pub async fn fetch_sth(&self, log: &LogSource) -> Result<LogSth, FetchError> {
        let res = self
            .client
            .get(log.get_sth_url())
            .timeout(STH_TIMEOUT)
            .send()
            .await
            .map_err(FetchError::Reqwest)?;
        if res.status() != StatusCode::OK {
            return Err(FetchError::BadStatus(res.status()));
        }
        let bytes = res.bytes().await.map_err(FetchError::Reqwest)?;
        serde_json::from_slice(&bytes).map_err(|serde_error| FetchError::DeserializeError {
            serde_error,
            input: bytes,
        })
    }

    pub async fn fetch_entries(
        &self,
        log: &LogSource,
        start: u64,
        end: u64,
    ) -> Result<Vec<GetEntriesItem>, FetchError> {
        let resp = self
            .client
            .get(log.get_entries_url(start, end))
            .send()
            .await
            .map_err(FetchError::Reqwest)?;
        if resp.status() != StatusCode::OK {
            warn!(
                "bad resp status {} while fetching {}-{} from \"{}\"",
                resp.status().as_str(),
                start,
                end,
                log.description,
            );
            return Err(FetchError::BadStatus(resp.status()));
        }
        let bytes = resp.bytes().await.map_err(FetchError::Reqwest)?;
        GetEntriesItem::parse(&bytes).map_err(|serde_error| FetchError::DeserializeError {
            serde_error,
            input: bytes,
        })
    }
}
