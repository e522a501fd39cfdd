// SPDX-License-Identifier: Apache-2.0
//! The wire shape of a `get-entries` response (RFC 6962 §4.6). `leaf_input`
//! and `extra_data` are handed through as the base64 text the log sent;
//! base64-decoding them is step 1 of `ctscan_codec::decode`, not this
//! crate's job, so that a log sending malformed base64 is a codec-level
//! per-entry failure (spec.md §4.1) rather than a fetch-level one.

use serde::Deserialize;


#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawItem {
    leaf_input: String,
    #[serde(default)]
    extra_data: String,
}

#[derive(Debug, Deserialize)]
struct GetEntriesResponse {
    entries: Vec<RawItem>,
}

/// One `get-entries` row, still base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEntriesItem {
    pub leaf_input: String,
    pub extra_data: String,
}

impl GetEntriesItem {
    pub fn parse(body: &[u8]) -> Result<Vec<Self>, serde_json::Error> {
        let resp: GetEntriesResponse = serde_json::from_slice(body)?;
        Ok(resp
            .entries
            .into_iter()
            .map(|item| Self {
                leaf_input: item.leaf_input,
                extra_data: item.extra_data,
            })
            .collect())
    }
}
