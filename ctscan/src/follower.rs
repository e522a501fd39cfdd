// SPDX-License-Identifier: Apache-2.0
//! One long-lived task per `LogSource` (spec.md §4.3): polls `get-sth`,
//! fetches new entries in bounded chunks, and pushes them onto the shared
//! ingress queue. All per-log failure and backoff lives here; a follower
//! never touches another follower's state.

use ctscan_codec::RawEntry;
use ctscan_log_list::fetcher::{FetchError, Fetcher};
use ctscan_log_list::registry::LogSource;
use log::{info, trace, warn};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

const POLL_INTERVAL: Duration = Duration::from_secs(30);
/// After a transient network failure, wait this long before the next poll so
/// a single flaky operator can't dominate scheduling.
const NETWORK_FAILURE_COOLDOWN: Duration = Duration::from_secs(300);
/// After a failure partway through a delta, retry sooner: `latest_size` is
/// unchanged, so the next cycle re-requests the same range.
const CHUNK_FAILURE_COOLDOWN: Duration = Duration::from_secs(60);

pub struct Follower {
    source: LogSource,
    fetcher: Fetcher,
    max_block_size: u64,
    /// `None` until the first successful STH; pinned there rather than 0 so
    /// a cold start never tries to backfill the log's full history.
    latest_size: Option<u64>,
}

impl Follower {
    pub fn new(source: LogSource, fetcher: Fetcher, max_block_size: u64) -> Self {
        Self {
            source,
            fetcher,
            max_block_size,
            latest_size: None,
        }
    }

    /// Runs until `shutdown` fires. Exits cleanly; never panics on a remote
    /// log's bad behavior.
    pub async fn run(mut self, tx: mpsc::Sender<RawEntry>, mut shutdown: watch::Receiver<bool>) {
        info!("follower starting for {}", self.source.url);
        loop {
            if *shutdown.borrow() {
                break;
            }

            let cooldown = match self.poll_once(&tx).await {
                Ok(()) => None,
                Err(PollError::Network(err)) => {
                    warn!(
                        "{}: network error polling STH, cooling down {:?}: {:?}",
                        self.source.url, NETWORK_FAILURE_COOLDOWN, err
                    );
                    Some(NETWORK_FAILURE_COOLDOWN)
                }
                Err(PollError::Chunk(err)) => {
                    warn!(
                        "{}: chunk fetch failed mid-delta, cooling down {:?}: {:?}",
                        self.source.url, CHUNK_FAILURE_COOLDOWN, err
                    );
                    Some(CHUNK_FAILURE_COOLDOWN)
                }
                Err(PollError::QueueClosed) => {
                    info!("{}: ingress queue closed, stopping follower", self.source.url);
                    break;
                }
            };

            let sleep_for = cooldown.unwrap_or(POLL_INTERVAL);
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {},
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("follower stopped for {}", self.source.url);
    }

    async fn poll_once(&mut self, tx: &mpsc::Sender<RawEntry>) -> Result<(), PollError> {
        let sth = self
            .fetcher
            .fetch_sth(&self.source)
            .await
            .map_err(PollError::Network)?;

        let latest_size = match self.latest_size {
            None => {
                trace!(
                    "{}: cold start, pinning cursor at tree_size={}",
                    self.source.url,
                    sth.tree_size
                );
                self.latest_size = Some(sth.tree_size);
                return Ok(());
            }
            Some(size) => size,
        };

        if sth.tree_size <= latest_size {
            return Ok(());
        }

        let total = sth.tree_size - latest_size;
        let chunks = total.div_ceil(self.max_block_size);
        trace!(
            "{}: delta {} entries over {} chunk(s) ({} -> {})",
            self.source.url,
            total,
            chunks,
            latest_size,
            sth.tree_size
        );

        for chunk in 0..chunks {
            let start = latest_size + chunk * self.max_block_size;
            let end = (start + self.max_block_size).min(sth.tree_size) - 1;
            debug_assert!(end >= start && end < sth.tree_size);

            let entries = self
                .fetcher
                .fetch_entries(&self.source, start, end)
                .await
                .map_err(PollError::Chunk)?;

            for (offset, item) in entries.into_iter().enumerate() {
                let raw = RawEntry {
                    leaf_input: item.leaf_input,
                    extra_data: item.extra_data,
                    log_url: self.source.url.clone(),
                    index: start + offset as u64,
                };
                // Blocking send is the backpressure signal: a full queue
                // slows this follower's fetches, which is the point.
                if tx.send(raw).await.is_err() {
                    return Err(PollError::QueueClosed);
                }
            }
        }

        self.latest_size = Some(sth.tree_size);
        Ok(())
    }
}

enum PollError {
    Network(FetchError),
    Chunk(FetchError),
    QueueClosed,
}
