// SPDX-License-Identifier: Apache-2.0
//! Wires the registry, followers, worker pool, and batcher together; owns
//! graceful shutdown and the periodic status summary (spec.md §4.7).

use crate::batcher::Batcher;
use crate::config::Config;
use crate::follower::Follower;
use crate::worker;
use ctscan_codec::RawEntry;
use ctscan_log_list::fetcher::Fetcher;
use ctscan_log_list::registry;
use ctscan_store::Store;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

const STATUS_INTERVAL: Duration = Duration::from_secs(30);
/// Upper bound on how long shutdown waits for in-flight entries to drain
/// through the workers before forcing a final flush.
const SHUTDOWN_DRAIN_DEADLINE: Duration = Duration::from_secs(10);

pub struct Supervisor {
    config: Config,
    store: Arc<Store>,
}

impl Supervisor {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config,
            store: Arc::new(store),
        }
    }

    /// Bootstraps the registry, spawns followers/workers/status reporter,
    /// and blocks until a shutdown signal is observed.
    pub async fn run(self) {
        let fetcher = Fetcher::new();
        let sources = registry::bootstrap(&fetcher, &self.config.extra_denylist).await;
        info!("following {} CT log(s)", sources.len());

        let (tx, rx) = mpsc::channel::<RawEntry>(self.config.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let batcher = Arc::new(Batcher::new(Arc::clone(&self.store), self.config.batch_size));
        let error_count = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut follower_handles = Vec::with_capacity(sources.len());
        for source in sources {
            let follower = Follower::new(source, fetcher.clone(), self.config.max_block_size);
            let tx = tx.clone();
            let shutdown_rx = shutdown_rx.clone();
            follower_handles.push(tokio::spawn(follower.run(tx, shutdown_rx)));
        }
        // Followers hold their own clone of `tx`; drop the supervisor's so
        // the channel closes once every follower has exited.
        drop(tx);

        let mut worker_handles = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            let rx = Arc::clone(&rx);
            let batcher = Arc::clone(&batcher);
            let error_count = Arc::clone(&error_count);
            worker_handles.push(tokio::spawn(worker::run(id, rx, batcher, error_count)));
        }

        let status_handle = tokio::spawn(Self::status_reporter(
            Arc::clone(&batcher),
            Arc::clone(&error_count),
            shutdown_rx.clone(),
        ));

        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for shutdown signal");
        info!("shutdown signal received, draining");
        let _ = shutdown_tx.send(true);

        for handle in follower_handles {
            let _ = handle.await;
        }
        let _ = tokio::time::timeout(SHUTDOWN_DRAIN_DEADLINE, join_all(worker_handles)).await;
        batcher.force_flush().await;
        let _ = status_handle.await;
        self.store.close().await;
        info!("shutdown complete");
    }

    async fn status_reporter(
        batcher: Arc<Batcher>,
        error_count: Arc<AtomicU64>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(STATUS_INTERVAL) => {
                    info!(
                        "status: total_processed={} total_errors={}",
                        batcher.total_processed(),
                        error_count.load(Ordering::Relaxed)
                    );
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

async fn join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}
