// SPDX-License-Identifier: Apache-2.0
//! Stateless consumers of the ingress queue (spec.md §4.5): pop a
//! `RawEntry`, run the codec, and forward anything decodable to the
//! batcher.

use crate::batcher::Batcher;
use ctscan_codec::RawEntry;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Doubles as the flush trigger: an empty queue for this long tells the
/// batcher to flush whatever it's holding rather than wait indefinitely for
/// `BATCH_SIZE` to fill.
const POP_TIMEOUT: Duration = Duration::from_secs(2);
/// Bound log volume: codec failures are common and expected, so only every
/// Nth one gets a log line.
const ERROR_LOG_INTERVAL: u64 = 1000;

/// The ingress queue is multi-producer, multi-consumer (spec.md §4.4), but
/// `tokio::sync::mpsc::Receiver` only supports a single owner: workers share
/// one receiver behind a mutex, held only across a single `recv()`.
pub async fn run(
    id: usize,
    rx: Arc<Mutex<mpsc::Receiver<RawEntry>>>,
    batcher: Arc<Batcher>,
    error_count: Arc<AtomicU64>,
) {
    loop {
        let popped = {
            let mut rx = rx.lock().await;
            tokio::time::timeout(POP_TIMEOUT, rx.recv()).await
        };
        match popped {
            Ok(Some(raw)) => match ctscan_codec::decode(&raw) {
                Some(record) => batcher.push(record).await,
                None => {
                    let n = error_count.fetch_add(1, Ordering::Relaxed) + 1;
                    if n % ERROR_LOG_INTERVAL == 0 {
                        debug!("worker {id}: {n} codec failures so far");
                    }
                }
            },
            Ok(None) => {
                // Sender side dropped: supervisor is tearing down.
                break;
            }
            Err(_timeout) => {
                batcher.flush_if_idle().await;
            }
        }
    }
}
