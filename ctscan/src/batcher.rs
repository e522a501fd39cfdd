// SPDX-License-Identifier: Apache-2.0
//! Accumulates `CertRecord`s and issues the batched UPSERT (spec.md §4.6).
//! The buffer is guarded by a single mutex held only for append and swap;
//! the flush itself runs with the buffer already taken, off the lock.

use ctscan_codec::CertRecord;
use ctscan_store::Store;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

pub struct Batcher {
    store: std::sync::Arc<Store>,
    batch_size: usize,
    buffer: Mutex<Vec<CertRecord>>,
    total_processed: AtomicU64,
}

impl Batcher {
    pub fn new(store: std::sync::Arc<Store>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size,
            buffer: Mutex::new(Vec::with_capacity(batch_size)),
            total_processed: AtomicU64::new(0),
        }
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed.load(Ordering::Relaxed)
    }

    /// Append a record; flushes immediately if this push reached
    /// `batch_size`.
    pub async fn push(&self, record: CertRecord) {
        let should_flush = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(record);
            buffer.len() >= self.batch_size
        };
        if should_flush {
            self.flush().await;
        }
    }

    /// Worker-signaled idle flush: a no-op if the buffer is empty, so
    /// repeated idle timeouts with nothing queued don't hit the store.
    pub async fn flush_if_idle(&self) {
        let is_empty = self.buffer.lock().await.is_empty();
        if !is_empty {
            self.flush().await;
        }
    }

    /// Supervisor-invoked unconditional flush, used on shutdown.
    pub async fn force_flush(&self) {
        self.flush().await;
    }

    async fn flush(&self) {
        let batch = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        if batch.is_empty() {
            return;
        }

        let batch_len = batch.len();
        match self.store.bulk_upsert(&batch).await {
            Ok(rows) => {
                self.total_processed.fetch_add(rows, Ordering::Relaxed);
                debug!("flushed {batch_len} records ({rows} rows upserted)");
            }
            Err(err) => {
                // The CT stream is effectively infinite and re-observation
                // is normal: drop the batch rather than requeue it.
                warn!("bulk upsert failed, dropping batch of {batch_len}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn record(subject_cn: &str) -> CertRecord {
        CertRecord {
            subject_cn: subject_cn.to_string(),
            issuer_cn: None,
            serial_number: "1".to_string(),
            fingerprint: "deadbeef".to_string(),
            not_before: Utc::now(),
            not_after: Utc::now(),
            all_domains: vec![subject_cn.to_string()],
            domains: subject_cn.to_string(),
            raw_data: serde_json::json!({}),
        }
    }

    // Exercises only the pure buffer bookkeeping (size-triggered flush
    // threshold), not the store path: a live database is out of scope for
    // unit tests here, see the crate's wiremock end-to-end tests instead.
    #[tokio::test]
    async fn buffer_reaches_threshold_at_batch_size() {
        let buffer: Mutex<Vec<CertRecord>> = Mutex::new(Vec::new());
        let batch_size = 3;
        let mut flushed_at = None;
        for i in 0..batch_size {
            let mut guard = buffer.lock().await;
            guard.push(record(&format!("site{i}.test")));
            if guard.len() >= batch_size {
                flushed_at = Some(i);
            }
        }
        assert_eq!(flushed_at, Some(batch_size - 1));
    }
}
