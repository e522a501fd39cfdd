// SPDX-License-Identifier: Apache-2.0
//! The store adapter: a Postgres connection pool, schema ownership, and the
//! batcher's single write path (`bulk_upsert`).

use std::fmt;
use std::time::Duration;

use ctscan_codec::CertRecord;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::{Pool, Postgres, QueryBuilder};

const DEFAULT_MIN_CONNECTIONS: u32 = 10;
const DEFAULT_MAX_CONNECTIONS: u32 = 50;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// A batch this size or larger is chunked into multiple UPSERT statements:
/// Postgres caps bind parameters per statement at 65535, and each row binds
/// eight.
const MAX_ROWS_PER_STATEMENT: usize = 5000;

#[derive(Debug)]
pub enum StoreError {
    Connect(sqlx::Error),
    SchemaInit(sqlx::Error),
    Upsert(sqlx::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connect(err) => write!(f, "could not connect to store: {err}"),
            StoreError::SchemaInit(err) => write!(f, "could not initialize schema: {err}"),
            StoreError::Upsert(err) => write!(f, "bulk upsert failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Connect(err) | StoreError::SchemaInit(err) | StoreError::Upsert(err) => {
                Some(err)
            }
        }
    }
}

pub struct Store {
    pool: Pool<Postgres>,
}

impl Store {
    /// Connect with a pool sized per the reference design (min 10, max 50).
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(StoreError::Connect)?;
        Ok(Self { pool })
    }

    /// Create the `certificates` table and its indexes if they don't already
    /// exist. Called once at startup; a failure here is fatal.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS pg_trgm")
            .execute(&self.pool)
            .await
            .map_err(StoreError::SchemaInit)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS certificates (
                id BIGSERIAL PRIMARY KEY,
                subject_cn TEXT UNIQUE NOT NULL,
                issuer_cn TEXT,
                serial_number TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                not_before TIMESTAMPTZ NOT NULL,
                not_after TIMESTAMPTZ NOT NULL,
                domains TEXT NOT NULL,
                raw_data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::SchemaInit)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS certificates_fingerprint_idx ON certificates (fingerprint)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::SchemaInit)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS certificates_created_at_idx ON certificates (created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::SchemaInit)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS certificates_domains_trgm_idx ON certificates \
             USING gin (domains gin_trgm_ops)",
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::SchemaInit)?;

        Ok(())
    }

    /// Upsert a batch of records keyed on `subject_cn`. Records sharing a
    /// `subject_cn` within the batch are deduplicated first, keeping the
    /// last occurrence: Postgres rejects a multi-row `ON CONFLICT` statement
    /// that targets the same conflict key twice, and the spec's tie-break
    /// ("final record wins") calls for exactly this anyway.
    pub async fn bulk_upsert(&self, records: &[CertRecord]) -> Result<u64, StoreError> {
        let deduped = dedup_by_subject_cn(records);
        if deduped.is_empty() {
            return Ok(0);
        }

        let mut total = 0u64;
        for chunk in deduped.chunks(MAX_ROWS_PER_STATEMENT) {
            total += self.upsert_chunk(chunk).await?;
        }
        Ok(total)
    }

    async fn upsert_chunk(&self, records: &[&CertRecord]) -> Result<u64, StoreError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO certificates \
             (subject_cn, issuer_cn, serial_number, fingerprint, not_before, not_after, domains, raw_data) ",
        );

        builder.push_values(records, |mut row, record| {
            row.push_bind(&record.subject_cn)
                .push_bind(&record.issuer_cn)
                .push_bind(&record.serial_number)
                .push_bind(&record.fingerprint)
                .push_bind(record.not_before)
                .push_bind(record.not_after)
                .push_bind(&record.domains)
                .push_bind(&record.raw_data);
        });

        builder.push(
            // issuer_cn is intentionally absent here: spec.md §4.6 enumerates
            // the overwrite set as serial_number/fingerprint/not_before/
            // not_after/domains/raw_data (+ updated_at), and sql_helper.py's
            // bulk_insert_certificates likewise leaves issuer_cn out of its
            // conflict update.
            " ON CONFLICT (subject_cn) DO UPDATE SET \
              serial_number = EXCLUDED.serial_number, \
              fingerprint = EXCLUDED.fingerprint, \
              not_before = EXCLUDED.not_before, \
              not_after = EXCLUDED.not_after, \
              domains = EXCLUDED.domains, \
              raw_data = EXCLUDED.raw_data, \
              updated_at = now()",
        );

        let result: PgQueryResult = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(StoreError::Upsert)?;
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Keep the last occurrence of each `subject_cn`, preserving the relative
/// order of survivors. The batcher hands us records in buffer (FIFO) order,
/// so "last occurrence" is exactly "last writer in buffer order" per the
/// spec's tie-breaking rule.
fn dedup_by_subject_cn(records: &[CertRecord]) -> Vec<&CertRecord> {
    use std::collections::HashMap;

    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        last_index.insert(record.subject_cn.as_str(), i);
    }

    records
        .iter()
        .enumerate()
        .filter(|(i, record)| last_index.get(record.subject_cn.as_str()) == Some(i))
        .map(|(_, record)| record)
        .collect()
}
