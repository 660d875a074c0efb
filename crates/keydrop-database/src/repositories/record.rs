//! Credential record repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use keydrop_core::error::{AppError, ErrorKind};
use keydrop_core::result::AppResult;
use keydrop_core::types::id::UserId;
use keydrop_entity::record::model::NewRecord;
use keydrop_entity::record::{Record, RecordKind};

use crate::store::{ClaimTransaction, ClaimantCount, KindCount, RecordStore};

const RECORD_COLUMNS: &str =
    "id, kind, username, password, email, email_password, is_used, claimed_by, claimed_at";

/// Repository for the credential pool.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    /// Create a new record repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for RecordRepository {
    async fn begin_claim(&self) -> AppResult<Box<dyn ClaimTransaction>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin claim transaction", e)
        })?;
        Ok(Box::new(PgClaimTransaction { tx }))
    }

    async fn count_unused_by_kind(&self) -> AppResult<Vec<KindCount>> {
        sqlx::query_as::<_, KindCount>(
            "SELECT kind, COUNT(*) AS count FROM records WHERE is_used = FALSE GROUP BY kind",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count free records", e))
    }

    async fn count_claimed_by_kind(&self) -> AppResult<Vec<KindCount>> {
        sqlx::query_as::<_, KindCount>(
            "SELECT kind, COUNT(*) AS count FROM records WHERE is_used = TRUE GROUP BY kind",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count claimed records", e)
        })
    }

    async fn top_claimants(&self, limit: usize) -> AppResult<Vec<ClaimantCount>> {
        sqlx::query_as::<_, ClaimantCount>(
            "SELECT claimed_by AS claimant, COUNT(*) AS count FROM records \
             WHERE is_used = TRUE AND claimed_by IS NOT NULL \
             GROUP BY claimed_by \
             ORDER BY count DESC, claimed_by ASC \
             LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rank claimants", e))
    }

    async fn seed(&self, records: &[NewRecord]) -> AppResult<Vec<i64>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin seed transaction", e)
        })?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO records (kind, username, password, email, email_password) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(record.kind)
            .bind(&record.username)
            .bind(&record.password)
            .bind(&record.email)
            .bind(&record.email_password)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to seed record", e))?;
            ids.push(id);
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit seeded records", e)
        })?;
        Ok(ids)
    }
}

/// A claim transaction backed by a PostgreSQL transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
#[derive(Debug)]
pub struct PgClaimTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ClaimTransaction for PgClaimTransaction {
    async fn lock_unused(&mut self, kind: RecordKind, limit: u32) -> AppResult<Vec<Record>> {
        let rows = sqlx::query_as::<_, Record>(&format!(
            "SELECT {RECORD_COLUMNS} FROM records \
             WHERE is_used = FALSE AND kind = $1 \
             ORDER BY id ASC \
             LIMIT $2 \
             FOR UPDATE SKIP LOCKED"
        ))
        .bind(kind)
        .bind(i64::from(limit))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock free records", e))?;

        debug!(kind = %kind, requested = limit, locked = rows.len(), "Locked free records");
        Ok(rows)
    }

    async fn mark_claimed(
        &mut self,
        ids: &[i64],
        claimant: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE records SET is_used = TRUE, claimed_by = $1, claimed_at = $2 \
             WHERE id = ANY($3) AND is_used = FALSE",
        )
        .bind(claimant)
        .bind(at)
        .bind(ids.to_vec())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark records claimed", e))?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit claim", e))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to roll back claim", e))
    }
}
