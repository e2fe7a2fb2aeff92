//! NFT record repository implementation for PostgreSQL.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use tally_core::error::{StorageError, StorageResult};
use tally_core::models::{MintParams, NftRecord};
use tally_core::ports::NftRepository;

use super::database::Database;
use super::helpers::is_unique_violation;

/// PostgreSQL implementation of NftRepository.
pub struct PgNftRepository {
    pool: PgPool,
}

impl PgNftRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl NftRepository for PgNftRepository {
    async fn insert(&self, record: &NftRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO nfts (token_id, network_id, owner, lp_amount, ustc_plus_amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.token_id as i64)
        .bind(record.network_id as i64)
        .bind(&record.owner)
        .bind(record.params.lp_amount)
        .bind(record.params.ustc_plus_amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::ConstraintViolation(format!(
                    "nft ({}, {}) already exists",
                    record.token_id, record.network_id
                ))
            } else {
                StorageError::QueryError(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn get(&self, token_id: u64, network_id: u64) -> StorageResult<Option<NftRecord>> {
        let row = sqlx::query_as::<_, NftRow>(
            r#"
            SELECT token_id, network_id, owner, lp_amount, ustc_plus_amount
            FROM nfts
            WHERE token_id = $1 AND network_id = $2
            "#,
        )
        .bind(token_id as i64)
        .bind(network_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(NftRow::into_model))
    }

    async fn update_owner(
        &self,
        token_id: u64,
        network_id: u64,
        owner: &str,
    ) -> StorageResult<()> {
        // Single-column update; mint-time parameters stay untouched.
        let result =
            sqlx::query("UPDATE nfts SET owner = $1 WHERE token_id = $2 AND network_id = $3")
                .bind(owner)
                .bind(token_id as i64)
                .bind(network_id as i64)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "nft ({token_id}, {network_id})"
            )));
        }

        Ok(())
    }

    async fn delete(&self, token_id: u64, network_id: u64) -> StorageResult<()> {
        sqlx::query("DELETE FROM nfts WHERE token_id = $1 AND network_id = $2")
            .bind(token_id as i64)
            .bind(network_id as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct NftRow {
    token_id: i64,
    network_id: i64,
    owner: String,
    lp_amount: Decimal,
    ustc_plus_amount: Decimal,
}

impl NftRow {
    fn into_model(self) -> NftRecord {
        NftRecord {
            token_id: self.token_id as u64,
            network_id: self.network_id as u64,
            owner: self.owner,
            params: MintParams {
                lp_amount: self.lp_amount,
                ustc_plus_amount: self.ustc_plus_amount,
            },
        }
    }
}
