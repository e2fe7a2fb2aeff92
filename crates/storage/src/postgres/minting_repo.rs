//! Minting record repository implementation for PostgreSQL.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use tally_core::error::{StorageError, StorageResult};
use tally_core::models::MintingRecord;
use tally_core::ports::MintingRepository;

use super::database::Database;
use super::helpers::is_unique_violation;

/// PostgreSQL implementation of MintingRepository.
pub struct PgMintingRepository {
    pool: PgPool,
}

impl PgMintingRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    wallet_address, network_id, txid, "timestamp", deposit_amount,
    ustc_amount, order_completed, order_id, nft_id, manual,
    deposit_status, mint_completed
"#;

#[async_trait]
impl MintingRepository for PgMintingRepository {
    async fn insert(&self, record: &MintingRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO mintings (
                wallet_address, network_id, txid, "timestamp", deposit_amount,
                ustc_amount, order_completed, order_id, nft_id, manual,
                deposit_status, mint_completed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&record.wallet_address)
        .bind(record.network_id as i64)
        .bind(&record.txid)
        .bind(record.timestamp)
        .bind(record.deposit_amount)
        .bind(record.ustc_amount)
        .bind(record.order_completed)
        .bind(record.order_id)
        .bind(record.nft_id as i64)
        .bind(record.manual)
        .bind(record.deposit_status)
        .bind(record.mint_completed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::ConstraintViolation(format!(
                    "minting ({}, {}) already exists",
                    record.txid, record.network_id
                ))
            } else {
                StorageError::QueryError(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn get_by_txid(
        &self,
        txid: &str,
        network_id: u64,
    ) -> StorageResult<Option<MintingRecord>> {
        let row = sqlx::query_as::<_, MintingRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM mintings WHERE txid = $1 AND network_id = $2"
        ))
        .bind(txid)
        .bind(network_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(MintingRow::into_model))
    }

    async fn get_by_nft(
        &self,
        nft_id: u64,
        network_id: u64,
    ) -> StorageResult<Option<MintingRecord>> {
        let row = sqlx::query_as::<_, MintingRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM mintings WHERE nft_id = $1 AND network_id = $2"
        ))
        .bind(nft_id as i64)
        .bind(network_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(MintingRow::into_model))
    }

    async fn list_by_wallet(&self, wallet_address: &str) -> StorageResult<Vec<MintingRecord>> {
        let rows = sqlx::query_as::<_, MintingRow>(&format!(
            r#"SELECT {SELECT_COLUMNS} FROM mintings
               WHERE wallet_address = $1
               ORDER BY "timestamp" ASC"#
        ))
        .bind(wallet_address)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(MintingRow::into_model).collect())
    }

    async fn set_mint_completed(&self, txid: &str, network_id: u64) -> StorageResult<()> {
        // Single-column update; consumer-owned fields stay untouched.
        let result = sqlx::query(
            "UPDATE mintings SET mint_completed = TRUE WHERE txid = $1 AND network_id = $2",
        )
        .bind(txid)
        .bind(network_id as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "minting ({txid}, {network_id})"
            )));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct MintingRow {
    wallet_address: String,
    network_id: i64,
    txid: String,
    timestamp: i64,
    deposit_amount: Decimal,
    ustc_amount: Decimal,
    order_completed: bool,
    order_id: i64,
    nft_id: i64,
    manual: bool,
    deposit_status: i32,
    mint_completed: bool,
}

impl MintingRow {
    fn into_model(self) -> MintingRecord {
        MintingRecord {
            wallet_address: self.wallet_address,
            network_id: self.network_id as u64,
            txid: self.txid,
            timestamp: self.timestamp,
            deposit_amount: self.deposit_amount,
            ustc_amount: self.ustc_amount,
            order_completed: self.order_completed,
            order_id: self.order_id,
            nft_id: self.nft_id as u64,
            manual: self.manual,
            deposit_status: self.deposit_status,
            mint_completed: self.mint_completed,
        }
    }
}
