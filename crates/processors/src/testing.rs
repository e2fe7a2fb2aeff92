//! In-memory repository fakes shared by the processor tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use tally_core::error::{DomainResult, StorageError, StorageResult};
use tally_core::models::{Checkpoint, MintParams, MintingRecord, NftRecord, StreamKind};
use tally_core::ports::{
    ChainReader, CheckpointRepository, EndMintingEvent, MintingRepository, NftRepository,
    Repositories, StartMintingEvent, TransferEvent,
};

// =============================================================================
// Event Builders
// =============================================================================

pub fn start_event() -> StartMintingEvent {
    StartMintingEvent {
        id: "10-5".into(),
        txid: "0xabc".into(),
        usdc_amount: "1000000".into(),
        deposit_id: "7".into(),
        db_write_timestamp: "2024-09-10T00:00:00".parse().unwrap(),
        creator: "0xuser".into(),
    }
}

pub fn end_event() -> EndMintingEvent {
    EndMintingEvent {
        id: "10-6".into(),
        deposit_id_is_token_id: "7".into(),
        db_write_timestamp: "2024-09-10T00:01:00".parse().unwrap(),
        creator: "0xuser".into(),
        ustc_plus_amount: "0".into(),
    }
}

pub fn transfer_event(from: &str, to: &str) -> TransferEvent {
    TransferEvent {
        db_write_timestamp: "2024-09-10T00:02:00".parse().unwrap(),
        from: from.into(),
        id: "10-7".into(),
        to: to.into(),
        token_id: "7".into(),
    }
}

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
pub struct MemCheckpointRepo {
    pub rows: Mutex<HashMap<StreamKind, Checkpoint>>,
}

#[async_trait]
impl CheckpointRepository for MemCheckpointRepo {
    async fn get(&self, stream: StreamKind) -> StorageResult<Option<Checkpoint>> {
        Ok(self.rows.lock().unwrap().get(&stream).cloned())
    }

    async fn create(&self, stream: StreamKind) -> StorageResult<Checkpoint> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&stream) {
            return Err(StorageError::AlreadyExists(stream.to_string()));
        }
        let checkpoint = Checkpoint::initial(stream);
        rows.insert(stream, checkpoint.clone());
        Ok(checkpoint)
    }

    async fn update(&self, checkpoint: &Checkpoint) -> StorageResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert(checkpoint.stream, checkpoint.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemMintingRepo {
    pub rows: Mutex<Vec<MintingRecord>>,
    fail_insert: AtomicBool,
}

impl MemMintingRepo {
    pub fn fail_inserts(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MintingRepository for MemMintingRepo {
    async fn insert(&self, record: &MintingRecord) -> StorageResult<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StorageError::QueryError("insert failed".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.txid == record.txid && r.network_id == record.network_id)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "minting ({}, {}) already exists",
                record.txid, record.network_id
            )));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn get_by_txid(
        &self,
        txid: &str,
        network_id: u64,
    ) -> StorageResult<Option<MintingRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.txid == txid && r.network_id == network_id)
            .cloned())
    }

    async fn get_by_nft(
        &self,
        nft_id: u64,
        network_id: u64,
    ) -> StorageResult<Option<MintingRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.nft_id == nft_id && r.network_id == network_id)
            .cloned())
    }

    async fn list_by_wallet(&self, wallet_address: &str) -> StorageResult<Vec<MintingRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.wallet_address == wallet_address)
            .cloned()
            .collect())
    }

    async fn set_mint_completed(&self, txid: &str, network_id: u64) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.txid == txid && r.network_id == network_id)
            .ok_or_else(|| StorageError::NotFound(format!("minting ({txid}, {network_id})")))?;
        record.mint_completed = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemNftRepo {
    pub rows: Mutex<Vec<NftRecord>>,
}

#[async_trait]
impl NftRepository for MemNftRepo {
    async fn insert(&self, record: &NftRecord) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.token_id == record.token_id && r.network_id == record.network_id)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "nft ({}, {}) already exists",
                record.token_id, record.network_id
            )));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn get(&self, token_id: u64, network_id: u64) -> StorageResult<Option<NftRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.token_id == token_id && r.network_id == network_id)
            .cloned())
    }

    async fn update_owner(
        &self,
        token_id: u64,
        network_id: u64,
        owner: &str,
    ) -> StorageResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.token_id == token_id && r.network_id == network_id)
            .ok_or_else(|| StorageError::NotFound(format!("nft ({token_id}, {network_id})")))?;
        record.owner = owner.to_string();
        Ok(())
    }

    async fn delete(&self, token_id: u64, network_id: u64) -> StorageResult<()> {
        self.rows
            .lock()
            .unwrap()
            .retain(|r| !(r.token_id == token_id && r.network_id == network_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemRepositories {
    pub checkpoints: MemCheckpointRepo,
    pub mintings: MemMintingRepo,
    pub nfts: MemNftRepo,
}

impl Repositories for MemRepositories {
    fn checkpoints(&self) -> &dyn CheckpointRepository {
        &self.checkpoints
    }

    fn mintings(&self) -> &dyn MintingRepository {
        &self.mintings
    }

    fn nfts(&self) -> &dyn NftRepository {
        &self.nfts
    }
}

pub struct NoopChainReader;

#[async_trait]
impl ChainReader for NoopChainReader {
    async fn mint_params(&self, _token_id: u64, _network_id: u64) -> DomainResult<MintParams> {
        Ok(MintParams::default())
    }
}
