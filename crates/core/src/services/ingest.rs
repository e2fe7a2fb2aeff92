//! Ingestion service - orchestrates the fetch/fold/checkpoint cycle.
//!
//! The service owns the periodic trigger and the per-stream watermarks.
//! Watermarks live on the service task and are passed explicitly into
//! every fetch; the checkpoint store is the single durable source of
//! truth, loaded once at startup.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{IngestError, IngestResult, UpstreamError};
use crate::metrics::{
    CycleTimer, record_checkpoint_persist_failure, record_cycle, record_events_applied,
    record_fetch_error, record_item_failure,
};
use crate::models::{Checkpoint, StreamKind, Watermark};
use crate::ports::{
    EndMintingEvent, EventProcessors, EventSource, ItemOutcome, Repositories, StartMintingEvent,
    StreamEvent, StreamReport, StreamWatermarks, TransferEvent,
};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the ingest service.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Interval between cycle triggers.
    pub poll_interval: Duration,
    /// Upper bound on one cycle's upstream fetch.
    pub fetch_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Cycle Report
// =============================================================================

/// Summary of one completed cycle, one report per stream.
#[derive(Debug)]
pub struct CycleReport {
    pub streams: Vec<StreamReport>,
}

impl CycleReport {
    /// Total events fetched this cycle.
    pub fn total(&self) -> usize {
        self.streams.iter().map(StreamReport::len).sum()
    }

    /// Total events that failed this cycle.
    pub fn failed(&self) -> usize {
        self.streams.iter().map(StreamReport::failed).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// =============================================================================
// IngestService
// =============================================================================

/// Main ingestion service.
///
/// # Flow
///
/// 1. Load or create each stream's checkpoint (any failure is fatal)
/// 2. On each tick, fetch all three streams past their watermarks
/// 3. Fold each batch through its processor, strictly in fetch order
/// 4. Persist each stream's new checkpoint, then advance it in memory
///
/// Cycles are serialized on this task; a tick firing while a cycle runs
/// is dropped, never queued.
pub struct IngestService<S: EventSource, R: Repositories> {
    config: IngestConfig,
    source: Arc<S>,
    repositories: Arc<R>,
    processors: Arc<dyn EventProcessors>,
}

impl<S: EventSource, R: Repositories> IngestService<S, R> {
    pub fn new(
        config: IngestConfig,
        source: Arc<S>,
        repositories: Arc<R>,
        processors: Arc<dyn EventProcessors>,
    ) -> Self {
        Self {
            config,
            source,
            repositories,
            processors,
        }
    }

    /// Start the ingest loop.
    ///
    /// Runs until the shutdown channel flips, then returns
    /// [`IngestError::ShutdownRequested`].
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> IngestResult<()> {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting ingestion"
        );

        let mut watermarks = self.load_watermarks().await?;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        // The single-flight guard: cycles run on this task only, and ticks
        // that fire while one is in progress are skipped.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle(&mut watermarks).await {
                        Ok(report) if report.is_empty() => {
                            debug!("Cycle complete, no new events");
                        }
                        Ok(report) => {
                            info!(
                                events = report.total(),
                                failed = report.failed(),
                                "Cycle complete"
                            );
                        }
                        Err(IngestError::Upstream(e)) => {
                            record_fetch_error();
                            warn!(error = %e, "Fetch failed, cycle aborted; retrying next tick");
                        }
                        Err(e) => {
                            error!(error = %e, "Cycle failed");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("Shutdown requested");
                        return Err(IngestError::ShutdownRequested);
                    }
                }
            }
        }
    }

    /// Load every stream's checkpoint, creating missing ones.
    ///
    /// Any failure here is fatal: running with undefined watermark state
    /// would reprocess or skip events.
    async fn load_watermarks(&self) -> IngestResult<StreamWatermarks> {
        let mut watermarks = StreamWatermarks::default();
        for stream in StreamKind::ALL {
            let checkpoints = self.repositories.checkpoints();
            let checkpoint = match checkpoints.get(stream).await {
                Ok(Some(checkpoint)) => checkpoint,
                Ok(None) => {
                    info!(stream = %stream, "No checkpoint found, creating initial");
                    checkpoints
                        .create(stream)
                        .await
                        .map_err(|e| IngestError::CheckpointInit {
                            stream,
                            message: e.to_string(),
                        })?
                }
                Err(e) => {
                    return Err(IngestError::CheckpointInit {
                        stream,
                        message: e.to_string(),
                    });
                }
            };
            debug!(
                stream = %stream,
                watermark = %checkpoint.watermark.timestamp,
                "Checkpoint loaded"
            );
            *watermarks.get_mut(stream) = checkpoint.watermark;
        }
        Ok(watermarks)
    }

    /// Run one fetch/fold/checkpoint cycle.
    ///
    /// A fetch failure aborts the cycle before any mutation. Per-item
    /// failures never abort; the watermark still advances to the batch's
    /// last event, so a failed item is logged once and not re-fetched.
    async fn run_cycle(&self, watermarks: &mut StreamWatermarks) -> IngestResult<CycleReport> {
        let _timer = CycleTimer::new();
        record_cycle();

        let batches = tokio::time::timeout(self.config.fetch_timeout, self.source.fetch(watermarks))
            .await
            .map_err(|_| UpstreamError::Timeout(self.config.fetch_timeout.as_secs()))??;

        // Streams fold concurrently; within a stream, strictly in fetch order.
        let (start_report, end_report, transfer_report) = tokio::join!(
            self.fold_start_minting(&batches.start_minting),
            self.fold_end_minting(&batches.end_minting),
            self.fold_transfers(&batches.transfers),
        );

        self.advance(StreamKind::StartMinting, &batches.start_minting, watermarks)
            .await;
        self.advance(StreamKind::EndMinting, &batches.end_minting, watermarks)
            .await;
        self.advance(StreamKind::NftTransfer, &batches.transfers, watermarks)
            .await;

        Ok(CycleReport {
            streams: vec![start_report, end_report, transfer_report],
        })
    }

    async fn fold_start_minting(&self, events: &[StartMintingEvent]) -> StreamReport {
        let mut report = StreamReport::new(StreamKind::StartMinting);
        for event in events {
            let outcome = self.processors.apply_start_minting(event).await;
            self.note_outcome(StreamKind::StartMinting, event, &outcome);
            report.outcomes.push(outcome);
        }
        record_events_applied(StreamKind::StartMinting, report.applied() as u64);
        report
    }

    async fn fold_end_minting(&self, events: &[EndMintingEvent]) -> StreamReport {
        let mut report = StreamReport::new(StreamKind::EndMinting);
        for event in events {
            let outcome = self.processors.apply_end_minting(event).await;
            self.note_outcome(StreamKind::EndMinting, event, &outcome);
            report.outcomes.push(outcome);
        }
        record_events_applied(StreamKind::EndMinting, report.applied() as u64);
        report
    }

    async fn fold_transfers(&self, events: &[TransferEvent]) -> StreamReport {
        let mut report = StreamReport::new(StreamKind::NftTransfer);
        for event in events {
            let outcome = self.processors.apply_transfer(event).await;
            self.note_outcome(StreamKind::NftTransfer, event, &outcome);
            report.outcomes.push(outcome);
        }
        record_events_applied(StreamKind::NftTransfer, report.applied() as u64);
        report
    }

    /// Log a failed item with its full payload for manual remediation.
    fn note_outcome<E: StreamEvent + serde::Serialize>(
        &self,
        stream: StreamKind,
        event: &E,
        outcome: &ItemOutcome,
    ) {
        if let ItemOutcome::Failed(e) = outcome {
            record_item_failure(stream);
            error!(
                stream = %stream,
                id = event.event_id(),
                payload = serde_json::to_string(event).unwrap_or_default(),
                error = %e,
                "Event failed, manual follow-up required"
            );
        }
    }

    /// Persist and advance one stream's watermark from its batch.
    ///
    /// The checkpoint is persisted before the in-memory watermark moves,
    /// so a persistence failure replays the batch instead of skipping it;
    /// the processors absorb the replay idempotently.
    async fn advance<E: StreamEvent>(
        &self,
        stream: StreamKind,
        batch: &[E],
        watermarks: &mut StreamWatermarks,
    ) {
        let Some(last) = batch.last() else {
            return;
        };
        let next = Watermark {
            timestamp: last.write_timestamp(),
            last_event_id: last.event_id().to_string(),
        };
        // Upstream batches are ascending and strictly past the watermark,
        // so a non-advance means a malformed response. Never move backwards.
        if !watermarks.get(stream).precedes(&next) {
            warn!(stream = %stream, "Batch did not advance the watermark, skipping update");
            return;
        }

        let checkpoint = Checkpoint {
            stream,
            watermark: next.clone(),
            updated_at: chrono::Utc::now(),
        };
        match self.repositories.checkpoints().update(&checkpoint).await {
            Ok(()) => {
                debug!(
                    stream = %stream,
                    watermark = %next.timestamp,
                    last_event = %next.last_event_id,
                    "Checkpoint advanced"
                );
                *watermarks.get_mut(stream) = next;
            }
            Err(e) => {
                record_checkpoint_persist_failure(stream);
                error!(
                    stream = %stream,
                    error = %e,
                    "Checkpoint persistence failed, batch will be re-fetched"
                );
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    use super::*;
    use crate::error::{DomainError, StorageError, StorageResult, UpstreamResult};
    use crate::models::{MintingRecord, NftRecord};
    use crate::ports::{
        CheckpointRepository, EventBatches, MintingRepository, NftRepository,
    };

    fn ts(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn start_event(id: &str, when: &str) -> StartMintingEvent {
        StartMintingEvent {
            id: id.to_string(),
            txid: format!("0x{id}"),
            usdc_amount: "1000000".into(),
            deposit_id: "7".into(),
            db_write_timestamp: ts(when),
            creator: "0xuser".into(),
        }
    }

    fn transfer_event(id: &str, when: &str) -> TransferEvent {
        TransferEvent {
            db_write_timestamp: ts(when),
            from: "0xalice".into(),
            id: id.to_string(),
            to: "0xbob".into(),
            token_id: "7".into(),
        }
    }

    /// Scripted event source: pops one pre-loaded result per fetch,
    /// empty batches once the script runs out.
    struct MockSource {
        script: Mutex<VecDeque<UpstreamResult<EventBatches>>>,
    }

    impl MockSource {
        fn new(script: Vec<UpstreamResult<EventBatches>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl EventSource for MockSource {
        async fn fetch(&self, _watermarks: &StreamWatermarks) -> UpstreamResult<EventBatches> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(EventBatches::default()))
        }
    }

    #[derive(Default)]
    struct MemCheckpointRepo {
        rows: Mutex<HashMap<StreamKind, Checkpoint>>,
        fail_updates: AtomicBool,
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
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(StorageError::QueryError("disk full".into()));
            }
            self.rows
                .lock()
                .unwrap()
                .insert(checkpoint.stream, checkpoint.clone());
            Ok(())
        }
    }

    struct StubMintingRepo;

    #[async_trait]
    impl MintingRepository for StubMintingRepo {
        async fn insert(&self, _record: &MintingRecord) -> StorageResult<()> {
            Ok(())
        }
        async fn get_by_txid(
            &self,
            _txid: &str,
            _network_id: u64,
        ) -> StorageResult<Option<MintingRecord>> {
            Ok(None)
        }
        async fn get_by_nft(
            &self,
            _nft_id: u64,
            _network_id: u64,
        ) -> StorageResult<Option<MintingRecord>> {
            Ok(None)
        }
        async fn list_by_wallet(&self, _wallet: &str) -> StorageResult<Vec<MintingRecord>> {
            Ok(Vec::new())
        }
        async fn set_mint_completed(&self, _txid: &str, _network_id: u64) -> StorageResult<()> {
            Ok(())
        }
    }

    struct StubNftRepo;

    #[async_trait]
    impl NftRepository for StubNftRepo {
        async fn insert(&self, _record: &NftRecord) -> StorageResult<()> {
            Ok(())
        }
        async fn get(&self, _token_id: u64, _network_id: u64) -> StorageResult<Option<NftRecord>> {
            Ok(None)
        }
        async fn update_owner(
            &self,
            _token_id: u64,
            _network_id: u64,
            _owner: &str,
        ) -> StorageResult<()> {
            Ok(())
        }
        async fn delete(&self, _token_id: u64, _network_id: u64) -> StorageResult<()> {
            Ok(())
        }
    }

    struct MemRepositories {
        checkpoints: MemCheckpointRepo,
        mintings: StubMintingRepo,
        nfts: StubNftRepo,
    }

    impl MemRepositories {
        fn new() -> Self {
            Self {
                checkpoints: MemCheckpointRepo::default(),
                mintings: StubMintingRepo,
                nfts: StubNftRepo,
            }
        }
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

    /// Processors that apply everything except a configured set of ids.
    #[derive(Default)]
    struct FakeProcessors {
        fail_ids: HashSet<String>,
        applied: Mutex<Vec<String>>,
    }

    impl FakeProcessors {
        fn failing(ids: &[&str]) -> Self {
            Self {
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
                applied: Mutex::new(Vec::new()),
            }
        }

        fn outcome(&self, id: &str) -> ItemOutcome {
            if self.fail_ids.contains(id) {
                ItemOutcome::Failed(DomainError::InvalidEventId(id.to_string()))
            } else {
                self.applied.lock().unwrap().push(id.to_string());
                ItemOutcome::Applied
            }
        }
    }

    #[async_trait]
    impl EventProcessors for FakeProcessors {
        async fn apply_start_minting(&self, event: &StartMintingEvent) -> ItemOutcome {
            self.outcome(&event.id)
        }
        async fn apply_end_minting(&self, event: &EndMintingEvent) -> ItemOutcome {
            self.outcome(&event.id)
        }
        async fn apply_transfer(&self, event: &TransferEvent) -> ItemOutcome {
            self.outcome(&event.id)
        }
    }

    fn service(
        script: Vec<UpstreamResult<EventBatches>>,
        processors: FakeProcessors,
    ) -> (IngestService<MockSource, MemRepositories>, Arc<FakeProcessors>) {
        let processors = Arc::new(processors);
        let svc = IngestService::new(
            IngestConfig::default(),
            Arc::new(MockSource::new(script)),
            Arc::new(MemRepositories::new()),
            processors.clone(),
        );
        (svc, processors)
    }

    #[tokio::test]
    async fn load_watermarks_creates_initial_checkpoints() {
        let (svc, _) = service(vec![], FakeProcessors::default());
        let watermarks = svc.load_watermarks().await.unwrap();

        for stream in StreamKind::ALL {
            assert_eq!(*watermarks.get(stream), Watermark::initial());
            let stored = svc.repositories.checkpoints().get(stream).await.unwrap();
            assert!(stored.is_some(), "checkpoint for {stream} not created");
        }
    }

    #[tokio::test]
    async fn load_watermarks_surfaces_init_failure_as_fatal() {
        let (svc, _) = service(vec![], FakeProcessors::default());

        struct BrokenCheckpointRepo;

        #[async_trait]
        impl CheckpointRepository for BrokenCheckpointRepo {
            async fn get(&self, _stream: StreamKind) -> StorageResult<Option<Checkpoint>> {
                Err(StorageError::ConnectionError("db down".into()))
            }
            async fn create(&self, stream: StreamKind) -> StorageResult<Checkpoint> {
                Ok(Checkpoint::initial(stream))
            }
            async fn update(&self, _checkpoint: &Checkpoint) -> StorageResult<()> {
                Ok(())
            }
        }

        struct BrokenRepositories {
            checkpoints: BrokenCheckpointRepo,
            mintings: StubMintingRepo,
            nfts: StubNftRepo,
        }

        impl Repositories for BrokenRepositories {
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

        let broken = IngestService::new(
            IngestConfig::default(),
            svc.source.clone(),
            Arc::new(BrokenRepositories {
                checkpoints: BrokenCheckpointRepo,
                mintings: StubMintingRepo,
                nfts: StubNftRepo,
            }),
            Arc::new(FakeProcessors::default()),
        );
        let err = broken.load_watermarks().await.unwrap_err();
        assert!(matches!(err, IngestError::CheckpointInit { .. }));
    }

    #[tokio::test]
    async fn watermark_advances_to_last_event_of_batch() {
        let batches = EventBatches {
            start_minting: vec![
                start_event("10-1", "2024-09-10T00:00:00"),
                start_event("10-2", "2024-09-10T00:00:05"),
            ],
            ..Default::default()
        };
        let (svc, _) = service(vec![Ok(batches)], FakeProcessors::default());
        let mut watermarks = svc.load_watermarks().await.unwrap();

        let report = svc.run_cycle(&mut watermarks).await.unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.failed(), 0);

        let wm = watermarks.get(StreamKind::StartMinting);
        assert_eq!(wm.timestamp, ts("2024-09-10T00:00:05"));
        assert_eq!(wm.last_event_id, "10-2");

        // Persisted copy matches memory.
        let stored = svc
            .repositories
            .checkpoints()
            .get(StreamKind::StartMinting)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.watermark, *wm);
        // Untouched streams keep the initial watermark.
        assert_eq!(*watermarks.get(StreamKind::EndMinting), Watermark::initial());
    }

    // Pins the advance policy: failed items do not hold the watermark
    // back, they are logged once and never re-fetched.
    #[tokio::test]
    async fn watermark_advances_past_failed_items() {
        let batches = EventBatches {
            start_minting: vec![
                start_event("10-1", "2024-09-10T00:00:00"),
                start_event("10-2", "2024-09-10T00:00:05"),
                start_event("10-3", "2024-09-10T00:00:09"),
            ],
            ..Default::default()
        };
        let (svc, _) = service(vec![Ok(batches)], FakeProcessors::failing(&["10-2"]));
        let mut watermarks = svc.load_watermarks().await.unwrap();

        let report = svc.run_cycle(&mut watermarks).await.unwrap();
        assert_eq!(report.failed(), 1);

        let wm = watermarks.get(StreamKind::StartMinting);
        assert_eq!(wm.last_event_id, "10-3");
        assert_eq!(wm.timestamp, ts("2024-09-10T00:00:09"));
    }

    #[tokio::test]
    async fn fetch_failure_leaves_state_untouched() {
        let (svc, processors) = service(
            vec![Err(UpstreamError::Http("connection refused".into()))],
            FakeProcessors::default(),
        );
        let mut watermarks = svc.load_watermarks().await.unwrap();

        let err = svc.run_cycle(&mut watermarks).await.unwrap_err();
        assert!(matches!(err, IngestError::Upstream(_)));

        for stream in StreamKind::ALL {
            assert_eq!(*watermarks.get(stream), Watermark::initial());
            let stored = svc
                .repositories
                .checkpoints()
                .get(stream)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.watermark, Watermark::initial());
        }
        assert!(processors.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batches_leave_checkpoints_untouched() {
        let (svc, _) = service(vec![Ok(EventBatches::default())], FakeProcessors::default());
        let mut watermarks = svc.load_watermarks().await.unwrap();
        let before = svc
            .repositories
            .checkpoints()
            .get(StreamKind::NftTransfer)
            .await
            .unwrap()
            .unwrap();

        let report = svc.run_cycle(&mut watermarks).await.unwrap();
        assert!(report.is_empty());

        let after = svc
            .repositories
            .checkpoints()
            .get(StreamKind::NftTransfer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[tokio::test]
    async fn persist_failure_keeps_memory_watermark() {
        let batches = EventBatches {
            transfers: vec![transfer_event("10-9", "2024-09-10T01:00:00")],
            ..Default::default()
        };
        let (svc, _) = service(vec![Ok(batches)], FakeProcessors::default());
        let mut watermarks = svc.load_watermarks().await.unwrap();
        svc.repositories
            .checkpoints
            .fail_updates
            .store(true, Ordering::SeqCst);

        svc.run_cycle(&mut watermarks).await.unwrap();

        // Memory did not advance, so the batch is re-fetched next cycle.
        assert_eq!(*watermarks.get(StreamKind::NftTransfer), Watermark::initial());
        let stored = svc
            .repositories
            .checkpoints()
            .get(StreamKind::NftTransfer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.watermark, Watermark::initial());
    }

    #[tokio::test]
    async fn equal_timestamps_advance_on_event_id() {
        let when = "2024-09-10T02:00:00";
        let first = EventBatches {
            start_minting: vec![start_event("10-1", when), start_event("10-2", when)],
            ..Default::default()
        };
        let second = EventBatches {
            start_minting: vec![start_event("10-3", when)],
            ..Default::default()
        };
        let (svc, _) = service(vec![Ok(first), Ok(second)], FakeProcessors::default());
        let mut watermarks = svc.load_watermarks().await.unwrap();

        svc.run_cycle(&mut watermarks).await.unwrap();
        assert_eq!(watermarks.get(StreamKind::StartMinting).last_event_id, "10-2");

        // The id component keeps advancing even though the timestamp is
        // pinned, so the truncated tail of an equal-timestamp run is
        // reachable on the next cycle.
        svc.run_cycle(&mut watermarks).await.unwrap();
        let wm = watermarks.get(StreamKind::StartMinting);
        assert_eq!(wm.timestamp, ts(when));
        assert_eq!(wm.last_event_id, "10-3");
    }

    #[tokio::test]
    async fn watermark_is_monotonic_across_cycles() {
        let first = EventBatches {
            end_minting: vec![EndMintingEvent {
                id: "10-4".into(),
                deposit_id_is_token_id: "7".into(),
                db_write_timestamp: ts("2024-09-10T00:00:01"),
                creator: "0xuser".into(),
                ustc_plus_amount: "0".into(),
            }],
            ..Default::default()
        };
        let second = EventBatches {
            end_minting: vec![EndMintingEvent {
                id: "10-5".into(),
                deposit_id_is_token_id: "8".into(),
                db_write_timestamp: ts("2024-09-10T00:00:02"),
                creator: "0xuser".into(),
                ustc_plus_amount: "0".into(),
            }],
            ..Default::default()
        };
        let (svc, _) = service(vec![Ok(first), Ok(second)], FakeProcessors::default());
        let mut watermarks = svc.load_watermarks().await.unwrap();

        svc.run_cycle(&mut watermarks).await.unwrap();
        let after_first = watermarks.get(StreamKind::EndMinting).clone();
        svc.run_cycle(&mut watermarks).await.unwrap();
        let after_second = watermarks.get(StreamKind::EndMinting).clone();

        assert!(Watermark::initial().precedes(&after_first));
        assert!(after_first.precedes(&after_second));
    }
}
