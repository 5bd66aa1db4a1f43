// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator — one batch, one record at a time.
//
// Idle -> Preparing -> Processing(i of n) -> Finalizing -> Done | Aborted.
//
// Every record runs read -> transcode (HEIC only) -> decode -> rotate ->
// place. Each sub-step is awaited before the next begins; file reads and
// CPU-bound steps run on tokio's blocking pool, never more than one at a
// time. A failing sub-step fails only its record: the
// record adds no page and the batch moves on. Only an empty store or a batch
// with no successful record aborts.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bildwerk_core::AppConfig;
use bildwerk_core::error::{BatchError, BildwerkError, DecodeError, RecordError, Result};
use bildwerk_core::types::{
    BatchId, BatchPhase, ByteSource, ImageRecord, PlatformProfile, ProcessingStatus, RecordId,
    Rotation, Stage,
};
use bildwerk_document::layout::{self, PageSpec};
use bildwerk_document::{
    PdfAssembler, PreparedPage, RasterSurface, SafeDecoder, TranscoderAdapter, rotate,
    suggested_filename,
};
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::order::resolve;
use crate::progress::{ProgressBus, ProgressEvent, percent_done};
use crate::store::{ImageStore, OrderState};

/// Terminal status of one record in a finished batch.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub id: RecordId,
    pub name: String,
    pub status: ProcessingStatus,
    /// The failure, for records whose status is `Failed`.
    pub error: Option<RecordError>,
}

impl RecordOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Result of a batch that produced a document.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: BatchId,
    /// Serialised PDF.
    pub document: Vec<u8>,
    /// `images_<unix-millis>.pdf`
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub page_count: usize,
    /// One entry per record, in processing order.
    pub outcomes: Vec<RecordOutcome>,
    /// Order that was applied.
    pub order: OrderState,
    /// True when an explicit order had to be discarded.
    pub order_fell_back: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RecordOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Runs batches against an `ImageStore`.
pub struct Pipeline {
    decoder: Arc<SafeDecoder>,
    transcoder: TranscoderAdapter,
    page: PageSpec,
    step_timeout: Option<Duration>,
    bus: ProgressBus,
}

impl Pipeline {
    /// Build a pipeline from settings and the platform's decoder limits.
    pub fn new(config: &AppConfig, profile: PlatformProfile, transcoder: TranscoderAdapter) -> Self {
        Self {
            decoder: Arc::new(SafeDecoder::for_profile(profile, config.max_dimension)),
            transcoder,
            page: PageSpec::from_config(config),
            step_timeout: config.step_timeout_secs.map(Duration::from_secs),
            bus: ProgressBus::new(),
        }
    }

    /// Replace the decoder (custom strategy lists).
    pub fn with_decoder(mut self, decoder: SafeDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    pub fn with_progress(mut self, bus: ProgressBus) -> Self {
        self.bus = bus;
        self
    }

    /// Give up on any single sub-step that runs longer than `limit`.
    pub fn with_step_timeout(mut self, limit: Duration) -> Self {
        self.step_timeout = Some(limit);
        self
    }

    pub fn page_spec(&self) -> &PageSpec {
        &self.page
    }

    /// Convert every record in `store` into one PDF.
    ///
    /// The store is locked for the whole run and unlocked again on return,
    /// whether the batch succeeded or not.
    #[instrument(skip_all, fields(records = store.len()))]
    pub async fn run(&self, store: &ImageStore) -> Result<BatchReport> {
        let batch_id = BatchId::new();
        self.phase(batch_id, BatchPhase::Preparing);

        if store.is_empty() {
            warn!(%batch_id, "nothing to convert");
            self.phase(batch_id, BatchPhase::Aborted);
            return Err(BatchError::EmptyBatch.into());
        }

        let _lease = store.lease()?;
        let resolution = resolve(store);
        let total = resolution.records.len();
        info!(%batch_id, total, order = ?resolution.state_used, "batch started");

        let mut assembler = PdfAssembler::new();
        let mut outcomes = Vec::with_capacity(total);
        // One sub-step in flight, including a worker abandoned by a timeout.
        let worker = Arc::new(Semaphore::new(1));

        for (index, record) in resolution.records.iter().enumerate() {
            self.phase(batch_id, BatchPhase::Processing { index, total });

            let result = self.process_record(record, index, total, &worker).await;
            let (status, error) = match result {
                Ok(page) => {
                    assembler.append(page);
                    (ProcessingStatus::Success, None)
                }
                Err(err) => {
                    warn!(record = %record.name, error = %err, "record failed");
                    (ProcessingStatus::Failed(err.to_string()), Some(err))
                }
            };

            self.bus.publish(ProgressEvent::Finished {
                name: record.name.clone(),
                status: status.clone(),
                index,
                total,
                percent: percent_done(index, total),
            });
            outcomes.push(RecordOutcome {
                id: record.id.clone(),
                name: record.name.clone(),
                status,
                error,
            });
        }

        // Nothing may still be running once the batch returns.
        drop(worker.acquire().await);

        let page_count = assembler.page_count();
        if page_count == 0 {
            warn!(%batch_id, total, "no record could be converted");
            self.phase(batch_id, BatchPhase::Aborted);
            return Err(BatchError::NoImagesProcessed.into());
        }

        self.phase(batch_id, BatchPhase::Finalizing);
        let created_at = Utc::now();
        let document = match tokio::task::spawn_blocking(move || assembler.finish()).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(err)) => {
                self.phase(batch_id, BatchPhase::Aborted);
                return Err(err);
            }
            Err(join_err) => {
                self.phase(batch_id, BatchPhase::Aborted);
                return Err(BildwerkError::PdfError(format!(
                    "document serialisation task failed: {join_err}"
                )));
            }
        };

        self.phase(batch_id, BatchPhase::Done);
        info!(
            %batch_id,
            pages = page_count,
            failed = total - page_count,
            bytes = document.len(),
            "batch complete"
        );

        Ok(BatchReport {
            batch_id,
            document,
            filename: suggested_filename(created_at),
            created_at,
            page_count,
            outcomes,
            order: resolution.state_used,
            order_fell_back: resolution.fell_back,
        })
    }

    // -- Per-record steps -----------------------------------------------------

    async fn process_record(
        &self,
        record: &ImageRecord,
        index: usize,
        total: usize,
        worker: &Arc<Semaphore>,
    ) -> std::result::Result<PreparedPage, RecordError> {
        let stage = |stage: Stage| {
            self.bus.publish(ProgressEvent::Stage {
                name: record.name.clone(),
                stage,
                index,
                total,
                percent: percent_done(index, total),
            });
        };

        stage(Stage::Reading);
        let mut bytes: Arc<[u8]> = match &record.source {
            ByteSource::Memory(bytes) => Arc::clone(bytes),
            ByteSource::File(path) => {
                let path = path.clone();
                self.offload(Stage::Reading, worker, move || read_file(&path))
                    .await?
            }
        };

        if record.kind.needs_transcode() {
            stage(Stage::Transcoding);
            let transcoder = self.transcoder.clone();
            let jpeg = self
                .offload(Stage::Transcoding, worker, move || {
                    Ok(transcoder.transcode(&bytes)?)
                })
                .await?;
            bytes = jpeg.into();
        }

        stage(Stage::Decoding);
        let decoder = Arc::clone(&self.decoder);
        let mut surface = self
            .offload(Stage::Decoding, worker, move || Ok(decoder.decode(&bytes)?))
            .await?;

        if record.rotation != Rotation::Deg0 {
            stage(Stage::Rotating);
            let rotation = record.rotation;
            surface = self
                .offload(Stage::Rotating, worker, move || rotate(surface, rotation))
                .await?;
        }

        stage(Stage::Placing);
        let page = self.page;
        let prepared = self
            .offload(Stage::Placing, worker, move || place(&page, &surface))
            .await?;

        debug!(
            record = %record.name,
            w_mm = prepared.geometry().image_width_mm,
            h_mm = prepared.geometry().image_height_mm,
            "record placed"
        );
        Ok(prepared)
    }

    /// Run one sub-step on the blocking pool, bounded by the step timeout if
    /// one is set.
    ///
    /// A blocking thread cannot be cancelled. When a step times out its
    /// worker is abandoned but keeps the single `worker` permit until it
    /// returns, so the next step waits for it before starting. The wait is
    /// not counted against the next step's timeout.
    async fn offload<T, F>(
        &self,
        stage: Stage,
        worker: &Arc<Semaphore>,
        work: F,
    ) -> std::result::Result<T, RecordError>
    where
        T: Send + 'static,
        F: FnOnce() -> std::result::Result<T, RecordError> + Send + 'static,
    {
        let permit = Arc::clone(worker)
            .acquire_owned()
            .await
            .map_err(|err| RecordError::Internal(format!("worker slot closed: {err}")))?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });
        let joined = async {
            handle
                .await
                .map_err(|err| RecordError::Internal(format!("worker task failed: {err}")))
                .and_then(|result| result)
        };

        match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, joined).await.map_err(|_| {
                warn!(%stage, secs = limit.as_secs_f32(), "step timed out, worker abandoned");
                RecordError::TimedOut {
                    stage,
                    secs: limit.as_secs(),
                }
            })?,
            None => joined.await,
        }
    }

    fn phase(&self, batch: BatchId, phase: BatchPhase) {
        self.bus.publish(ProgressEvent::Phase { batch, phase });
    }
}

fn read_file(path: &Path) -> std::result::Result<Arc<[u8]>, RecordError> {
    let bytes = std::fs::read(path)
        .map_err(|err| DecodeError::ReadFailed(format!("{}: {}", path.display(), err)))?;
    Ok(bytes.into())
}

fn place(page: &PageSpec, surface: &RasterSurface) -> std::result::Result<PreparedPage, RecordError> {
    let geometry = layout::fit(page, surface.width(), surface.height())?;
    PreparedPage::new(surface, geometry)
}
