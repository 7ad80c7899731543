//! # Processing Worker
//!
//! Background completion of ingested documents and messages. Intake handlers
//! create a record in `processing` state and submit a [`ProcessingJob`] through
//! the [`ProcessingQueue`]. The [`ProcessingWorker`] waits the configured delay
//! for each job, runs the [`Extractor`], and marks the record `completed`, or
//! `error` when extraction fails. Failures are terminal; nothing is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ProcessingConfig;
use crate::db::{MemoryStore, SharedStore};
use crate::models::{
    DocumentPatch, DocumentStatus, EntityId, ProcessingStatus, WhatsappMessagePatch,
};
use crate::repositories::{DocumentRepository, WhatsappMessageRepository};

pub mod extractor;

pub use extractor::{Extraction, ExtractionError, Extractor, MockExtractor};

/// Unit of background work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingJob {
    Document { id: EntityId },
    WhatsappMessage { id: EntityId },
}

impl ProcessingJob {
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingJob::Document { .. } => "document",
            ProcessingJob::WhatsappMessage { .. } => "whatsapp_message",
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            ProcessingJob::Document { id } | ProcessingJob::WhatsappMessage { id } => *id,
        }
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Completed,
    Failed,
    /// The record no longer exists
    Missing,
}

impl ProcessingOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            ProcessingOutcome::Completed => "completed",
            ProcessingOutcome::Failed => "failed",
            ProcessingOutcome::Missing => "missing",
        }
    }
}

/// Submission handle held by the HTTP layer.
#[derive(Clone)]
pub struct ProcessingQueue {
    sender: mpsc::Sender<ProcessingJob>,
    store: SharedStore,
}

impl ProcessingQueue {
    /// Creates the queue and the receiving end consumed by [`ProcessingWorker::run`].
    pub fn channel(
        capacity: usize,
        store: SharedStore,
    ) -> (Self, mpsc::Receiver<ProcessingJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, store }, receiver)
    }

    /// Enqueues a job without waiting.
    ///
    /// When the queue is full or the worker has stopped, the record is marked
    /// `error` right away.
    pub async fn submit(&self, job: ProcessingJob) {
        match self.sender.try_send(job) {
            Ok(()) => {
                counter!("processing_jobs_submitted_total", "kind" => job.kind()).increment(1);
                debug!(kind = job.kind(), id = job.id(), "Queued processing job");
            }
            Err(TrySendError::Full(job)) | Err(TrySendError::Closed(job)) => {
                counter!("processing_jobs_rejected_total", "kind" => job.kind()).increment(1);
                warn!(
                    kind = job.kind(),
                    id = job.id(),
                    "Processing queue unavailable; marking record as error"
                );
                mark_failed(&self.store, job).await;
            }
        }
    }
}

/// Background worker completing queued jobs.
#[derive(Clone)]
pub struct ProcessingWorker {
    store: SharedStore,
    extractor: Arc<dyn Extractor>,
    config: ProcessingConfig,
}

impl ProcessingWorker {
    pub fn new(store: SharedStore, extractor: Arc<dyn Extractor>, config: ProcessingConfig) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    /// Consume jobs until the shutdown token fires or every queue handle is dropped.
    ///
    /// Each job waits out its delay in its own task. Jobs still waiting when
    /// shutdown fires are dropped and their records stay in `processing`.
    #[instrument(skip_all)]
    pub async fn run(self, mut jobs: mpsc::Receiver<ProcessingJob>, shutdown: CancellationToken) {
        info!(
            document_delay_ms = self.config.document_delay_ms,
            message_delay_ms = self.config.message_delay_ms,
            "Starting processing worker"
        );
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Processing worker shutdown requested");
                    break;
                }
                job = jobs.recv() => {
                    let Some(job) = job else {
                        debug!("Processing queue closed");
                        break;
                    };
                    let worker = self.clone();
                    let shutdown = shutdown.clone();
                    in_flight.spawn(async move { worker.run_delayed(job, shutdown).await });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        error!(error = ?err, "Processing task panicked");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                error!(error = ?err, "Processing task panicked");
            }
        }
        info!("Processing worker stopped");
    }

    fn delay_for(&self, job: &ProcessingJob) -> Duration {
        match job {
            ProcessingJob::Document { .. } => self.config.document_delay(),
            ProcessingJob::WhatsappMessage { .. } => self.config.message_delay(),
        }
    }

    async fn run_delayed(&self, job: ProcessingJob, shutdown: CancellationToken) {
        tokio::select! {
            _ = shutdown.cancelled() => {
                counter!("processing_jobs_cancelled_total", "kind" => job.kind()).increment(1);
                debug!(kind = job.kind(), id = job.id(), "Dropped pending job on shutdown");
            }
            _ = sleep(self.delay_for(&job)) => {
                self.process(job).await;
            }
        }
    }

    /// Run one job immediately, without its delay.
    pub async fn process(&self, job: ProcessingJob) -> ProcessingOutcome {
        let started = Instant::now();
        let outcome = match job {
            ProcessingJob::Document { id } => self.process_document(id).await,
            ProcessingJob::WhatsappMessage { id } => self.process_message(id).await,
        };

        histogram!("processing_job_duration_ms", "kind" => job.kind())
            .record(started.elapsed().as_secs_f64() * 1_000.0);
        counter!(
            "processing_jobs_total",
            "kind" => job.kind(),
            "outcome" => outcome.as_str()
        )
        .increment(1);

        outcome
    }

    async fn process_document(&self, id: EntityId) -> ProcessingOutcome {
        let repo = DocumentRepository::new(&self.store);
        let Some(document) = repo.get_document(id).await else {
            warn!(document_id = id, "Document disappeared before processing");
            return ProcessingOutcome::Missing;
        };

        let extraction = match self.extractor.extract_document(&document).await {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!(document_id = id, error = %err, "Document extraction failed");
                return self.fail(ProcessingJob::Document { id }).await;
            }
        };

        let patch = DocumentPatch {
            processing_status: Some(Some(DocumentStatus::Completed)),
            extracted_text: Some(extraction.text),
            extracted_data: Some(Some(extraction.data)),
            confidence: Some(Some(extraction.confidence)),
            ..Default::default()
        };

        match repo.update_document(id, patch).await {
            Ok(Some(_)) => {
                info!(document_id = id, "Document processed");
                ProcessingOutcome::Completed
            }
            Ok(None) => ProcessingOutcome::Missing,
            Err(err) => {
                warn!(document_id = id, error = %err, "Rejected extraction result");
                self.fail(ProcessingJob::Document { id }).await
            }
        }
    }

    async fn process_message(&self, id: EntityId) -> ProcessingOutcome {
        let repo = WhatsappMessageRepository::new(&self.store);
        let Some(message) = repo.get_whatsapp_message(id).await else {
            warn!(message_id = id, "Message disappeared before processing");
            return ProcessingOutcome::Missing;
        };

        let extraction = match self.extractor.extract_message(&message).await {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!(message_id = id, error = %err, "Message extraction failed");
                return self.fail(ProcessingJob::WhatsappMessage { id }).await;
            }
        };

        let patch = WhatsappMessagePatch {
            processing_status: Some(Some(ProcessingStatus::Completed)),
            extracted_data: Some(Some(extraction.data)),
            confidence: Some(Some(extraction.confidence)),
            ..Default::default()
        };

        match repo.update_whatsapp_message(id, patch).await {
            Ok(Some(_)) => {
                info!(message_id = id, "Message processed");
                ProcessingOutcome::Completed
            }
            Ok(None) => ProcessingOutcome::Missing,
            Err(err) => {
                warn!(message_id = id, error = %err, "Rejected extraction result");
                self.fail(ProcessingJob::WhatsappMessage { id }).await
            }
        }
    }

    async fn fail(&self, job: ProcessingJob) -> ProcessingOutcome {
        if mark_failed(&self.store, job).await {
            ProcessingOutcome::Failed
        } else {
            ProcessingOutcome::Missing
        }
    }
}

/// Sets the job's record to `error`. Returns `false` if the record is gone.
async fn mark_failed(store: &MemoryStore, job: ProcessingJob) -> bool {
    let result = match job {
        ProcessingJob::Document { id } => DocumentRepository::new(store)
            .update_document(id, DocumentPatch::failed())
            .await
            .map(|document| document.is_some()),
        ProcessingJob::WhatsappMessage { id } => WhatsappMessageRepository::new(store)
            .update_whatsapp_message(id, WhatsappMessagePatch::failed())
            .await
            .map(|message| message.is_some()),
    };

    match result {
        Ok(found) => found,
        Err(err) => {
            error!(kind = job.kind(), id = job.id(), error = %err, "Failed to record processing error");
            false
        }
    }
}
