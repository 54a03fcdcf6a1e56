//! Drives a run: batch → classify → validate → write.
//!
//! A batch whose classification fails is recorded and skipped; only
//! configuration problems and fatal sink errors stop the run.

use crate::batch::{Batch, BatchError, make_batches};
use crate::classifier::{Classifier, ClassifyError, ServiceError};
use crate::domain::Word;
use crate::sink::{ResultSink, SinkError, WriteOutcome};
use crate::validation::{ValidationReport, validate};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("classifier unusable: {0}")]
    Classifier(#[source] ClassifyError),
    #[error("output failed: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound on batches in flight at once.
    pub concurrency: NonZeroUsize,
    /// Index of the first batch to process; earlier batches are skipped.
    pub start_batch: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
            start_batch: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub batch: usize,
    pub error: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub batches_total: usize,
    pub batches_skipped: usize,
    pub batches_completed: usize,
    pub batches_failed: usize,
    pub words_rated: usize,
    pub words_rejected: usize,
    pub words_missing: usize,
    pub words_unexpected: usize,
    /// Validated words that no destination accepted.
    pub words_unwritten: usize,
    pub sink_failures: usize,
    pub cancelled: bool,
    pub failures: Vec<BatchFailure>,
}

impl Summary {
    /// Batches neither completed nor failed because the run stopped early.
    pub fn batches_not_run(&self) -> usize {
        self.batches_total
            .saturating_sub(self.batches_skipped + self.batches_completed + self.batches_failed)
    }

    fn record(&mut self, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Completed { report, written } => {
                self.batches_completed += 1;
                self.words_rated += written.written;
                self.words_rejected += report.rejected.len();
                self.words_missing += report.missing;
                self.words_unexpected += report.unexpected;
                self.words_unwritten += written.rejected;
                self.sink_failures += written.broken.len();
            }
            BatchOutcome::Failed { index, error } => {
                self.batches_failed += 1;
                self.failures.push(BatchFailure {
                    batch: index,
                    error,
                });
            }
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "batches: {} total, {} completed, {} failed, {} skipped, {} not run{}",
            self.batches_total,
            self.batches_completed,
            self.batches_failed,
            self.batches_skipped,
            self.batches_not_run(),
            if self.cancelled { " (cancelled)" } else { "" }
        )?;
        write!(
            f,
            "words: {} rated, {} rejected, {} missing, {} unexpected, {} unwritten; {} sink failures",
            self.words_rated,
            self.words_rejected,
            self.words_missing,
            self.words_unexpected,
            self.words_unwritten,
            self.sink_failures
        )?;
        for failure in &self.failures {
            write!(f, "\n  batch {} failed: {}", failure.batch, failure.error)?;
        }
        Ok(())
    }
}

enum BatchOutcome {
    Completed {
        report: ValidationReport,
        written: WriteOutcome,
    },
    Failed {
        index: usize,
        error: String,
    },
}

pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn ResultSink>,
    options: PipelineOptions,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn ResultSink>,
        options: PipelineOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            classifier,
            sink,
            options,
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Rates `words` in batches of at most `max_batch_size`.
    ///
    /// Output order across batches is unspecified when more than one batch
    /// is in flight. Cancelling the token stops new batches from starting;
    /// batches already in flight are abandoned and counted as failed.
    pub async fn run(&self, words: &[Word], max_batch_size: usize) -> Result<Summary, PipelineError> {
        let batches = make_batches(words, max_batch_size)?;
        let total = batches.total();
        let batches = batches.skip_to(self.options.start_batch);

        let mut summary = Summary {
            batches_total: total,
            batches_skipped: self.options.start_batch.min(total),
            ..Summary::default()
        };

        info!(
            words = words.len(),
            batch_size = max_batch_size,
            batches = total,
            start_batch = self.options.start_batch,
            concurrency = self.options.concurrency.get(),
            "starting rating run"
        );
        let started = Instant::now();

        let mut outcomes = std::pin::pin!(
            stream::iter(batches)
                .take_until(self.cancel.cancelled())
                .map(|batch| self.process_batch(batch))
                .buffer_unordered(self.options.concurrency.get())
        );

        while let Some(outcome) = outcomes.next().await {
            summary.record(outcome?);
        }

        summary.cancelled = self.cancel.is_cancelled();
        if summary.cancelled {
            warn!(
                not_run = summary.batches_not_run(),
                "run cancelled before all batches were processed"
            );
        }
        info!(
            batches_completed = summary.batches_completed,
            batches_failed = summary.batches_failed,
            words_rated = summary.words_rated,
            words_rejected = summary.words_rejected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rating run finished"
        );

        Ok(summary)
    }

    async fn process_batch(&self, batch: Batch) -> Result<BatchOutcome, PipelineError> {
        let index = batch.index();
        let expected = batch.word_set();

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ClassifyError::Service(ServiceError::Cancelled)),
            response = self.classifier.classify(&batch) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_batch_failure() => {
                error!(batch = index, words = batch.len(), error = %e, "batch failed");
                return Ok(BatchOutcome::Failed {
                    index,
                    error: e.to_string(),
                });
            }
            Err(e) => return Err(PipelineError::Classifier(e)),
        };

        let report = validate(&response, &expected);
        let written = self.sink.write(&report.rated).await?;

        if !written.broken.is_empty() {
            let broken: Vec<&PathBuf> = written.broken.iter().collect();
            warn!(batch = index, ?broken, "output destinations failed during batch");
        }
        info!(
            batch = index,
            rated = report.rated.len(),
            rejected = report.rejected.len(),
            missing = report.missing,
            written = written.written,
            "batch written"
        );

        Ok(BatchOutcome::Completed { report, written })
    }
}
