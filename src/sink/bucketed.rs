use super::{AppendError, Destination, ResultSink, SinkError, WriteOutcome, ensure_dir};
use crate::domain::{BucketKey, RatedWord, RatingLevel};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

pub fn bucket_file_name(key: BucketKey) -> String {
    format!("words_{key}.txt")
}

/// One file per rating level, each holding bare words.
///
/// A failing destination is marked broken and skipped for the rest of the
/// run while the other buckets keep receiving records.
pub struct BucketedSink {
    destinations: BTreeMap<BucketKey, Destination>,
}

impl BucketedSink {
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        ensure_dir(dir).await?;
        let mut destinations = BTreeMap::new();
        for level in RatingLevel::ALL {
            let key = level.bucket_key();
            let destination = Destination::open(dir.join(bucket_file_name(key))).await?;
            destinations.insert(key, destination);
        }
        Ok(Self { destinations })
    }

    pub(crate) fn from_destinations(destinations: BTreeMap<BucketKey, Destination>) -> Self {
        Self { destinations }
    }

    pub fn paths(&self) -> impl Iterator<Item = (BucketKey, &Path)> {
        self.destinations
            .iter()
            .map(|(key, destination)| (*key, destination.path()))
    }
}

#[async_trait]
impl ResultSink for BucketedSink {
    async fn write(&self, words: &[RatedWord]) -> Result<WriteOutcome, SinkError> {
        let mut outcome = WriteOutcome::default();
        for rated in words {
            let key = rated.bucket_key();
            let Some(destination) = self.destinations.get(&key) else {
                warn!(word = %rated.word, bucket = key, "no destination for bucket, record dropped");
                outcome.rejected += 1;
                continue;
            };

            match destination.append_line(rated.word.as_str()).await {
                Ok(()) => outcome.written += 1,
                Err(AppendError::Broken) => outcome.rejected += 1,
                Err(AppendError::Closed) => return Err(SinkError::Closed),
                Err(AppendError::Io(e)) => {
                    error!(
                        path = %destination.path().display(),
                        bucket = key,
                        error = %e,
                        "bucket destination failed, disabling it for the rest of the run"
                    );
                    outcome.rejected += 1;
                    outcome.broken.push(PathBuf::from(destination.path()));
                }
            }
        }
        Ok(outcome)
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut first_error = None;
        for destination in self.destinations.values() {
            if let Err(e) = destination.close().await {
                error!(error = %e, "failed to close bucket destination");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
