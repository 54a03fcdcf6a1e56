use super::{AppendError, Destination, ResultSink, SinkError, WriteOutcome, ensure_dir};
use crate::domain::RatedWord;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tracing::error;

pub const FLAT_FILE_NAME: &str = "all_rated_words.txt";

/// Single-file sink. Any IO failure is returned to the caller, which treats
/// it as fatal for the run.
pub struct FlatLogSink {
    destination: Destination,
}

impl FlatLogSink {
    pub async fn open(dir: &Path) -> Result<Self, SinkError> {
        ensure_dir(dir).await?;
        Self::open_file(dir.join(FLAT_FILE_NAME)).await
    }

    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self {
            destination: Destination::open(path.as_ref().to_path_buf()).await?,
        })
    }

    pub fn path(&self) -> &Path {
        self.destination.path()
    }
}

pub fn format_line(rated: &RatedWord) -> String {
    format!("{} (Rating: {})", rated.word, rated.bucket_key())
}

#[async_trait]
impl ResultSink for FlatLogSink {
    async fn write(&self, words: &[RatedWord]) -> Result<WriteOutcome, SinkError> {
        let mut outcome = WriteOutcome::default();
        for rated in words {
            match self.destination.append_line(&format_line(rated)).await {
                Ok(()) => outcome.written += 1,
                Err(AppendError::Closed) => return Err(SinkError::Closed),
                Err(AppendError::Io(source)) => {
                    error!(path = %self.path().display(), error = %source, "flat output write failed");
                    return Err(SinkError::Io {
                        path: self.path().to_path_buf(),
                        source,
                    });
                }
                Err(AppendError::Broken) => {
                    return Err(SinkError::Io {
                        path: self.path().to_path_buf(),
                        source: io::Error::other("destination failed on an earlier write"),
                    });
                }
            }
        }
        Ok(outcome)
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.destination.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RatingLevel, Word};
    use tempfile::TempDir;

    fn rated(word: &str, rating: RatingLevel) -> RatedWord {
        RatedWord::new(Word::new(word).unwrap(), rating)
    }

    #[test]
    fn line_format_uses_bucket_key() {
        assert_eq!(
            format_line(&rated("magnificent", RatingLevel::Full)),
            "magnificent (Rating: 100)"
        );
        assert_eq!(
            format_line(&rated("photosynthesis", RatingLevel::Quarter)),
            "photosynthesis (Rating: 25)"
        );
    }

    #[tokio::test]
    async fn write_appends_every_record_in_order() {
        let dir = TempDir::new().unwrap();
        let sink = FlatLogSink::open(dir.path()).await.unwrap();

        let outcome = sink
            .write(&[rated("the", RatingLevel::Zero), rated("flow", RatingLevel::Full)])
            .await
            .unwrap();
        assert_eq!(outcome.written, 2);
        assert_eq!(outcome.rejected, 0);
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(dir.path().join(FLAT_FILE_NAME)).unwrap();
        assert_eq!(contents, "the (Rating: 0)\nflow (Rating: 100)\n");
    }

    #[tokio::test]
    async fn write_after_close_is_an_error() {
        let dir = TempDir::new().unwrap();
        let sink = FlatLogSink::open(dir.path()).await.unwrap();
        sink.close().await.unwrap();
        let err = sink.write(&[rated("late", RatingLevel::Half)]).await.unwrap_err();
        assert!(matches!(err, SinkError::Closed));
    }

    #[tokio::test]
    async fn unopenable_destination_is_reported() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let err = FlatLogSink::open_file(dir.path()).await.err().unwrap();
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
