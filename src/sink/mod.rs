//! Durable destinations for rated words.
//!
//! Every record is written, flushed and `sync_data`'d before the next one is
//! attempted, so a crash loses at most the record in flight. Destinations are
//! opened once per run, each behind its own async mutex, and closed by
//! [`ResultSink::close`].

pub mod bucketed;
pub mod flat;

pub use bucketed::BucketedSink;
pub use flat::FlatLogSink;

use crate::domain::RatedWord;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sink is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One file, one `<word> (Rating: <key>)` line per record.
    #[default]
    Flat,
    /// One file per rating level, containing bare words.
    Bucketed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub written: usize,
    /// Records that reached no destination.
    pub rejected: usize,
    /// Destinations that failed during this write and will take no more records.
    pub broken: Vec<PathBuf>,
}

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn write(&self, words: &[RatedWord]) -> Result<WriteOutcome, SinkError>;

    /// Flushes and releases every destination. Later writes fail with
    /// [`SinkError::Closed`].
    async fn close(&self) -> Result<(), SinkError>;
}

/// Opens the sink for `mode` under `dir`, creating the directory if needed.
pub async fn open(mode: OutputMode, dir: &Path) -> Result<Arc<dyn ResultSink>, SinkError> {
    let sink: Arc<dyn ResultSink> = match mode {
        OutputMode::Flat => Arc::new(FlatLogSink::open(dir).await?),
        OutputMode::Bucketed => Arc::new(BucketedSink::open(dir).await?),
    };
    Ok(sink)
}

pub(crate) async fn ensure_dir(dir: &Path) -> Result<(), SinkError> {
    fs::create_dir_all(dir).await.map_err(|source| SinkError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

enum DestinationState {
    Open(File),
    Broken,
    Closed,
}

/// One append-only output file.
pub(crate) struct Destination {
    path: PathBuf,
    state: Mutex<DestinationState>,
}

pub(crate) enum AppendError {
    /// The destination failed earlier and takes no more records.
    Broken,
    Closed,
    Io(io::Error),
}

impl Destination {
    pub(crate) async fn open(path: PathBuf) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| SinkError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "opened output destination");
        Ok(Self {
            path,
            state: Mutex::new(DestinationState::Open(file)),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line and waits until it is on disk. An IO failure marks
    /// the destination broken.
    pub(crate) async fn append_line(&self, line: &str) -> Result<(), AppendError> {
        let mut state = self.state.lock().await;
        let file = match &mut *state {
            DestinationState::Open(file) => file,
            DestinationState::Broken => return Err(AppendError::Broken),
            DestinationState::Closed => return Err(AppendError::Closed),
        };

        let result = async {
            file.write_all(line.as_bytes()).await?;
            file.write_all(b"\n").await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = result {
            *state = DestinationState::Broken;
            return Err(AppendError::Io(e));
        }
        Ok(())
    }

    pub(crate) async fn close(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, DestinationState::Closed);
        if let DestinationState::Open(mut file) = previous {
            file.flush().await.map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })?;
            file.sync_all().await.map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
