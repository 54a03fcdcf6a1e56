//! Line-oriented word lists: reading them, and merging one into another.

use crate::domain::Word;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum WordListError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WordListError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads one word per line, trimmed, skipping blank lines. Order is kept.
pub async fn read_words(path: &Path) -> Result<Vec<Word>, WordListError> {
    let file = File::open(path).await.map_err(WordListError::io(path))?;
    let words = read_words_from(BufReader::new(file))
        .await
        .map_err(WordListError::io(path))?;
    debug!(path = %path.display(), words = words.len(), "read word list");
    Ok(words)
}

pub async fn read_words_from<R>(reader: R) -> io::Result<Vec<Word>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut words = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if let Ok(word) = Word::new(line.trim()) {
            words.push(word);
        }
    }
    Ok(words)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendSummary {
    /// Words read from the source list.
    pub read: usize,
    pub appended: usize,
    /// Source words already present in the destination or earlier in the source.
    pub duplicates: usize,
}

/// Appends the words of `src` that `dst` does not yet contain, in source
/// order. A missing `dst` is created.
pub async fn append_words(src: &Path, dst: &Path) -> Result<AppendSummary, WordListError> {
    let incoming = read_words(src).await?;

    let existing = match fs::read_to_string(dst).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(WordListError::io(dst)(e)),
    };
    let mut known: HashSet<String> = existing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let mut summary = AppendSummary {
        read: incoming.len(),
        ..AppendSummary::default()
    };

    let mut buffer = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        buffer.push('\n');
    }
    for word in incoming {
        if known.insert(word.as_str().to_string()) {
            buffer.push_str(word.as_str());
            buffer.push('\n');
            summary.appended += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    if summary.appended > 0 {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dst)
            .await
            .map_err(WordListError::io(dst))?;
        file.write_all(buffer.as_bytes())
            .await
            .map_err(WordListError::io(dst))?;
        file.flush().await.map_err(WordListError::io(dst))?;
        file.sync_data().await.map_err(WordListError::io(dst))?;
    }

    info!(
        src = %src.display(),
        dst = %dst.display(),
        read = summary.read,
        appended = summary.appended,
        duplicates = summary.duplicates,
        "merged word list"
    );
    Ok(summary)
}
