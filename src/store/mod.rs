//! Durable storage of the raw word list in Postgres.

pub mod postgres;

pub use postgres::PgWordStore;

use crate::wordlist::{self, WordListError};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    WordList(#[from] WordListError),
}

/// A row of the `word` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRecord {
    pub id: i32,
    pub word: String,
    pub part_of_speech: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn create_word(&self, word: &str) -> Result<WordRecord, StoreError>;

    async fn get_word(&self, id: i32) -> Result<Option<String>, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub failed: usize,
}

/// Inserts every word of the list at `path`. A failed insert is logged and
/// counted; the remaining words are still attempted.
pub async fn populate_from_file(
    store: &dyn WordStore,
    path: &Path,
) -> Result<SeedSummary, StoreError> {
    let words = wordlist::read_words(path).await?;
    let mut summary = SeedSummary::default();

    for word in &words {
        match store.create_word(word.as_str()).await {
            Ok(record) => {
                summary.inserted += 1;
                tracing::debug!(id = record.id, word = %record.word, "inserted word");
            }
            Err(e) => {
                summary.failed += 1;
                warn!(word = %word, error = %e, "failed to insert word");
            }
        }
    }

    info!(
        path = %path.display(),
        inserted = summary.inserted,
        failed = summary.failed,
        "word store populated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn record(id: i32, word: &str) -> WordRecord {
        WordRecord {
            id,
            word: word.to_string(),
            part_of_speech: None,
        }
    }

    #[tokio::test]
    async fn populate_inserts_each_word_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("funWords.txt");
        std::fs::write(&path, "flow\n\ncipher\n").unwrap();

        let mut store = MockWordStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_create_word()
            .with(eq("flow"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|w| Ok(record(1, w)));
        store
            .expect_create_word()
            .with(eq("cipher"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|w| Ok(record(2, w)));

        let summary = populate_from_file(&store, &path).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                inserted: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn failed_insert_does_not_stop_seeding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("funWords.txt");
        std::fs::write(&path, "flow\nbroken\ncipher\n").unwrap();

        let mut store = MockWordStore::new();
        store
            .expect_create_word()
            .with(eq("broken"))
            .returning(|_| Err(StoreError::Database(sqlx::Error::RowNotFound)));
        store
            .expect_create_word()
            .withf(|w| w != "broken")
            .returning(|w| Ok(record(7, w)));

        let summary = populate_from_file(&store, &path).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn unreadable_list_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = MockWordStore::new();
        let err = populate_from_file(&store, &dir.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::WordList(_)));
    }
}
