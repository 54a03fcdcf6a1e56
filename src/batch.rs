//! Splits an ordered word list into contiguous, size-bounded batches.

use crate::domain::Word;
use std::collections::HashSet;
use std::iter::FusedIterator;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Invalid configuration: batch size must be greater than 0")]
    ZeroBatchSize,
}

/// One API-call worth of words, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    words: Vec<Word>,
}

impl Batch {
    pub fn new(index: usize, words: Vec<Word>) -> Self {
        Self { index, words }
    }

    /// Zero-based position of this batch in the run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The requested words, for correlating an unordered response.
    pub fn word_set(&self) -> HashSet<Word> {
        self.words.iter().cloned().collect()
    }
}

/// Lazy, restartable sequence of batches over a borrowed word list.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    words: &'a [Word],
    batch_size: usize,
    next_index: usize,
}

/// Splits `words` into batches of at most `max_batch_size`.
///
/// Re-invoking with the same input and size always yields the same batches,
/// which is what makes resuming a run with [`Batches::skip_to`] sound.
pub fn make_batches(words: &[Word], max_batch_size: usize) -> Result<Batches<'_>, BatchError> {
    if max_batch_size == 0 {
        return Err(BatchError::ZeroBatchSize);
    }
    Ok(Batches {
        words,
        batch_size: max_batch_size,
        next_index: 0,
    })
}

impl<'a> Batches<'a> {
    /// Number of batches a full pass produces: `ceil(len / batch_size)`.
    pub fn total(&self) -> usize {
        self.words.len().div_ceil(self.batch_size)
    }

    /// Positions the sequence at `index`, skipping the batches before it.
    #[must_use]
    pub fn skip_to(mut self, index: usize) -> Self {
        self.next_index = index.min(self.total());
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_index.checked_mul(self.batch_size)?;
        if start >= self.words.len() {
            return None;
        }
        let end = (start + self.batch_size).min(self.words.len());
        let batch = Batch::new(self.next_index, self.words[start..end].to_vec());
        self.next_index += 1;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

impl FusedIterator for Batches<'_> {}
