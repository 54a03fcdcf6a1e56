//! Turns untrusted response entries into rated words.
//!
//! Each entry is judged on its own: a bad rating, a missing word or a word
//! that could not be written as one line rejects that entry only. Words the service skipped, and words it returned without
//! having been asked, are counted and logged but never fail the batch.

use crate::classifier::ClassificationResponse;
use crate::domain::{InvalidRating, InvalidWord, RatedWord, RatingLevel, Word};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error(transparent)]
    InvalidRating(#[from] InvalidRating),
    #[error("entry has no usable word")]
    MissingWord,
    #[error(transparent)]
    InvalidWord(InvalidWord),
}

/// A response entry that did not survive validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub word: Option<String>,
    pub raw_rating: Option<String>,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub rated: Vec<RatedWord>,
    pub rejected: Vec<RejectedEntry>,
    /// Requested words that no entry mentioned.
    pub missing: usize,
    /// Rated entries whose word was not in the request.
    pub unexpected: usize,
}

impl ValidationReport {
    pub fn entries(&self) -> usize {
        self.rated.len() + self.rejected.len()
    }
}

pub fn validate(response: &ClassificationResponse, expected: &HashSet<Word>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(response.len());

    for entry in response.entries() {
        let word_text = entry.get("word").and_then(Value::as_str);
        if let Some(text) = word_text {
            seen.insert(text);
        }

        match validate_entry(entry) {
            Ok(rated) => {
                if !expected.contains(rated.word.as_str()) {
                    debug!(word = %rated.word, "response contains a word that was not requested");
                    report.unexpected += 1;
                }
                report.rated.push(rated);
            }
            Err(reason) => {
                warn!(
                    word = word_text.unwrap_or("<none>"),
                    error = %reason,
                    "rejected response entry"
                );
                report.rejected.push(RejectedEntry {
                    word: word_text.map(str::to_string),
                    raw_rating: raw_rating(entry),
                    reason,
                });
            }
        }
    }

    report.missing = expected
        .iter()
        .filter(|word| !seen.contains(word.as_str()))
        .count();
    if report.missing > 0 {
        warn!(
            missing = report.missing,
            requested = expected.len(),
            "response omitted requested words"
        );
    }

    report
}

fn validate_entry(entry: &Value) -> Result<RatedWord, RejectReason> {
    let text = entry
        .get("word")
        .and_then(Value::as_str)
        .ok_or(RejectReason::MissingWord)?;
    let word = Word::new(text).map_err(|e| match e {
        InvalidWord::Empty => RejectReason::MissingWord,
        other => RejectReason::InvalidWord(other),
    })?;

    let rating = match entry.get("rating") {
        Some(Value::String(text)) => RatingLevel::parse(text)?,
        Some(Value::Null) | None => return Err(InvalidRating(String::new()).into()),
        // Numbers and other shapes are never coerced onto the scale.
        Some(other) => return Err(InvalidRating(other.to_string()).into()),
    };

    Ok(RatedWord::new(word, rating))
}

fn raw_rating(entry: &Value) -> Option<String> {
    match entry.get("rating")? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
