use super::error::InvalidWord;
use super::rating::{BucketKey, RatingLevel};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A single candidate token, case and punctuation preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

impl Word {
    /// Wraps `text` unchanged. Blank text and text holding control
    /// characters (line breaks included) are refused.
    pub fn new(text: impl Into<String>) -> Result<Self, InvalidWord> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InvalidWord::Empty);
        }
        if text.chars().any(char::is_control) {
            return Err(InvalidWord::ControlCharacter);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `HashSet<Word>` be queried with `&str`.
impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Word {
    type Error = InvalidWord;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl TryFrom<&str> for Word {
    type Error = InvalidWord;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.0
    }
}

/// A word whose rating has passed validation. Only the response validator
/// produces these; sinks consume them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatedWord {
    pub word: Word,
    pub rating: RatingLevel,
}

impl RatedWord {
    pub fn new(word: Word, rating: RatingLevel) -> Self {
        Self { word, rating }
    }

    pub fn bucket_key(&self) -> BucketKey {
        self.rating.bucket_key()
    }
}
