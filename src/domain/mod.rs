//! Domain layer for lexicon-rater.
//!
//! Contains the canonical types shared across all modules:
//! - `Word`: a non-empty, single-line input token, preserved exactly as read
//! - `RatingLevel`: the closed five-level rap suitability scale
//! - `RatedWord`: a word paired with a validated rating

pub mod error;
pub mod rating;
pub mod word;

pub use error::{InvalidRating, InvalidWord};
pub use rating::{BucketKey, RatingLevel};
pub use word::{RatedWord, Word};
