use super::error::InvalidRating;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Integer form of a rating (level × 100), used for bucket keying and file names.
pub type BucketKey = u8;

/// Rap suitability of a word, from worst to best.
///
/// The scale is closed: text outside the five canonical forms is rejected by
/// [`RatingLevel::parse`] rather than rounded or clamped, so every bucket key
/// handed to a sink is guaranteed to be one of `0, 25, 50, 75, 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RatingLevel {
    Zero,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl RatingLevel {
    /// All levels in ascending order.
    pub const ALL: [RatingLevel; 5] = [
        RatingLevel::Zero,
        RatingLevel::Quarter,
        RatingLevel::Half,
        RatingLevel::ThreeQuarters,
        RatingLevel::Full,
    ];

    /// Parses the exact textual form returned by the generation service.
    pub fn parse(text: &str) -> Result<Self, InvalidRating> {
        match text {
            "0" => Ok(RatingLevel::Zero),
            "0.25" => Ok(RatingLevel::Quarter),
            "0.5" => Ok(RatingLevel::Half),
            "0.75" => Ok(RatingLevel::ThreeQuarters),
            "1" => Ok(RatingLevel::Full),
            other => Err(InvalidRating(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RatingLevel::Zero => "0",
            RatingLevel::Quarter => "0.25",
            RatingLevel::Half => "0.5",
            RatingLevel::ThreeQuarters => "0.75",
            RatingLevel::Full => "1",
        }
    }

    pub const fn bucket_key(self) -> BucketKey {
        match self {
            RatingLevel::Zero => 0,
            RatingLevel::Quarter => 25,
            RatingLevel::Half => 50,
            RatingLevel::ThreeQuarters => 75,
            RatingLevel::Full => 100,
        }
    }

    pub const fn from_bucket_key(key: BucketKey) -> Option<Self> {
        match key {
            0 => Some(RatingLevel::Zero),
            25 => Some(RatingLevel::Quarter),
            50 => Some(RatingLevel::Half),
            75 => Some(RatingLevel::ThreeQuarters),
            100 => Some(RatingLevel::Full),
            _ => None,
        }
    }

    /// The rating as a fraction in `[0, 1]`.
    pub fn as_fraction(self) -> f32 {
        f32::from(self.bucket_key()) / 100.0
    }
}

impl fmt::Display for RatingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingLevel {
    type Err = InvalidRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RatingLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RatingLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        RatingLevel::parse(&text).map_err(serde::de::Error::custom)
    }
}
