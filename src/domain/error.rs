use thiserror::Error;

/// Rating text that is not one of the five canonical levels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid rating {0:?}: expected one of \"0\", \"0.25\", \"0.5\", \"0.75\", \"1\"")]
pub struct InvalidRating(pub String);

/// Text that cannot be carried as a word. Words end up as single lines in
/// the output files, so line breaks and other control characters are refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidWord {
    #[error("word must contain at least one non-whitespace character")]
    Empty,
    #[error("word must not contain control characters")]
    ControlCharacter,
}
