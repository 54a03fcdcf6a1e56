#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Bucket keys and batch indices are small
    clippy::cast_precision_loss,      // Acceptable for display
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. SinkError in sink module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod batch;
pub mod classifier;
pub mod domain;
pub mod pipeline;
pub mod reliability;
pub(crate) mod schema;
pub mod sink;
pub mod store;
pub mod validation;
pub mod wordlist;

// Re-export main types for easy access
pub use app::Config;
pub use domain::{RatedWord, RatingLevel, Word};
pub use pipeline::{Pipeline, PipelineOptions, Summary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
