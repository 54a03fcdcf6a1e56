pub mod retry;

pub use retry::{RetryConfig, is_retryable_error, is_retryable_status};
