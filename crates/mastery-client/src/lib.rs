#![forbid(unsafe_code)]

//! Networking side of the Mastery tutoring engine.
//!
//! - [`TutorClient`]: chat-completions client for an Anthropic-style
//!   messages API
//! - [`with_retry`]: exponential backoff around a fallible async operation,
//!   retrying only transient failures (429 / 5xx / transport)
//! - [`Tutor`]: orchestration — question in, structured [`mastery_core::Lesson`]
//!   out, with the diagram already sanitized

pub mod api;
pub mod error;
pub mod retry;
pub mod tutor;

pub use api::{ChatMessage, TutorClient};
pub use error::{Error, Result};
pub use retry::{Retryable, RetryConfig, with_retry};
pub use tutor::Tutor;

#[cfg(test)]
mod tests;
