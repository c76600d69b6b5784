#![forbid(unsafe_code)]

//! Tutoring engine core (headless).
//!
//! Design goals:
//! - deterministic, testable text transformations (the diagram sanitizer is a
//!   pure function of its input and options)
//! - no I/O and no async: networking lives in `mastery-client`, file handling
//!   in the CLI
//! - configuration as explicit parameters, never module-level state

pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod glossary;
pub mod lesson;
pub mod preprocess;
pub mod sanitize;
pub mod session;

pub use config::{MasteryConfig, SanitizeOptions};
pub use detect::{Detector, DetectorRegistry, Direction};
pub use error::{Error, Result};
pub use export::{ExportFormat, export_session};
pub use glossary::{Glossary, GlossaryItem};
pub use lesson::Lesson;
pub use preprocess::{PreprocessResult, preprocess_diagram};
pub use sanitize::sanitize_diagram;
pub use session::{Attachment, Message, Role, Session};

#[cfg(test)]
mod tests;
