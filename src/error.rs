//! Error types for request dispatch

use thiserror::Error;

/// Failures that abort a turn instead of producing a response
///
/// Absent or malformed slot values are not errors; the handlers recover
/// those locally with re-prompts.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An intent name outside the skill's interaction model reached dispatch
    #[error("unsupported intent: {0}")]
    UnsupportedIntent(String),

    /// The envelope came from a different application than the one configured
    #[error("application id mismatch: {0}")]
    ApplicationIdMismatch(String),
}
