//! Error types and utilities for the velograph toolkit
//!
//! The library reports three kinds of failure: malformed arguments (checked
//! eagerly at construction or call entry), malformed dataset files, and I/O
//! failures while mapping them. "No route" and "no node nearby" are ordinary
//! `Option::None` results and never show up here.

use strsim::{jaro_winkler, normalized_levenshtein};
use thiserror::Error;

/// Main error type for velograph operations
#[derive(Debug, Error)]
pub enum Error {
    /// An argument violated a documented precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A dataset file does not have the expected layout
    #[error("Malformed data in {file}: {reason}")]
    MalformedData { file: String, reason: String },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A cancellable operation observed its cancellation flag
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn malformed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedData {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for velograph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fail with [`Error::InvalidArgument`] unless `condition` holds.
///
/// The message is built lazily so hot decode paths pay nothing on success.
#[inline]
pub fn check_argument<F, S>(condition: bool, msg: F) -> Result<()>
where
    F: FnOnce() -> S,
    S: Into<String>,
{
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidArgument(msg().into()))
    }
}

/// Suggest the closest known name for a mistyped identifier.
///
/// Scores candidates with 70% Jaro-Winkler + 30% normalized Levenshtein and
/// returns the best one above 0.65, or `None` if nothing is close enough.
pub fn suggest_correction(input: &str, candidates: &[&str]) -> Option<String> {
    let input_lower = input.to_lowercase();
    let min_threshold = 0.65;

    let mut best_match = None;
    let mut best_score = 0.0f64;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        if candidate_lower == input_lower {
            return Some((*candidate).to_string());
        }

        let jw_score = jaro_winkler(&input_lower, &candidate_lower);
        let lev_score = normalized_levenshtein(&input_lower, &candidate_lower);
        let score = (jw_score * 0.7) + (lev_score * 0.3);

        if score > best_score {
            best_score = score;
            best_match = Some((*candidate).to_string());
        }
    }

    if best_score >= min_threshold {
        best_match
    } else {
        None
    }
}
