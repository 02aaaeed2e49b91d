//! Formatter Errors
//!
//! Any error here indicates a bug in the formatter or its input CST, or a
//! failing sink. Errors are accumulated during the run and surfaced once
//! at the end; the partial output remains safe to render.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    /// A writer invariant was violated (e.g. indentation underflow).
    #[error("internal error: {0}")]
    Internal(String),
    /// The output sink failed; subsequent writes are best-effort.
    #[error("sink error: {0}")]
    Sink(#[from] io::Error),
    /// Several errors accumulated over one run.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<FormatError>),
}

impl FormatError {
    /// Fold accumulated errors into one, or `None` when the run was clean.
    pub fn join(mut errors: Vec<FormatError>) -> Option<FormatError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(FormatError::Multiple(errors)),
        }
    }
}

fn join_messages(errors: &[FormatError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_of_none_is_none() {
        assert!(FormatError::join(Vec::new()).is_none());
    }

    #[test]
    fn join_of_many_lists_all() {
        let err = FormatError::join(vec![
            FormatError::Internal("one".into()),
            FormatError::Internal("two".into()),
        ])
        .unwrap();
        let text = err.to_string();
        assert!(text.contains("one") && text.contains("two"));
    }
}
