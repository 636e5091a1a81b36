//! Error and warning types for template parsing and binding.
//!
//! Authoring errors (`MalformedPlaceholder`, `MalformedTemplate`,
//! `AmbiguousPlaceholder`, `UnresolvedPath`) depend only on the template and
//! the target record. `NoMatch` is the only error that depends on the input text.

use serde::Serialize;
use std::fmt;

/// Error type for a failed parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Placeholder inner text is not a valid `Root.Step(:Modifier())?` path
    MalformedPlaceholder {
        placeholder: String,
        reason: String,
    },
    /// Template structure is broken (e.g. an unterminated `#{`)
    MalformedTemplate {
        offset: usize,
        reason: String,
    },
    /// Two placeholders with no literal text between them
    AmbiguousPlaceholder {
        first: String,
        second: String,
    },
    /// The template's literal skeleton does not appear in the text
    NoMatch {
        anchor: String,
    },
    /// A path step names a field the target record does not have
    UnresolvedPath {
        path: String,
        step: String,
        reason: String,
    },
}

impl ParseError {
    /// True for errors that are decided by the template and target type alone.
    pub fn is_authoring_error(&self) -> bool {
        !matches!(self, ParseError::NoMatch { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedPlaceholder { placeholder, reason } => {
                write!(f, "Malformed placeholder '#{{{}}}': {}", placeholder, reason)
            }
            ParseError::MalformedTemplate { offset, reason } => {
                write!(f, "Malformed template at byte {}: {}", offset, reason)
            }
            ParseError::AmbiguousPlaceholder { first, second } => write!(
                f,
                "Ambiguous placeholders: '{}' is followed by '{}' with no literal text between them",
                first, second
            ),
            ParseError::NoMatch { anchor } => {
                write!(f, "No match: literal anchor {:?} not found in text", anchor)
            }
            ParseError::UnresolvedPath { path, step, reason } => {
                write!(f, "Unresolved path '{}' at step '{}': {}", path, step, reason)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Non-fatal failure to coerce a captured value into its field type.
///
/// The field keeps its zero value and binding continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    pub path: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not coerce {:?} for '{}': {}",
            self.value, self.path, self.reason
        )
    }
}
