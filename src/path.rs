//! Placeholder path parsing.
//!
//! A placeholder's inner text is a dotted path with an optional modifier:
//!
//! - `WhoisServerRecord.Url`
//! - `WhoisServerRecord.AdminContact.TelephoneNumber`
//! - `WhoisServerRecord.TLD:ToLower()`
//!
//! The first step is the root label. It documents which record the template
//! targets and never addresses a field.

use crate::error::ParseError;
use crate::modifier::Modifier;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single field-access step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub name: String,
}

/// Parsed placeholder path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    /// Trimmed placeholder inner text
    pub raw: String,
    /// Steps including the root label; never empty
    pub steps: Vec<Step>,
    /// Transform applied to captured values
    pub modifier: Modifier,
}

impl Path {
    /// Parse placeholder inner text into a path
    ///
    /// # Errors
    ///
    /// `MalformedPlaceholder` for empty text, empty steps, invalid step
    /// characters, or an unknown / badly formed modifier.
    ///
    /// # Example
    ///
    /// ```
    /// use textbind::{Modifier, Path};
    ///
    /// let path = Path::parse("Record.Contact.Email:ToLower()").unwrap();
    /// assert_eq!(path.root(), "Record");
    /// assert_eq!(path.field_steps().len(), 2);
    /// assert_eq!(path.modifier, Modifier::ToLower);
    /// ```
    pub fn parse(inner: &str) -> Result<Self, ParseError> {
        let raw = inner.trim();
        let malformed = |reason: String| ParseError::MalformedPlaceholder {
            placeholder: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(malformed("placeholder is empty".to_string()));
        }

        let (dotted, modifier) = match raw.split_once(':') {
            Some((dotted, suffix)) => {
                let name = suffix
                    .trim()
                    .strip_suffix("()")
                    .ok_or_else(|| malformed(format!("modifier '{}' must be written as Name()", suffix)))?;
                let modifier = name.trim().parse::<Modifier>().map_err(malformed)?;
                (dotted, modifier)
            }
            None => (raw, Modifier::None),
        };

        let mut steps = Vec::new();
        for name in dotted.split('.') {
            let name = name.trim();
            if name.is_empty() {
                return Err(malformed("path contains an empty step".to_string()));
            }
            if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
                return Err(malformed(format!("invalid character {:?} in step '{}'", bad, name)));
            }
            steps.push(Step {
                name: name.to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            steps,
            modifier,
        })
    }

    /// The root label (first step)
    pub fn root(&self) -> &str {
        &self.steps[0].name
    }

    /// Steps that address fields, i.e. everything after the root label
    pub fn field_steps(&self) -> &[Step] {
        &self.steps[1..]
    }

    /// Dotted path without modifier, e.g. `Root.Organization.Name`
    pub fn dotted(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
