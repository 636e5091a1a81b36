//! Template compilation.
//!
//! A template is literal text with `#{...}` placeholders. Compilation splits
//! it into an ordered segment list and checks every placeholder path, so all
//! authoring errors surface before any input text is looked at.

use crate::error::ParseError;
use crate::path::Path;
use serde::Serialize;

const OPEN_MARKER: &str = "#{";
const CLOSE_MARKER: char = '}';

/// A span of a compiled template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Literal(String),
    Placeholder(Path),
}

/// Compiled template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Original template text
    pub source: String,
    pub segments: Vec<Segment>,
}

impl Template {
    /// Compile a template string
    ///
    /// # Errors
    ///
    /// - `MalformedTemplate` for an unterminated `#{`
    /// - `MalformedPlaceholder` for an invalid placeholder path
    /// - `AmbiguousPlaceholder` when two placeholders touch
    ///
    /// # Example
    ///
    /// ```
    /// use textbind::{Segment, Template};
    ///
    /// let template = Template::compile("whois:        #{Root.Url}").unwrap();
    /// assert_eq!(template.segments.len(), 2);
    /// assert!(matches!(&template.segments[0], Segment::Literal(s) if s == "whois:        "));
    /// ```
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find(OPEN_MARKER) {
            if open > 0 {
                push_literal(&mut segments, &rest[..open]);
            }

            let inner_start = open + OPEN_MARKER.len();
            let close = rest[inner_start..]
                .find(CLOSE_MARKER)
                .ok_or_else(|| ParseError::MalformedTemplate {
                    offset: offset + open,
                    reason: format!("placeholder opened with '{}' is never closed", OPEN_MARKER),
                })?;

            let path = Path::parse(&rest[inner_start..inner_start + close])?;

            if let Some(Segment::Placeholder(previous)) = segments.last() {
                return Err(ParseError::AmbiguousPlaceholder {
                    first: previous.raw.clone(),
                    second: path.raw,
                });
            }
            segments.push(Segment::Placeholder(path));

            let consumed = inner_start + close + CLOSE_MARKER.len_utf8();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            push_literal(&mut segments, rest);
        }

        let template = Self {
            source: source.to_string(),
            segments,
        };
        tracing::debug!(
            "Compiled template: {} segments, {} placeholders",
            template.segments.len(),
            template.placeholder_count()
        );
        Ok(template)
    }

    /// Placeholder paths in template order
    pub fn placeholders(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(path) => Some(path),
            Segment::Literal(_) => None,
        })
    }

    /// Literal anchors in template order
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Literal(text) => Some(text.as_str()),
            Segment::Placeholder(_) => None,
        })
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }
}

/// Append literal text, coalescing with a preceding literal
fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Literal(previous)) = segments.last_mut() {
        previous.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}
