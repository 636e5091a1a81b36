//! Binding captured values into a record.
//!
//! A `Binder` is built from a compiled template and a record schema. Building
//! it resolves every placeholder path, which is where `UnresolvedPath`
//! surfaces. Binding itself only fails softly, per value.

use crate::error::{CoercionWarning, ParseError};
use crate::matcher::MatchResult;
use crate::path::Path;
use crate::schema::{Binding, FieldKind, Record};
use crate::template::Template;
use indexmap::IndexMap;

/// Resolved bindings for every placeholder of one template
#[derive(Debug)]
pub struct Binder<T> {
    /// Keyed by placeholder text; a placeholder repeated in the template
    /// shares one binding
    bindings: IndexMap<String, Binding<T>>,
}

impl<T: Record> Binder<T> {
    /// Resolve all placeholder paths of a template against `T`'s schema
    pub fn new(template: &Template) -> Result<Self, ParseError> {
        let schema = T::schema();
        let mut bindings = IndexMap::new();

        for path in template.placeholders() {
            if bindings.contains_key(&path.raw) {
                continue;
            }
            let binding = schema.resolve(path)?;
            bindings.insert(path.raw.clone(), binding);
        }

        Ok(Self { bindings })
    }

    /// Field kind a placeholder resolves to
    pub fn kind(&self, path: &Path) -> Option<FieldKind> {
        self.bindings.get(&path.raw).map(|b| b.kind)
    }

    /// True when the placeholder binds to a list field
    pub fn is_multi_valued(&self, path: &Path) -> bool {
        self.kind(path) == Some(FieldKind::List)
    }

    /// Bind captures into `target` in order.
    ///
    /// Text fields keep the last value, list fields append. Values that fail
    /// date/time coercion leave the field untouched and are reported as
    /// warnings.
    ///
    /// # Errors
    ///
    /// `UnresolvedPath` when a capture's path was not part of this binder's
    /// template.
    pub fn bind(
        &self,
        result: &MatchResult,
        target: &mut T,
    ) -> Result<Vec<CoercionWarning>, ParseError> {
        let mut warnings = Vec::new();

        for capture in &result.captures {
            let binding = self.bindings.get(&capture.path.raw).ok_or_else(|| {
                ParseError::UnresolvedPath {
                    path: capture.path.raw.clone(),
                    step: capture.path.root().to_string(),
                    reason: "path is not part of the compiled template".to_string(),
                }
            })?;

            let value = capture.path.modifier.apply(&capture.value);
            if let Err(reason) = binding.set(target, &value) {
                tracing::warn!(
                    "Could not coerce {:?} for '{}': {}",
                    value,
                    capture.path,
                    reason
                );
                warnings.push(CoercionWarning {
                    path: capture.path.raw.clone(),
                    value,
                    reason,
                });
            }
        }

        Ok(warnings)
    }
}
