//! Field-accessor tables for target records.
//!
//! A target type registers each bindable field once, by name, with a plain
//! accessor function. Placeholder paths are resolved against this table
//! before any text is scanned, so a typo in a template is reported as
//! `UnresolvedPath` instead of silently binding nothing.
//!
//! Names are compared after snake-case normalization: the template step
//! `TelephoneNumber` resolves the field registered as `telephone_number`.
//!
//! # Example
//!
//! ```
//! use textbind::{Record, Schema};
//!
//! #[derive(Debug, Default)]
//! struct Organization {
//!     name: Option<String>,
//!     address: Vec<String>,
//! }
//!
//! impl Record for Organization {
//!     const NAME: &'static str = "Organization";
//!
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new(Self::NAME)
//!             .text("name", |o| &mut o.name)
//!             .list("address", |o| &mut o.address)
//!     }
//! }
//! ```

use crate::coerce::parse_datetime;
use crate::error::ParseError;
use crate::path::{Path, Step};
use chrono::NaiveDateTime;
use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A type that templates can bind into
pub trait Record: Default + Send + Sync + 'static {
    /// Type label, expected as the root step of placeholder paths
    const NAME: &'static str;

    /// Field table for this type
    fn schema() -> Schema<Self>;
}

/// Declared shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    List,
    DateTime,
    Object,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "text",
            FieldKind::List => "list",
            FieldKind::DateTime => "date/time",
            FieldKind::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// Writes one coerced value into a record; `Err` carries a coercion failure reason
pub type Setter<T> = Box<dyn Fn(&mut T, &str) -> Result<(), String> + Send + Sync>;

/// A path resolved down to its leaf field
pub struct Binding<T> {
    pub kind: FieldKind,
    setter: Setter<T>,
}

impl<T> Binding<T> {
    /// Store a value at the leaf, allocating intermediate objects as needed
    pub fn set(&self, target: &mut T, value: &str) -> Result<(), String> {
        (self.setter)(target, value)
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("kind", &self.kind).finish()
    }
}

/// Type-erased nested object field
trait NestedField<T>: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn resolve(&self, steps: &[Step], path: &Path) -> Result<Binding<T>, ParseError>;
}

struct Nested<T, U> {
    access: fn(&mut T) -> &mut Option<U>,
}

impl<T: 'static, U: Record> NestedField<T> for Nested<T, U> {
    fn type_name(&self) -> &'static str {
        U::NAME
    }

    fn resolve(&self, steps: &[Step], path: &Path) -> Result<Binding<T>, ParseError> {
        let inner = U::schema().resolve_steps(steps, path)?;
        let access = self.access;
        Ok(Binding {
            kind: inner.kind,
            setter: Box::new(move |target: &mut T, value: &str| {
                let child = access(target).get_or_insert_with(U::default);
                inner.set(child, value)
            }),
        })
    }
}

enum Field<T> {
    Text(fn(&mut T) -> &mut Option<String>),
    List(fn(&mut T) -> &mut Vec<String>),
    DateTime(fn(&mut T) -> &mut Option<NaiveDateTime>),
    Object(Box<dyn NestedField<T>>),
}

impl<T> Field<T> {
    fn kind(&self) -> FieldKind {
        match self {
            Field::Text(_) => FieldKind::Text,
            Field::List(_) => FieldKind::List,
            Field::DateTime(_) => FieldKind::DateTime,
            Field::Object(_) => FieldKind::Object,
        }
    }
}

/// Named field table for a record type
pub struct Schema<T> {
    name: &'static str,
    fields: IndexMap<String, Field<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: IndexMap::new(),
        }
    }

    /// Register a scalar text field (last write wins)
    pub fn text(mut self, name: &str, access: fn(&mut T) -> &mut Option<String>) -> Self {
        self.fields.insert(normalize(name), Field::Text(access));
        self
    }

    /// Register a multi-valued text field (values are appended)
    pub fn list(mut self, name: &str, access: fn(&mut T) -> &mut Vec<String>) -> Self {
        self.fields.insert(normalize(name), Field::List(access));
        self
    }

    /// Register a date/time field
    pub fn datetime(mut self, name: &str, access: fn(&mut T) -> &mut Option<NaiveDateTime>) -> Self {
        self.fields.insert(normalize(name), Field::DateTime(access));
        self
    }

    /// Register a nested record, allocated on first bind
    pub fn object<U: Record>(mut self, name: &str, access: fn(&mut T) -> &mut Option<U>) -> Self {
        self.fields
            .insert(normalize(name), Field::Object(Box::new(Nested { access })));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registered fields in registration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field.kind()))
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(&normalize(name)).map(Field::kind)
    }

    /// Resolve a placeholder path to its leaf binding
    ///
    /// # Errors
    ///
    /// `UnresolvedPath` when the path names no field, names an unknown
    /// field, continues past a leaf, or ends on an object field.
    pub fn resolve(&self, path: &Path) -> Result<Binding<T>, ParseError> {
        if normalize(path.root()) != normalize(self.name) {
            tracing::debug!(
                "Path '{}' is labelled '{}' but binds into '{}'",
                path,
                path.root(),
                self.name
            );
        }

        if path.field_steps().is_empty() {
            return Err(unresolved(path, path.root(), "path names no field".to_string()));
        }
        self.resolve_steps(path.field_steps(), path)
    }

    fn resolve_steps(&self, steps: &[Step], path: &Path) -> Result<Binding<T>, ParseError> {
        let Some((step, rest)) = steps.split_first() else {
            return Err(unresolved(path, path.root(), "path names no field".to_string()));
        };

        let field = self.fields.get(&normalize(&step.name)).ok_or_else(|| {
            unresolved(path, &step.name, format!("'{}' has no such field", self.name))
        })?;

        if let (Some(next), false) = (rest.first(), matches!(field, Field::Object(_))) {
            return Err(unresolved(
                path,
                &next.name,
                format!("'{}' is a {} field and has no sub-fields", step.name, field.kind()),
            ));
        }

        let setter: Setter<T> = match field {
            Field::Object(nested) => {
                if rest.is_empty() {
                    return Err(unresolved(
                        path,
                        &step.name,
                        format!("field is a '{}' object, not a leaf value", nested.type_name()),
                    ));
                }
                return nested.resolve(rest, path);
            }
            Field::Text(access) => {
                let access = *access;
                Box::new(move |target: &mut T, value: &str| {
                    *access(target) = Some(value.to_string());
                    Ok(())
                })
            }
            Field::List(access) => {
                let access = *access;
                Box::new(move |target: &mut T, value: &str| {
                    access(target).push(value.to_string());
                    Ok(())
                })
            }
            Field::DateTime(access) => {
                let access = *access;
                Box::new(move |target: &mut T, value: &str| {
                    let parsed = parse_datetime(value)
                        .ok_or_else(|| "unrecognized date/time format".to_string())?;
                    *access(target) = Some(parsed);
                    Ok(())
                })
            }
        };

        Ok(Binding {
            kind: field.kind(),
            setter,
        })
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn normalize(name: &str) -> String {
    name.to_case(Case::Snake)
}

fn unresolved(path: &Path, step: &str, reason: String) -> ParseError {
    ParseError::UnresolvedPath {
        path: path.raw.clone(),
        step: step.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Inner {
        name: Option<String>,
        tags: Vec<String>,
    }

    impl Record for Inner {
        const NAME: &'static str = "Inner";

        fn schema() -> Schema<Self> {
            Schema::<Self>::new(Self::NAME)
                .text("name", |i| &mut i.name)
                .list("tags", |i| &mut i.tags)
        }
    }

    #[derive(Debug, Default)]
    struct Outer {
        title: Option<String>,
        created: Option<NaiveDateTime>,
        inner: Option<Inner>,
    }

    impl Record for Outer {
        const NAME: &'static str = "Outer";

        fn schema() -> Schema<Self> {
            Schema::<Self>::new(Self::NAME)
                .text("title", |o| &mut o.title)
                .datetime("created", |o| &mut o.created)
                .object("inner", |o| &mut o.inner)
        }
    }

    fn resolve(inner: &str) -> Result<Binding<Outer>, ParseError> {
        Outer::schema().resolve(&Path::parse(inner).unwrap())
    }

    #[test]
    fn test_resolve_pascal_case_steps() {
        let binding = resolve("Outer.Title").unwrap();
        assert_eq!(binding.kind, FieldKind::Text);

        let mut outer = Outer::default();
        binding.set(&mut outer, "hello").unwrap();
        assert_eq!(outer.title.as_deref(), Some("hello"));
    }

    #[test]
    fn test_nested_allocated_once() {
        let name = resolve("Outer.Inner.Name").unwrap();
        let tags = resolve("Outer.Inner.Tags").unwrap();
        assert_eq!(tags.kind, FieldKind::List);

        let mut outer = Outer::default();
        assert!(outer.inner.is_none());

        name.set(&mut outer, "first").unwrap();
        tags.set(&mut outer, "a").unwrap();
        tags.set(&mut outer, "b").unwrap();
        name.set(&mut outer, "second").unwrap();

        let inner = outer.inner.unwrap();
        assert_eq!(inner.name.as_deref(), Some("second"));
        assert_eq!(inner.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_datetime_failure_keeps_zero_value() {
        let binding = resolve("Outer.Created").unwrap();
        let mut outer = Outer::default();

        assert!(binding.set(&mut outer, "not a date").is_err());
        assert!(outer.created.is_none());

        binding.set(&mut outer, "2001-02-03").unwrap();
        assert!(outer.created.is_some());
    }

    #[test]
    fn test_unknown_field() {
        let err = resolve("Outer.Missing").unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedPath { ref step, .. } if step == "Missing"));
    }

    #[test]
    fn test_path_through_leaf() {
        let err = resolve("Outer.Title.Length").unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedPath { ref step, .. } if step == "Length"));
    }

    #[test]
    fn test_path_ending_on_object() {
        assert!(matches!(
            resolve("Outer.Inner"),
            Err(ParseError::UnresolvedPath { .. })
        ));
    }

    #[test]
    fn test_root_only_path() {
        assert!(matches!(
            resolve("Outer"),
            Err(ParseError::UnresolvedPath { .. })
        ));
    }

    #[test]
    fn test_fields_listing() {
        let schema = Outer::schema();
        let fields: Vec<_> = schema.fields().collect();
        assert_eq!(
            fields,
            vec![
                ("title", FieldKind::Text),
                ("created", FieldKind::DateTime),
                ("inner", FieldKind::Object),
            ]
        );
        assert_eq!(schema.kind_of("Created"), Some(FieldKind::DateTime));
    }
}
