//! Named template sets loaded from YAML.
//!
//! ```yaml
//! templates:
//!   - name: iana
//!     description: IANA root zone whois
//!     template: |
//!       whois:        #{WhoisServerRecord.Url}
//! ```
//!
//! Every template is syntax-checked at load time. Path resolution needs a
//! record type, so it happens when the template is first parsed or validated.

use crate::error::ParseError;
use crate::template::Template;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Error type for template set loading
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io { path: String, message: String },
    Yaml(String),
    DuplicateName(String),
    InvalidTemplate { name: String, error: ParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read template set {}: {}", path, message)
            }
            ConfigError::Yaml(msg) => write!(f, "Failed to parse YAML: {}", msg),
            ConfigError::DuplicateName(name) => {
                write!(f, "Template '{}' is defined more than once", name)
            }
            ConfigError::InvalidTemplate { name, error } => {
                write!(f, "Template '{}' is invalid: {}", name, error)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// One named template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub template: String,
}

#[derive(Debug, Deserialize)]
struct TemplateSetFile {
    #[serde(default)]
    templates: Vec<TemplateEntry>,
}

/// Templates by name, in file order
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: IndexMap<String, TemplateEntry>,
}

impl TemplateSet {
    /// Load a template set from a YAML file
    ///
    /// # Example
    /// ```ignore
    /// use textbind::TemplateSet;
    ///
    /// let set = TemplateSet::load_from_file("templates/whois.yaml")?;
    /// let template = set.get("iana").unwrap();
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let set = Self::from_yaml_str(&contents)?;
        tracing::debug!("Loaded {} templates from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse a template set from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: TemplateSetFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        Self::from_entries(file.templates)
    }

    /// Build a set from entries, rejecting duplicates and bad syntax
    pub fn from_entries(entries: Vec<TemplateEntry>) -> Result<Self, ConfigError> {
        let mut templates = IndexMap::new();

        for entry in entries {
            Template::compile(&entry.template).map_err(|error| ConfigError::InvalidTemplate {
                name: entry.name.clone(),
                error,
            })?;
            if templates.contains_key(&entry.name) {
                return Err(ConfigError::DuplicateName(entry.name));
            }
            templates.insert(entry.name.clone(), entry);
        }

        Ok(Self { templates })
    }

    /// Template text by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(|e| e.template.as_str())
    }

    pub fn entry(&self, name: &str) -> Option<&TemplateEntry> {
        self.templates.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
