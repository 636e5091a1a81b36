//! # textbind: template-driven text extraction
//!
//! textbind pulls values out of semi-structured text (WHOIS responses,
//! registry dumps, status pages) by laying a template over it. The template
//! is the text itself with the interesting parts replaced by placeholders:
//!
//! ```text
//! domain:       #{WhoisServerRecord.TLD:ToLower()}
//!
//! organisation: #{WhoisServerRecord.Organization.Name}
//! nserver:      #{WhoisServerRecord.NameServers}
//! whois:        #{WhoisServerRecord.Url}
//! changed:      #{WhoisServerRecord.Changed}
//! ```
//!
//! ## Features
//!
//! - **Literal anchors**: text outside placeholders must appear verbatim, in order
//! - **Dotted paths**: placeholders address nested fields; intermediate records are
//!   allocated on first use
//! - **Typed leaves**: text (last write wins), lists (append, including repeated
//!   text lines), and date/time values with a flexible parser
//! - **Modifiers**: `:ToLower()`, `:ToUpper()`, `:Trim()` on the last step
//! - **Offline validation**: every authoring error is reported before any text is read
//!
//! ## Example
//!
//! ```
//! use textbind::{parse, Record, Schema};
//!
//! #[derive(Debug, Default)]
//! struct Organization {
//!     name: Option<String>,
//! }
//!
//! impl Record for Organization {
//!     const NAME: &'static str = "Organization";
//!
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new(Self::NAME).text("name", |o| &mut o.name)
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct Domain {
//!     url: Option<String>,
//!     organization: Option<Organization>,
//! }
//!
//! impl Record for Domain {
//!     const NAME: &'static str = "Domain";
//!
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new(Self::NAME)
//!             .text("url", |d| &mut d.url)
//!             .object("organization", |d| &mut d.organization)
//!     }
//! }
//!
//! let template = "Domain name:\n#{Domain.Url}\n\nHolder of domain name:\n#{Domain.Organization.Name}";
//! let text = "Domain name:\ngoogle.ch\n\nHolder of domain name:\nGoogle Inc.";
//!
//! let parsed = parse::<Domain>(template, text).unwrap();
//! assert_eq!(parsed.value.url.as_deref(), Some("google.ch"));
//! assert_eq!(
//!     parsed.value.organization.unwrap().name.as_deref(),
//!     Some("Google Inc.")
//! );
//! ```

// Core modules
pub mod error;
pub mod modifier;
pub mod path;
pub mod template;
pub mod matcher;
pub mod coerce;
pub mod schema;
pub mod binder;
pub mod tokenizer;

// Configuration and output
pub mod config;
pub mod serialization;

// Re-export key types
pub use error::{CoercionWarning, ParseError};
pub use modifier::Modifier;
pub use path::{Path, Step};
pub use template::{Segment, Template};
pub use matcher::{Capture, MatchResult, Matcher};
pub use schema::{Binding, FieldKind, Record, Schema};
pub use binder::Binder;
pub use tokenizer::{
    parse, parse_into, validate, CompiledTemplate, Parsed, Tokenizer, DEFAULT_CACHE_LIMIT,
};
pub use config::{ConfigError, TemplateEntry, TemplateSet};
pub use serialization::{write_document, CaptureWriter, OutputError};
