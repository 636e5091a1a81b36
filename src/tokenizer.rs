//! Public parse entry points.
//!
//! `Tokenizer` compiles a template for a record type (syntax, path
//! resolution, matcher), runs it against the text, and binds the captures.
//! Compiled templates can be memoized per record type; the cache is only
//! read on the hot path. It holds at most `DEFAULT_CACHE_LIMIT` entries
//! (or the limit given to `Tokenizer::with_cache_limit`) and is cleared
//! when an insert would exceed that.

use crate::binder::Binder;
use crate::error::{CoercionWarning, ParseError};
use crate::matcher::Matcher;
use crate::schema::Record;
use crate::template::Template;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of a successful parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed<T> {
    /// The bound record
    pub value: T,
    /// The text that was parsed
    pub raw: String,
    /// True when every capture was bound without a coercion warning
    pub success: bool,
    pub warnings: Vec<CoercionWarning>,
}

/// Everything needed to parse one template into one record type
#[derive(Debug)]
pub struct CompiledTemplate<T> {
    pub template: Template,
    pub matcher: Matcher,
    pub binder: Binder<T>,
}

impl<T: Record> CompiledTemplate<T> {
    /// Compile and resolve a template for `T`; no text is involved
    pub fn compile(source: &str) -> Result<Self, ParseError> {
        let template = Template::compile(source)?;
        let binder = Binder::<T>::new(&template)?;
        let matcher = Matcher::new(&template, |path| binder.is_multi_valued(path))?;

        Ok(Self {
            template,
            matcher,
            binder,
        })
    }

    /// Match the text and bind into `target`.
    ///
    /// `target` is left untouched when the text does not match.
    pub fn parse_into(&self, text: &str, target: &mut T) -> Result<Vec<CoercionWarning>, ParseError> {
        let result = self.matcher.extract(text)?;
        self.binder.bind(&result, target)
    }

    pub fn parse(&self, text: &str) -> Result<Parsed<T>, ParseError> {
        let mut value = T::default();
        let warnings = self.parse_into(text, &mut value)?;

        Ok(Parsed {
            value,
            raw: text.to_string(),
            success: warnings.is_empty(),
            warnings,
        })
    }
}

/// Compiled templates kept by `Tokenizer::new` before the cache is reset
pub const DEFAULT_CACHE_LIMIT: usize = 256;

type CacheKey = (TypeId, String);
type CacheEntry = Arc<dyn Any + Send + Sync>;

/// Template parser with an optional compilation cache
///
/// # Example
///
/// ```
/// use textbind::{Record, Schema, Tokenizer};
///
/// #[derive(Debug, Default)]
/// struct Server {
///     url: Option<String>,
/// }
///
/// impl Record for Server {
///     const NAME: &'static str = "Server";
///
///     fn schema() -> Schema<Self> {
///         Schema::<Self>::new(Self::NAME).text("url", |s| &mut s.url)
///     }
/// }
///
/// let tokenizer = Tokenizer::new();
/// let parsed = tokenizer
///     .parse::<Server>("whois:        #{Server.Url}", "whois:        whois.arin.net")
///     .unwrap();
/// assert_eq!(parsed.value.url.as_deref(), Some("whois.arin.net"));
/// ```
#[derive(Debug)]
pub struct Tokenizer {
    cache: Option<RwLock<HashMap<CacheKey, CacheEntry>>>,
    cache_limit: usize,
}

impl Tokenizer {
    /// Create a tokenizer that memoizes up to `DEFAULT_CACHE_LIMIT` templates
    pub fn new() -> Self {
        Self::with_cache_limit(DEFAULT_CACHE_LIMIT)
    }

    /// Create a tokenizer whose cache is cleared once it holds `limit` templates.
    /// A limit of zero disables caching.
    pub fn with_cache_limit(limit: usize) -> Self {
        if limit == 0 {
            return Self::uncached();
        }
        Self {
            cache: Some(RwLock::new(HashMap::new())),
            cache_limit: limit,
        }
    }

    /// Create a tokenizer that compiles on every call
    pub fn uncached() -> Self {
        Self {
            cache: None,
            cache_limit: 0,
        }
    }

    /// Compile (or fetch from cache) a template for `T`
    pub fn compile<T: Record>(&self, template: &str) -> Result<Arc<CompiledTemplate<T>>, ParseError> {
        let Some(cache) = &self.cache else {
            return CompiledTemplate::compile(template).map(Arc::new);
        };

        let key = (TypeId::of::<T>(), template.to_string());
        let cached = cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(entry) = cached {
            if let Ok(compiled) = entry.downcast::<CompiledTemplate<T>>() {
                tracing::trace!("Template cache hit for '{}'", T::NAME);
                return Ok(compiled);
            }
        }

        // Compile outside the lock; a concurrent miss on the same key just
        // compiles twice and the later insert wins.
        let compiled = Arc::new(CompiledTemplate::<T>::compile(template)?);
        let mut entries = cache.write().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.cache_limit && !entries.contains_key(&key) {
            tracing::debug!(
                "Template cache reached {} entries, clearing",
                self.cache_limit
            );
            entries.clear();
        }
        entries.insert(key, compiled.clone() as CacheEntry);
        Ok(compiled)
    }

    /// Parse `text` with `template` into a fresh `T`
    ///
    /// # Errors
    ///
    /// Authoring errors for a bad template, `NoMatch` when the template's
    /// literal text is not found.
    pub fn parse<T: Record>(&self, template: &str, text: &str) -> Result<Parsed<T>, ParseError> {
        self.compile::<T>(template)?.parse(text)
    }

    /// Parse into a caller-supplied record, returning coercion warnings
    pub fn parse_into<T: Record>(
        &self,
        template: &str,
        text: &str,
        target: &mut T,
    ) -> Result<Vec<CoercionWarning>, ParseError> {
        self.compile::<T>(template)?.parse_into(text, target)
    }

    /// Check a template against `T` without any text
    pub fn validate<T: Record>(&self, template: &str) -> Result<(), ParseError> {
        self.compile::<T>(template).map(|_| ())
    }

    /// Number of cached compiled templates
    pub fn cached_templates(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| {
            cache.read().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `text` with `template` into a fresh `T`, without caching
pub fn parse<T: Record>(template: &str, text: &str) -> Result<Parsed<T>, ParseError> {
    Tokenizer::uncached().parse(template, text)
}

/// Parse into a caller-supplied record, without caching
pub fn parse_into<T: Record>(
    template: &str,
    text: &str,
    target: &mut T,
) -> Result<Vec<CoercionWarning>, ParseError> {
    Tokenizer::uncached().parse_into(template, text, target)
}

/// Check a template for authoring errors against `T`
pub fn validate<T: Record>(template: &str) -> Result<(), ParseError> {
    Tokenizer::uncached().validate::<T>(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use std::thread;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Server {
        url: Option<String>,
        remarks: Option<String>,
    }

    impl Record for Server {
        const NAME: &'static str = "Server";

        fn schema() -> Schema<Self> {
            Schema::<Self>::new(Self::NAME)
                .text("url", |s| &mut s.url)
                .text("remarks", |s| &mut s.remarks)
        }
    }

    const TEMPLATE: &str = "whois:        #{Server.Url}";

    #[test]
    fn test_cache_reuses_compiled_template() {
        let tokenizer = Tokenizer::new();

        let first = tokenizer.compile::<Server>(TEMPLATE).unwrap();
        let second = tokenizer.compile::<Server>(TEMPLATE).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(tokenizer.cached_templates(), 1);

        tokenizer.clear_cache();
        assert_eq!(tokenizer.cached_templates(), 0);
    }

    #[test]
    fn test_cache_is_cleared_at_limit() {
        let tokenizer = Tokenizer::with_cache_limit(2);

        tokenizer.compile::<Server>("whois:        #{Server.Url}").unwrap();
        tokenizer.compile::<Server>("refer:        #{Server.Url}").unwrap();
        assert_eq!(tokenizer.cached_templates(), 2);

        // Recompiling a cached template never evicts
        tokenizer.compile::<Server>("refer:        #{Server.Url}").unwrap();
        assert_eq!(tokenizer.cached_templates(), 2);

        tokenizer.compile::<Server>("remarks:      #{Server.Remarks}").unwrap();
        assert_eq!(tokenizer.cached_templates(), 1);
    }

    #[test]
    fn test_zero_limit_disables_cache() {
        let tokenizer = Tokenizer::with_cache_limit(0);
        tokenizer.compile::<Server>(TEMPLATE).unwrap();
        assert_eq!(tokenizer.cached_templates(), 0);
    }

    #[test]
    fn test_uncached_tokenizer() {
        let tokenizer = Tokenizer::uncached();
        tokenizer.parse::<Server>(TEMPLATE, "whois:        x").unwrap();
        assert_eq!(tokenizer.cached_templates(), 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.validate::<Server>("whois: #{Server.Nope}").is_err());
        assert_eq!(tokenizer.cached_templates(), 0);
    }

    #[test]
    fn test_parse_into_untouched_on_no_match() {
        let mut server = Server {
            remarks: Some("kept".to_string()),
            ..Server::default()
        };
        let err = parse_into(TEMPLATE, "refer:        whois.arin.net", &mut server).unwrap_err();

        assert!(matches!(err, ParseError::NoMatch { .. }));
        assert_eq!(server.remarks.as_deref(), Some("kept"));
        assert!(server.url.is_none());
    }

    #[test]
    fn test_concurrent_parses() {
        let tokenizer = Arc::new(Tokenizer::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tokenizer = Arc::clone(&tokenizer);
                thread::spawn(move || {
                    let text = format!("whois:        whois{}.example", i);
                    tokenizer.parse::<Server>(TEMPLATE, &text).unwrap().value
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let server = handle.join().unwrap();
            assert_eq!(server.url, Some(format!("whois{}.example", i)));
        }
        assert_eq!(tokenizer.cached_templates(), 1);
    }
}
