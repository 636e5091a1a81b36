//! Positional matching of a compiled template against input text.
//!
//! Every literal segment becomes an escaped anchor and every placeholder a
//! non-greedy capture between its neighbouring anchors. The whole template is
//! one regex, so matching runs in time linear in the input.

use crate::error::ParseError;
use crate::path::Path;
use crate::template::{Segment, Template};
use regex::Regex;
use serde::Serialize;

/// Characters stripped from both ends of a capture
const CAPTURE_TRIM: &[char] = &[' ', '\t', '\r'];

/// One captured value, in template (then text) order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capture {
    pub path: Path,
    pub value: String,
}

/// Ordered captures for a single match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MatchResult {
    pub captures: Vec<Capture>,
}

impl MatchResult {
    /// Values captured for a path, matched against the placeholder text
    /// (e.g. `Root.NameServers` or `Root.TLD:ToLower()`)
    pub fn values(&self, raw_path: &str) -> Vec<&str> {
        self.captures
            .iter()
            .filter(|c| c.path.raw == raw_path)
            .map(|c| c.value.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

/// Capture group bookkeeping for one placeholder
#[derive(Debug, Clone)]
struct Slot {
    path: Path,
    group: usize,
    repeat: Option<RepeatSlot>,
}

/// Extra groups for a placeholder that collects repeated text lines.
///
/// `group` holds the continuation lines. `fallback`, when present, is the
/// unrestricted capture used when the line-bound form cannot reach the
/// next literal.
#[derive(Debug, Clone)]
struct RepeatSlot {
    group: usize,
    fallback: Option<usize>,
    prefix: String,
}

/// Regex-backed matcher for one template
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    slots: Vec<Slot>,
    anchors: Vec<(String, Regex)>,
}

impl Matcher {
    /// Build a matcher for a compiled template.
    ///
    /// `repeatable` decides which placeholders collect repeated text lines.
    /// Only placeholders that fill the rest of a line starting with a
    /// non-empty prefix (e.g. `nserver:      #{Root.NameServers}`) can repeat.
    /// When the value runs past its line instead, the placeholder captures
    /// up to the next literal as any other placeholder would.
    ///
    /// A leading placeholder captures from the start of the line holding
    /// the first literal, not from the start of the text.
    pub fn new<F>(template: &Template, repeatable: F) -> Result<Self, ParseError>
    where
        F: Fn(&Path) -> bool,
    {
        let segments = &template.segments;
        let mut pattern = String::from("(?s)");
        let mut slots = Vec::new();
        let mut group = 0;
        let mut consumed = None;

        for (idx, segment) in segments.iter().enumerate() {
            let prev = idx.checked_sub(1).and_then(|i| literal_at(segments, i));
            let next = literal_at(segments, idx + 1);

            match segment {
                Segment::Literal(_) if consumed == Some(idx) => {}
                Segment::Literal(text) => pattern.push_str(&literal_pattern(segments, idx, text)),
                Segment::Placeholder(path) => {
                    group += 1;
                    let capture_group = group;

                    // Literal text on the placeholder's own line, before it
                    let line_prefix = match prev {
                        Some(p) if p.contains('\n') => p.rsplit('\n').next(),
                        Some(p) if idx == 1 => Some(p),
                        _ => None,
                    };
                    let is_last_literal = idx + 2 == segments.len();
                    let ends_line = next.map_or(true, |n| {
                        n.starts_with('\n')
                            || n.starts_with("\r\n")
                            || (is_last_literal && n.trim().is_empty())
                    });

                    let repeat = match line_prefix {
                        Some(prefix) if !prefix.is_empty() && ends_line && repeatable(path) => {
                            group += 1;
                            let continuation = group;
                            let fallback = next.map(|_| {
                                group += 1;
                                group
                            });
                            Some(RepeatSlot {
                                group: continuation,
                                fallback,
                                prefix: prefix.to_string(),
                            })
                        }
                        _ => None,
                    };

                    match (&repeat, prev.is_some(), next) {
                        (Some(slot), _, Some(next_text)) => {
                            let anchor = literal_pattern(segments, idx + 1, next_text);
                            pattern.push_str(&format!(
                                "(?:([^\\r\\n]*?)((?:\\r?\\n{}[^\\r\\n]*)*){}|(.*?){})",
                                regex::escape(&slot.prefix),
                                anchor,
                                anchor
                            ));
                            consumed = Some(idx + 1);
                        }
                        (Some(slot), _, None) => {
                            pattern.push_str(&format!(
                                "([^\\r\\n]*)((?:\\r?\\n{}[^\\r\\n]*)*)",
                                regex::escape(&slot.prefix)
                            ));
                        }
                        (None, false, Some(_)) => pattern.push_str("(?m:^)([^\\r\\n]*?)"),
                        (None, false, None) => pattern.push_str("(?m:^)([^\\r\\n]*)"),
                        (None, true, None) => pattern.push_str("([^\\r\\n]*)"),
                        (None, true, Some(_)) => pattern.push_str("(.*?)"),
                    }

                    slots.push(Slot {
                        path: path.clone(),
                        group: capture_group,
                        repeat,
                    });
                }
            }
        }

        let regex = build_regex(&pattern)?;
        tracing::trace!("Matcher pattern: {}", pattern);

        let anchors = template
            .literals()
            .map(|literal| Ok((literal.to_string(), build_regex(&escape_literal(literal))?)))
            .collect::<Result<Vec<_>, ParseError>>()?;

        Ok(Self {
            regex,
            slots,
            anchors,
        })
    }

    /// Build a matcher where no placeholder collects repeated lines
    pub fn single(template: &Template) -> Result<Self, ParseError> {
        Self::new(template, |_| false)
    }

    /// Run the matcher once against the full text
    ///
    /// # Errors
    ///
    /// `NoMatch` when the literal skeleton is not present, in order.
    pub fn extract(&self, text: &str) -> Result<MatchResult, ParseError> {
        let caps = self
            .regex
            .captures(text)
            .ok_or_else(|| ParseError::NoMatch {
                anchor: self.missing_anchor(text),
            })?;

        let mut captures = Vec::new();
        for slot in &self.slots {
            let (value, repeat) = match (caps.get(slot.group), &slot.repeat) {
                (None, Some(repeat)) => (repeat.fallback.and_then(|g| caps.get(g)), None),
                (value, repeat) => (value, repeat.as_ref()),
            };
            captures.push(Capture {
                path: slot.path.clone(),
                value: value
                    .map_or("", |m| m.as_str())
                    .trim_matches(CAPTURE_TRIM)
                    .to_string(),
            });

            let Some(repeat) = repeat else {
                continue;
            };
            let continuation = caps.get(repeat.group).map_or("", |m| m.as_str());
            for line in continuation.split('\n').skip(1) {
                let line = line.trim_end_matches('\r');
                let value = line.strip_prefix(repeat.prefix.as_str()).unwrap_or(line);
                captures.push(Capture {
                    path: slot.path.clone(),
                    value: value.trim_matches(CAPTURE_TRIM).to_string(),
                });
            }
        }

        tracing::debug!("Extracted {} captures", captures.len());
        Ok(MatchResult { captures })
    }

    /// True when the template's literal skeleton appears in the text
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// First literal that cannot be found scanning the text left to right
    fn missing_anchor(&self, text: &str) -> String {
        let mut from = 0;
        for (literal, anchor) in &self.anchors {
            match anchor.find_at(text, from) {
                Some(m) => from = m.end(),
                None => return literal.clone(),
            }
        }
        self.anchors
            .last()
            .map(|(literal, _)| literal.clone())
            .unwrap_or_default()
    }
}

fn build_regex(pattern: &str) -> Result<Regex, ParseError> {
    Regex::new(pattern).map_err(|e| ParseError::MalformedTemplate {
        offset: 0,
        reason: format!("template cannot be compiled into a matcher: {}", e),
    })
}

fn literal_at(segments: &[Segment], idx: usize) -> Option<&str> {
    match segments.get(idx) {
        Some(Segment::Literal(text)) => Some(text.as_str()),
        _ => None,
    }
}

/// Pattern for the literal at `idx`; a whitespace-only literal ending the
/// template also matches end of text
fn literal_pattern(segments: &[Segment], idx: usize, text: &str) -> String {
    let trailing = idx > 0 && idx + 1 == segments.len();
    if trailing && text.trim().is_empty() {
        format!("(?:{}|\\z)", escape_literal(text))
    } else {
        escape_literal(text)
    }
}

/// Escape literal text, letting each newline match `\n` or `\r\n`
fn escape_literal(text: &str) -> String {
    text.split('\n')
        .map(|line| regex::escape(line.strip_suffix('\r').unwrap_or(line)))
        .collect::<Vec<_>>()
        .join("\\r?\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(template: &str, text: &str) -> Result<MatchResult, ParseError> {
        let template = Template::compile(template).unwrap();
        Matcher::single(&template)?.extract(text)
    }

    #[test]
    fn test_single_line() {
        let result = extract("whois:        #{Root.Url}", "whois:        whois.arin.net").unwrap();
        assert_eq!(result.values("Root.Url"), vec!["whois.arin.net"]);
    }

    #[test]
    fn test_trailing_placeholder_stops_at_line_end() {
        let text = "refer:        whois.arin.net\n\nwhois:        whois.arin.net\n\nchanged:      1998-04\n";
        let result = extract("whois:        #{Root.Url}", text).unwrap();
        assert_eq!(result.values("Root.Url"), vec!["whois.arin.net"]);
    }

    #[test]
    fn test_multi_line_blocks() {
        let template = "Domain name:\n#{Root.Url}\n\nHolder of domain name:\n#{Root.Organization.Name}\n";
        let text = "Domain name:\ngoogle.ch\n\nHolder of domain name:\nGoogle Inc.";
        let result = extract(template, text).unwrap();

        assert_eq!(result.values("Root.Url"), vec!["google.ch"]);
        assert_eq!(result.values("Root.Organization.Name"), vec!["Google Inc."]);
    }

    #[test]
    fn test_crlf_text() {
        let template = "Domain name:\n#{Root.Url}\n\nHolder:\n#{Root.Name}";
        let text = "Domain name:\r\ngoogle.ch\r\n\r\nHolder:\r\nGoogle Inc.\r\n";
        let result = extract(template, text).unwrap();

        assert_eq!(result.values("Root.Url"), vec!["google.ch"]);
        assert_eq!(result.values("Root.Name"), vec!["Google Inc."]);
    }

    #[test]
    fn test_capture_preserves_internal_newlines() {
        let template = "remarks:\n#{Root.Remarks}\nsource:";
        let text = "remarks:\n  line one\nline two  \nsource: IANA";
        let result = extract(template, text).unwrap();
        assert_eq!(result.values("Root.Remarks"), vec!["line one\nline two"]);
    }

    #[test]
    fn test_leading_placeholder() {
        let result = extract("#{Root.Name} is registered", "header\nexample.com is registered\n").unwrap();
        assert_eq!(result.values("Root.Name"), vec!["example.com"]);
    }

    #[test]
    fn test_leading_placeholder_starts_at_line_of_anchor() {
        let result = extract("#{R.Name}\nsource:", "first\nsecond\nsource: X").unwrap();
        assert_eq!(result.values("R.Name"), vec!["second"]);
    }

    #[test]
    fn test_missing_anchor_is_no_match() {
        let err = extract("whois:        #{Root.Url}\nsource:       RIPE", "whois:        whois.arin.net\nsource:       IANA").unwrap_err();
        assert_eq!(
            err,
            ParseError::NoMatch {
                anchor: "\nsource:       RIPE".to_string()
            }
        );
    }

    #[test]
    fn test_missing_anchor_in_crlf_text() {
        let err = extract("a:\n#{R.X}\nb: #{R.Y}\nc:", "a:\r\nx\r\nb: y\r\nd: z\r\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::NoMatch {
                anchor: "\nc:".to_string()
            }
        );
    }

    #[test]
    fn test_literal_only_template() {
        assert!(extract("status:       ACTIVE", "x\nstatus:       ACTIVE\n").unwrap().is_empty());
        assert!(extract("status:       ACTIVE", "status:       INACTIVE").is_err());
    }

    #[test]
    fn test_repeated_lines_collected() {
        let template = Template::compile("nserver:      #{Root.NameServers}\n\nwhois:").unwrap();
        let matcher = Matcher::new(&template, |p| p.raw == "Root.NameServers").unwrap();
        let text = "nserver:      A.NS\nnserver:      B.NS\nnserver:      C.NS\n\nwhois:        x";

        let result = matcher.extract(text).unwrap();
        assert_eq!(result.values("Root.NameServers"), vec!["A.NS", "B.NS", "C.NS"]);
    }

    #[test]
    fn test_repeatable_value_spanning_lines() {
        let template = Template::compile("remarks: #{R.Notes}\n\nsource:").unwrap();
        let matcher = Matcher::new(&template, |p| p.raw == "R.Notes").unwrap();

        let result = matcher.extract("remarks: a\ncontinued\n\nsource: X").unwrap();
        assert_eq!(result.values("R.Notes"), vec!["a\ncontinued"]);

        let result = matcher.extract("remarks: a\nremarks: b\n\nsource: X").unwrap();
        assert_eq!(result.values("R.Notes"), vec!["a", "b"]);
    }

    #[test]
    fn test_repeated_lines_ignored_when_not_repeatable() {
        let template = Template::compile("nserver:      #{Root.NameServers}\n").unwrap();
        let text = "nserver:      A.NS\nnserver:      B.NS\n";

        let result = Matcher::single(&template).unwrap().extract(text).unwrap();
        assert_eq!(result.values("Root.NameServers"), vec!["A.NS"]);
    }

    #[test]
    fn test_template_repeat_captured_per_position() {
        let result = extract("a: #{R.X}\nb: #{R.X}\n", "a: one\nb: two\n").unwrap();
        assert_eq!(result.values("R.X"), vec!["one", "two"]);
    }
}
