//! Route template compilation into resource patterns.
//!
//! # Purpose
//! Turns declarative route templates (`/users/:userId`) into anchored,
//! case-insensitive regular expressions used to decide whether a concrete
//! request path is governed by a permission.
//!
//! # Key invariants
//! - Compilation is deterministic: one template always yields the same
//!   stored pattern string.
//! - Named parameters consume exactly one non-empty path segment; values are
//!   never type-checked.
//! - A trailing slash on the request path is tolerated.
//!
//! # Examples
//! ```rust
//! use warden_iam::ResourcePattern;
//!
//! let pattern = ResourcePattern::compile("/users/:userId", Some("/api")).unwrap();
//! assert_eq!(pattern.as_str(), "^/api/users/([^/]+?)/?$");
//! assert_eq!(pattern.matches("/api/users/42"), Some(true));
//! assert_eq!(pattern.matches("/api/users"), Some(false));
//! ```
//!
//! # Common pitfalls
//! - Parameters must span a whole segment; `/files/:name.json` is rejected.
//! - Patterns loaded from storage may be malformed; they are kept but report
//!   `None` from [`ResourcePattern::matches`] so callers can skip them.
use crate::{IamError, IamResult};
use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Compiled resource matcher plus its stable string form.
#[derive(Debug, Clone)]
pub struct ResourcePattern {
    source: String,
    matcher: Option<Regex>,
}

impl ResourcePattern {
    /// Compile a route template, optionally rooted under `prefix`.
    ///
    /// # Errors
    /// - [`IamError::PatternCompile`] when the template is not absolute, has
    ///   an empty or invalid parameter name, repeats a parameter name, or
    ///   mixes a parameter with static text in one segment.
    pub fn compile(template: &str, prefix: Option<&str>) -> IamResult<Self> {
        let full = normalize_template(template, prefix)?;
        let source = template_regex(&full)?;
        let matcher =
            build_matcher(&source).map_err(|err| IamError::pattern(&full, err.to_string()))?;
        Ok(Self {
            source,
            matcher: Some(matcher),
        })
    }

    /// Rebuild a pattern from its stored string form.
    ///
    /// Never fails; a source that does not parse is kept and reported as
    /// unusable.
    pub fn from_stored(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = match build_matcher(&source) {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                tracing::warn!(
                    pattern = %source,
                    error = %err,
                    "stored resource pattern does not compile"
                );
                None
            }
        };
        Self { source, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_usable(&self) -> bool {
        self.matcher.is_some()
    }

    /// Test a concrete request path. `None` means the pattern is unusable.
    pub fn matches(&self, path: &str) -> Option<bool> {
        self.matcher.as_ref().map(|matcher| matcher.is_match(path))
    }
}

impl PartialEq for ResourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ResourcePattern {}

impl std::fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for ResourcePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Join `prefix` and `template` into a canonical absolute template.
///
/// Duplicate slashes collapse and the trailing slash is dropped, except for
/// the root template `/`.
pub fn normalize_template(template: &str, prefix: Option<&str>) -> IamResult<String> {
    if !template.starts_with('/') {
        return Err(IamError::pattern(template, "template must start with '/'"));
    }
    let prefix = prefix.unwrap_or_default();
    if !prefix.is_empty() && !prefix.starts_with('/') {
        return Err(IamError::pattern(prefix, "prefix must start with '/'"));
    }

    let mut joined = String::with_capacity(prefix.len() + template.len());
    for segment in prefix
        .split('/')
        .chain(template.split('/'))
        .filter(|segment| !segment.is_empty())
    {
        joined.push('/');
        joined.push_str(segment);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    Ok(joined)
}

fn template_regex(template: &str) -> IamResult<String> {
    let mut body = String::from("^");
    let mut names = HashSet::new();

    for segment in template.split('/').filter(|segment| !segment.is_empty()) {
        if let Some(name) = segment.strip_prefix(':') {
            let (name, optional) = match name.strip_suffix('?') {
                Some(name) => (name, true),
                None => (name, false),
            };
            if name.is_empty() {
                return Err(IamError::pattern(template, "empty parameter name"));
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(IamError::pattern(
                    template,
                    format!("invalid parameter name {name:?}"),
                ));
            }
            if !names.insert(name) {
                return Err(IamError::pattern(
                    template,
                    format!("duplicate parameter name {name:?}"),
                ));
            }
            if optional {
                body.push_str("(?:/([^/]+?))?");
            } else {
                body.push_str("/([^/]+?)");
            }
            continue;
        }

        if segment == "*" {
            body.push_str("/(.*)");
            continue;
        }
        if segment.contains(':') || segment.contains('*') {
            return Err(IamError::pattern(
                template,
                format!("segment {segment:?} mixes parameters with static text"),
            ));
        }
        body.push('/');
        body.push_str(&regex::escape(segment));
    }

    body.push_str("/?$");
    Ok(body)
}

fn build_matcher(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}
