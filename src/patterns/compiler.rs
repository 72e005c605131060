//! # Pattern compiler
//!
//! Turns an event spec into a storage key and, for patterns, a compiled matcher.
//!
//! ## Glob rules
//! - `*` matches any run of characters (compiled to `(.*)`).
//! - `\*` is a literal star.
//! - `. $ [ ] ( ) ? +` are escaped unless already preceded by `\`.
//! - `^` is left as is, so `"^user.*"` anchors at the start.
//! - Globs are **not** anchored: matching is a search, so `"user.*"` also
//!   matches `"old.user.created"`.
//!
//! ## Regex rules
//! A spec starting with `~` is used verbatim (minus the `~`) as the
//! expression body. Bodies that are not already wrapped in `/.../` get wrapped.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use crate::error::EmitError;

/// Characters whose presence turns a spec into a pattern.
const SENTINELS: &[char] = &['~', '*', '^', '$', '?', '(', ')', '[', ']'];

/// Characters escaped while translating a glob.
///
/// Braces are always literal in a glob; the regex engine rejects a stray `{`.
const GLOB_ESCAPED: &[char] = &['.', '$', '[', ']', '(', ')', '?', '+', '{', '}'];

const DELIMITER: char = '/';

/// Returns `true` if `spec` would be stored in a pattern group.
#[inline]
pub fn is_pattern(spec: &str) -> bool {
    spec.contains(SENTINELS)
}

/// Returns the storage key of `spec` without compiling it.
///
/// Literal specs are returned borrowed; patterns return their delimited
/// regular expression source.
///
/// # Example
/// ```
/// use wildemit::pattern_key;
///
/// assert_eq!(pattern_key("user.created"), "user.created");
/// assert_eq!(pattern_key("user.*"), r"/user\.(.*)/");
/// assert_eq!(pattern_key("~^a.b$"), "/^a.b$/");
/// ```
pub fn pattern_key(spec: &str) -> Cow<'_, str> {
    if !is_pattern(spec) {
        return Cow::Borrowed(spec);
    }

    let body = match spec.strip_prefix('~') {
        Some(regex) => regex.to_owned(),
        None => translate_glob(spec),
    };

    if is_delimited(&body) {
        Cow::Owned(body)
    } else {
        Cow::Owned(format!("{DELIMITER}{body}{DELIMITER}"))
    }
}

fn translate_glob(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    let mut prev = None;

    for c in glob.chars() {
        let escaped = prev == Some('\\');
        match c {
            '*' if escaped => out.push('*'),
            '*' => out.push_str("(.*)"),
            c if GLOB_ESCAPED.contains(&c) && !escaped => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        prev = Some(c);
    }
    out
}

fn is_delimited(source: &str) -> bool {
    source.len() >= 2 && source.starts_with(DELIMITER) && source.ends_with(DELIMITER)
}

/// Compiled regular expression used by the pattern groups.
///
/// Two matchers are the same key when their delimited sources are equal.
#[derive(Clone, Debug)]
pub struct Matcher {
    source: String,
    regex: Regex,
}

impl Matcher {
    /// Delimited source, e.g. `"/user\.(.*)/"`. This is the registry key.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the expression finds a match anywhere in `event`.
    #[inline]
    pub fn is_match(&self, event: &str) -> bool {
        self.regex.is_match(event)
    }
}

/// Result of compiling an event spec.
#[derive(Clone, Debug)]
pub struct CompiledSpec {
    key: String,
    matcher: Option<Matcher>,
}

impl CompiledSpec {
    /// Registry key: the literal name, or the delimited pattern source.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this spec belongs in a pattern group.
    #[inline]
    pub fn is_pattern(&self) -> bool {
        self.matcher.is_some()
    }

    /// The compiled matcher for pattern specs.
    #[inline]
    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<Matcher>) {
        (self.key, self.matcher)
    }
}

/// Compiles event specs into registry keys and matchers.
///
/// ## Example
/// ```
/// use wildemit::PatternCompiler;
///
/// let compiled = PatternCompiler::default().compile("user.*").unwrap();
/// let matcher = compiled.matcher().unwrap();
/// assert!(matcher.is_match("user.created"));
/// assert!(!matcher.is_match("order.created"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternCompiler {
    size_limit: Option<usize>,
}

impl PatternCompiler {
    /// Creates a compiler with the given regex size limit (`0` = engine default).
    pub fn new(size_limit: usize) -> Self {
        Self {
            size_limit: (size_limit > 0).then_some(size_limit),
        }
    }

    /// Compiles `spec`.
    ///
    /// Literal specs never fail. Pattern specs fail with
    /// [`EmitError::InvalidPattern`] when the resulting expression is rejected
    /// by the regex engine.
    pub fn compile(&self, spec: &str) -> Result<CompiledSpec, EmitError> {
        let key = pattern_key(spec);
        if !is_pattern(spec) {
            return Ok(CompiledSpec {
                key: key.into_owned(),
                matcher: None,
            });
        }

        let source = key.into_owned();
        let body = &source[DELIMITER.len_utf8()..source.len() - DELIMITER.len_utf8()];

        let mut builder = RegexBuilder::new(body);
        if let Some(limit) = self.size_limit {
            builder.size_limit(limit);
        }
        let regex = builder.build().map_err(|source| EmitError::InvalidPattern {
            spec: spec.to_owned(),
            source,
        })?;

        Ok(CompiledSpec {
            key: source.clone(),
            matcher: Some(Matcher { source, regex }),
        })
    }
}
