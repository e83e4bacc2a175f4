//! Path patterns and their compiled matchers.
//!
//! A pattern is either a path string, an explicit list of [`Segment`]s, or a
//! pre-built [`Regex`]. Strings and segment lists share one grammar:
//!
//! ```ignore
//!  Syntax    Type
//!  literal   literal segment
//!  :name     named parameter, matches one segment
//!  :name?    optional named parameter
//!  *name     catch-all parameter, matches the rest of the path
//! ```
//!
//! Compilation honours the router's `case_sensitive` and `strict` options.
//! Regex patterns are used verbatim: named groups become parameter names and
//! unnamed groups are keyed by their zero-based position among unnamed groups.
use crate::error::{Error, Result};
use crate::router::RouterOptions;

use std::fmt;
use std::ops::Index;

use regex::Regex;

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal segment, compared according to the case-sensitivity option.
    Literal(String),
    /// A named parameter matching exactly one non-empty segment.
    Param(String),
    /// A named parameter that may be absent.
    Optional(String),
    /// A catch-all parameter matching the remainder of the path.
    Wildcard(String),
}

impl Segment {
    fn parse(segment: &str) -> Segment {
        if let Some(name) = segment.strip_prefix(':') {
            match name.strip_suffix('?') {
                Some(name) => Segment::Optional(name.to_owned()),
                None => Segment::Param(name.to_owned()),
            }
        } else if let Some(name) = segment.strip_prefix('*') {
            Segment::Wildcard(name.to_owned())
        } else {
            Segment::Literal(segment.to_owned())
        }
    }

    fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Param(name) | Segment::Optional(name) | Segment::Wildcard(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::Optional(name) => write!(f, ":{}?", name),
            Segment::Wildcard(name) => write!(f, "*{}", name),
        }
    }
}

/// The path a route is registered at. Immutable once handed to a route.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// A path string such as `/users/:id`.
    Path(String),
    /// An explicit sequence of segments.
    Segments(Vec<Segment>),
    /// A pre-built regular expression.
    Regex(Regex),
}

impl PathPattern {
    /// The pattern one level up, used to mount a collection above its members.
    ///
    /// The last non-empty segment is removed; a trailing slash removes the
    /// segment before it. The parent of a single segment is the root.
    /// ```rust
    /// use resource_router::PathPattern;
    ///
    /// let parent = PathPattern::from("/widgets/:id/").parent().unwrap();
    /// assert_eq!(parent.to_string(), "/widgets");
    /// ```
    pub fn parent(&self) -> Result<PathPattern> {
        match self {
            PathPattern::Path(path) => {
                let mut pieces: Vec<&str> = path.split('/').collect();
                if pieces.pop().map_or(false, str::is_empty) {
                    pieces.pop();
                }

                let parent = pieces.join("/");
                if parent.is_empty() {
                    Ok(PathPattern::Path("/".to_owned()))
                } else {
                    Ok(PathPattern::Path(parent))
                }
            }
            PathPattern::Segments(segments) => {
                let mut segments = segments.clone();
                segments.pop();
                Ok(PathPattern::Segments(segments))
            }
            PathPattern::Regex(regex) => Err(Error::InvalidPath(format!(
                "cannot derive a parent path from regex '{}'",
                regex
            ))),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(path: &str) -> Self {
        PathPattern::Path(path.to_owned())
    }
}

impl From<String> for PathPattern {
    fn from(path: String) -> Self {
        PathPattern::Path(path)
    }
}

impl From<Vec<Segment>> for PathPattern {
    fn from(segments: Vec<Segment>) -> Self {
        PathPattern::Segments(segments)
    }
}

impl From<Regex> for PathPattern {
    fn from(regex: Regex) -> Self {
        PathPattern::Regex(regex)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Path(path) => f.write_str(path),
            PathPattern::Segments(segments) if segments.is_empty() => f.write_str("/"),
            PathPattern::Segments(segments) => {
                for segment in segments {
                    write!(f, "/{}", segment)?;
                }
                Ok(())
            }
            PathPattern::Regex(regex) => f.write_str(regex.as_str()),
        }
    }
}

/// The compiled form of a [`PathPattern`]: a match test plus the ordered
/// parameter names its capture groups bind to.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    keys: Vec<String>,
}

impl Matcher {
    /// Compile `pattern` under the given options.
    pub fn compile(pattern: &PathPattern, options: &RouterOptions) -> Result<Matcher> {
        match pattern {
            PathPattern::Path(path) => {
                let (segments, trailing) = parse(path)?;
                compile_segments(&segments, trailing, options)
            }
            PathPattern::Segments(segments) => compile_segments(segments, false, options),
            PathPattern::Regex(regex) => Ok(Matcher {
                keys: regex_keys(regex),
                regex: regex.clone(),
            }),
        }
    }

    /// Returns true if `path` matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Parameter names in capture order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Extract and decode the parameters of `path`, or `None` if it does not
    /// match.
    ///
    /// When a name appears twice, a captured value overwrites an earlier one
    /// but an absent optional capture never does.
    pub fn params(&self, path: &str) -> Result<Option<Params>> {
        let captures = match self.regex.captures(path) {
            Some(captures) => captures,
            None => return Ok(None),
        };

        let mut params = Params::default();
        for (key, capture) in self.keys.iter().zip(captures.iter().skip(1)) {
            if let Some(capture) = capture {
                params.insert(key, decode_param(capture.as_str())?);
            }
        }

        Ok(Some(params))
    }
}

// splits a path string into segments and whether it ends with a slash
fn parse(path: &str) -> Result<(Vec<Segment>, bool)> {
    if path.is_empty() {
        return Ok((Vec::new(), false));
    }

    let rest = path.strip_prefix('/').ok_or_else(|| {
        Error::InvalidPath(format!("expected path beginning with '/', found: '{}'", path))
    })?;

    if rest.is_empty() {
        return Ok((Vec::new(), false));
    }

    let trailing = rest.ends_with('/');
    let body = rest.strip_suffix('/').unwrap_or(rest);
    if body.is_empty() || body.split('/').any(str::is_empty) {
        return Err(Error::InvalidPath(format!("empty segment in path: '{}'", path)));
    }

    Ok((body.split('/').map(Segment::parse).collect(), trailing))
}

fn validate(segments: &[Segment]) -> Result<()> {
    for (i, segment) in segments.iter().enumerate() {
        if let Segment::Literal(literal) = segment {
            if literal.contains('/') {
                return Err(Error::InvalidPath(format!(
                    "literal segment '{}' contains '/'",
                    literal
                )));
            }
            if literal.is_empty() {
                return Err(Error::InvalidPath("empty literal segment".to_owned()));
            }
        }

        if let Some(name) = segment.param_name() {
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(Error::InvalidPath(format!(
                    "invalid parameter name in segment '{}'",
                    segment
                )));
            }
        }

        if matches!(segment, Segment::Wildcard(_)) && i + 1 != segments.len() {
            return Err(Error::InvalidPath(format!(
                "catch-all '{}' must be the last segment",
                segment
            )));
        }
    }

    Ok(())
}

fn compile_segments(segments: &[Segment], trailing: bool, options: &RouterOptions) -> Result<Matcher> {
    validate(segments)?;

    let mut source = String::from(if options.case_sensitive { "^" } else { "(?i)^" });
    let mut keys = Vec::new();

    for segment in segments {
        match segment {
            Segment::Literal(literal) => {
                source.push('/');
                source.push_str(&regex::escape(literal));
            }
            Segment::Param(name) => {
                source.push_str("/([^/]+?)");
                keys.push(name.clone());
            }
            Segment::Optional(name) => {
                source.push_str("(?:/([^/]+?))?");
                keys.push(name.clone());
            }
            Segment::Wildcard(name) => {
                source.push_str("/(.*)");
                keys.push(name.clone());
            }
        }
    }

    if !options.strict {
        source.push_str("/?");
    } else if trailing || segments.is_empty() {
        source.push('/');
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|err| Error::InvalidPath(err.to_string()))?;
    Ok(Matcher { regex, keys })
}

fn regex_keys(regex: &Regex) -> Vec<String> {
    let mut unnamed = 0;
    regex
        .capture_names()
        .skip(1)
        .map(|name| match name {
            Some(name) => name.to_owned(),
            None => {
                unnamed += 1;
                (unnamed - 1).to_string()
            }
        })
        .collect()
}

/// Percent-decode a captured parameter.
///
/// Escapes must be well formed and decode to UTF-8; `+` is left as is.
pub fn decode_param(raw: &str) -> Result<String> {
    if !raw.contains('%') {
        return Ok(raw.to_owned());
    }

    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            decoded.push(bytes[i]);
            i += 1;
            continue;
        }

        let hi = bytes.get(i + 1).and_then(|&b| hex(b));
        let lo = bytes.get(i + 2).and_then(|&b| hex(b));
        match (hi, lo) {
            (Some(hi), Some(lo)) => decoded.push(hi << 4 | lo),
            _ => return Err(Error::DecodeParam(raw.to_owned())),
        }
        i += 3;
    }

    String::from_utf8(decoded).map_err(|_| Error::DecodeParam(raw.to_owned()))
}

fn hex(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).map(|digit| digit as u8)
}

/// A single decoded path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// The decoded parameters of a matched path, in capture order.
///
/// ```rust
/// # use resource_router::Params;
/// # let params = Params::default();
/// let user = params.get("user"); // defined by :user or *user
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: Vec<Param>,
}

impl Params {
    /// The value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|param| (param.key.as_str(), param.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn insert(&mut self, key: &str, value: String) {
        match self.params.iter_mut().find(|param| param.key == key) {
            Some(param) => param.value = value,
            None => self.params.push(Param {
                key: key.to_owned(),
                value,
            }),
        }
    }
}

impl Index<usize> for Params {
    type Output = Param;

    fn index(&self, i: usize) -> &Param {
        &self.params[i]
    }
}
