//! Path templates with typed placeholders.
//!
//! A template such as `/users/{user_id:int}/items/{item_id}` compiles into a
//! [`PathPattern`]: a list of literal and placeholder segments. Matching a
//! request path against a pattern only checks its *shape* and collects the
//! raw placeholder values; type coercion happens later, in the binder, so
//! that a malformed value produces a 422 instead of a 404.

use std::collections::HashSet;
use std::fmt;

use crate::error::CoreError;

/// Declared type of a path placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParamKind {
    /// 64-bit signed integer.
    Int,
    /// Any non-empty segment.
    Str,
    /// The remainder of the path, slashes included. Only valid last.
    Path,
    /// A closed set of string constants, in declaration order.
    Enum(Vec<String>),
}

impl ParamKind {
    fn parse(spec: &str) -> Result<Self, String> {
        match spec {
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "path" => Ok(Self::Path),
            _ => {
                let Some(inner) = spec
                    .strip_prefix("enum(")
                    .and_then(|rest| rest.strip_suffix(')'))
                else {
                    return Err(format!("unknown placeholder type '{spec}'"));
                };
                let members: Vec<String> =
                    inner.split(',').map(|m| m.trim().to_owned()).collect();
                if members.iter().any(String::is_empty) {
                    return Err("enum members must be non-empty".to_owned());
                }
                let mut seen = HashSet::new();
                if let Some(dup) = members.iter().find(|m| !seen.insert(m.as_str())) {
                    return Err(format!("enum member '{dup}' declared twice"));
                }
                Ok(Self::Enum(members))
            }
        }
    }
}

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param { name: String, kind: ParamKind },
}

impl Segment {
    /// Precedence rank at one position: lower wins.
    fn rank(&self) -> u8 {
        match self {
            Self::Literal(_) => 0,
            Self::Param {
                kind: ParamKind::Path,
                ..
            } => 2,
            Self::Param { .. } => 1,
        }
    }
}

/// A placeholder value captured from a request path, not yet coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub name: String,
    pub raw: String,
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a template.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidTemplate`] if the template does not start
    /// with `/`, has a malformed or duplicated placeholder, or places a
    /// `path` placeholder anywhere but last.
    pub fn parse(template: &str) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidTemplate {
            template: template.to_owned(),
            reason,
        };

        let Some(body) = template.strip_prefix('/') else {
            return Err(invalid("template must start with '/'".to_owned()));
        };

        let raw_segments: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut names = HashSet::new();

        for (index, raw) in raw_segments.iter().enumerate() {
            let segment = parse_segment(raw).map_err(invalid)?;
            if let Segment::Param { name, kind } = &segment {
                if !names.insert(name.clone()) {
                    return Err(invalid(format!("placeholder '{name}' declared twice")));
                }
                if *kind == ParamKind::Path && index + 1 != raw_segments.len() {
                    return Err(invalid(format!(
                        "path placeholder '{name}' must be the last segment"
                    )));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            template: template.to_owned(),
            segments,
        })
    }

    /// The template this pattern was compiled from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names and kinds, in template order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamKind)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param { name, kind } => Some((name.as_str(), kind)),
            Segment::Literal(_) => None,
        })
    }

    /// Per-segment precedence key. Lexicographically smaller is more specific.
    #[must_use]
    pub fn rank(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }

    /// Return `true` if both patterns accept exactly the same set of paths.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param { .. }, Segment::Param { .. }) => a.rank() == b.rank(),
                    _ => false,
                })
    }

    /// Match already-split, decoded path segments against this pattern.
    ///
    /// Returns the raw placeholder captures on a structural match. A regular
    /// placeholder needs a non-empty segment; a `path` placeholder takes the
    /// rest of the path, which may be empty.
    #[must_use]
    pub fn captures(&self, path: &[&str]) -> Option<Vec<Capture>> {
        let mut captures = Vec::new();
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if *path.get(index)? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param {
                    name,
                    kind: ParamKind::Path,
                } => {
                    let rest = path.get(index..).filter(|rest| !rest.is_empty())?;
                    captures.push(Capture {
                        name: name.clone(),
                        raw: rest.join("/"),
                    });
                    return Some(captures);
                }
                Segment::Param { name, .. } => {
                    let value = path.get(index).filter(|value| !value.is_empty())?;
                    captures.push(Capture {
                        name: name.clone(),
                        raw: (*value).to_owned(),
                    });
                }
            }
        }
        (path.len() == self.segments.len()).then_some(captures)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn parse_segment(raw: &str) -> Result<Segment, String> {
    let Some(inner) = raw.strip_prefix('{') else {
        if raw.contains(['{', '}']) {
            return Err(format!("placeholder in '{raw}' must span the whole segment"));
        }
        return Ok(Segment::Literal(raw.to_owned()));
    };
    let Some(inner) = inner.strip_suffix('}') else {
        return Err(format!("unclosed placeholder '{raw}'"));
    };
    if inner.contains(['{', '}']) {
        return Err(format!("nested braces in '{raw}'"));
    }

    let (name, kind) = match inner.split_once(':') {
        Some((name, spec)) => (name, ParamKind::parse(spec)?),
        None => (inner, ParamKind::Str),
    };
    if !is_identifier(name) {
        return Err(format!("invalid placeholder name '{name}'"));
    }
    Ok(Segment::Param {
        name: name.to_owned(),
        kind,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
