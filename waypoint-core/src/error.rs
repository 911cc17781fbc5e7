use std::fmt;

use http::Method;
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Errors produced by the `waypoint-core` crate.
///
/// These are programming or wiring errors, never client errors: a request that
/// fails validation produces [`FieldError`]s instead.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A route template could not be compiled.
    #[error("invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Two routes share a method and an identical segment shape.
    #[error("duplicate route {method} {template}")]
    DuplicateRoute { method: Method, template: String },

    /// A query parameter declaration is inconsistent, e.g. a default of the
    /// wrong type or a name declared twice.
    #[error("invalid query parameter '{name}': {reason}")]
    InvalidQueryParam { name: String, reason: String },

    /// A handler asked for a parameter its route never declared.
    #[error("parameter '{name}' is not declared on this route")]
    UndeclaredParam { name: String },

    /// A handler asked for a parameter as the wrong type.
    #[error("parameter '{name}' is bound as {actual}, not {expected}")]
    ParamType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A handler asked for a body on a route that declares none.
    #[error("route does not declare a request body")]
    MissingBody,
}

/// Where in the request a failing field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Source {
    Path,
    Query,
    Body,
}

impl Source {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a field error, serialized as `["query", "q"]` or `["body"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub source: Source,
    pub field: Option<String>,
}

impl Location {
    /// A named field inside `source`.
    pub fn field(source: Source, name: impl Into<String>) -> Self {
        Self {
            source,
            field: Some(name.into()),
        }
    }

    /// The whole of `source`, e.g. a body that is not JSON at all.
    #[must_use]
    pub const fn whole(source: Source) -> Self {
        Self {
            source,
            field: None,
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.field.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(self.source.as_str())?;
        if let Some(field) = &self.field {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}.{field}", self.source),
            None => write!(f, "{}", self.source),
        }
    }
}

/// Machine-readable category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorKind {
    Missing,
    IntParsing,
    BoolParsing,
    Enum,
    StringTooShort,
    StringTooLong,
    StringType,
    FloatType,
    FloatParsing,
    JsonInvalid,
    ModelAttributesType,
}

/// One field that failed validation.
///
/// This is the wire form of an `UnprocessableEntity` entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub loc: Location,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl FieldError {
    fn new(loc: Location, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind,
        }
    }

    #[must_use]
    pub fn missing(loc: Location) -> Self {
        Self::new(loc, ErrorKind::Missing, "Field required")
    }

    #[must_use]
    pub fn int_parsing(loc: Location) -> Self {
        Self::new(
            loc,
            ErrorKind::IntParsing,
            "Input should be a valid integer, unable to parse string as an integer",
        )
    }

    #[must_use]
    pub fn bool_parsing(loc: Location) -> Self {
        Self::new(
            loc,
            ErrorKind::BoolParsing,
            "Input should be a valid boolean, unable to interpret input",
        )
    }

    /// Membership failure; the message lists the permitted values in
    /// declaration order.
    #[must_use]
    pub fn not_a_member(loc: Location, members: &[String]) -> Self {
        let quoted: Vec<String> = members.iter().map(|m| format!("'{m}'")).collect();
        let listed = match quoted.split_last() {
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
            None => String::new(),
        };
        Self::new(loc, ErrorKind::Enum, format!("Input should be {listed}"))
    }

    #[must_use]
    pub fn too_short(loc: Location, min: usize) -> Self {
        Self::new(
            loc,
            ErrorKind::StringTooShort,
            format!("String should have at least {min} {}", characters(min)),
        )
    }

    #[must_use]
    pub fn too_long(loc: Location, max: usize) -> Self {
        Self::new(
            loc,
            ErrorKind::StringTooLong,
            format!("String should have at most {max} {}", characters(max)),
        )
    }

    #[must_use]
    pub fn string_type(loc: Location) -> Self {
        Self::new(loc, ErrorKind::StringType, "Input should be a valid string")
    }

    #[must_use]
    pub fn float_type(loc: Location) -> Self {
        Self::new(loc, ErrorKind::FloatType, "Input should be a valid number")
    }

    #[must_use]
    pub fn float_parsing(loc: Location) -> Self {
        Self::new(
            loc,
            ErrorKind::FloatParsing,
            "Input should be a valid number, unable to parse string as a number",
        )
    }

    #[must_use]
    pub fn json_invalid(loc: Location, detail: &str) -> Self {
        Self::new(
            loc,
            ErrorKind::JsonInvalid,
            format!("JSON decode error: {detail}"),
        )
    }

    #[must_use]
    pub fn not_an_object(loc: Location) -> Self {
        Self::new(
            loc,
            ErrorKind::ModelAttributesType,
            "Input should be a valid dictionary or object to extract fields from",
        )
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.loc, self.msg)
    }
}

fn characters(n: usize) -> &'static str {
    if n == 1 {
        "character"
    } else {
        "characters"
    }
}
