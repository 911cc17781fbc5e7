//! Path and query parameter declarations, coercion, and bound values.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{CoreError, FieldError, Location, Source};
use crate::pattern::{Capture, ParamKind, PathPattern};

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

/// Declared type of a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryKind {
    Int,
    Str,
    Bool,
}

impl QueryKind {
    fn accepts(self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (Self::Int, ParamValue::Int(_))
                | (Self::Str, ParamValue::Str(_))
                | (Self::Bool, ParamValue::Bool(_))
        )
    }
}

/// What happens when a query parameter is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// Absence is a `missing` field error.
    Required,
    /// Absence binds to "no value", distinct from an empty string.
    Optional,
    /// Absence binds to this value.
    Default(ParamValue),
}

/// Declaration of one query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    name: String,
    kind: QueryKind,
    presence: Presence,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl QueryParam {
    fn new(name: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            presence: Presence::Required,
            min_length: None,
            max_length: None,
        }
    }

    /// A required integer parameter.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, QueryKind::Int)
    }

    /// A required string parameter.
    pub fn str(name: impl Into<String>) -> Self {
        Self::new(name, QueryKind::Str)
    }

    /// A required boolean parameter.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, QueryKind::Bool)
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.presence = Presence::Default(value.into());
        self
    }

    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that the declaration is self-consistent.
    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidQueryParam {
            name: self.name.clone(),
            reason: reason.to_owned(),
        };
        if let Presence::Default(value) = &self.presence {
            if !self.kind.accepts(value) {
                return Err(invalid("default value does not match the declared type"));
            }
        }
        if (self.min_length.is_some() || self.max_length.is_some()) && self.kind != QueryKind::Str {
            return Err(invalid("length constraints only apply to strings"));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(invalid("min_length exceeds max_length"));
            }
        }
        Ok(())
    }

    fn bind(&self, raw: Option<&str>) -> Result<Option<ParamValue>, FieldError> {
        let loc = || Location::field(Source::Query, self.name.clone());
        let Some(raw) = raw else {
            return match &self.presence {
                Presence::Required => Err(FieldError::missing(loc())),
                Presence::Optional => Ok(None),
                Presence::Default(value) => Ok(Some(value.clone())),
            };
        };

        let value = match self.kind {
            QueryKind::Int => {
                ParamValue::Int(parse_int(raw).ok_or_else(|| FieldError::int_parsing(loc()))?)
            }
            QueryKind::Bool => {
                ParamValue::Bool(parse_bool(raw).ok_or_else(|| FieldError::bool_parsing(loc()))?)
            }
            QueryKind::Str => {
                let len = raw.chars().count();
                if let Some(min) = self.min_length.filter(|min| len < *min) {
                    return Err(FieldError::too_short(loc(), min));
                }
                if let Some(max) = self.max_length.filter(|max| len > *max) {
                    return Err(FieldError::too_long(loc(), max));
                }
                ParamValue::Str(raw.to_owned())
            }
        };
        Ok(Some(value))
    }
}

/// Bound values for one request location, in declaration order.
///
/// An optional parameter that was not supplied is present with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: IndexMap<String, Option<ParamValue>>,
}

impl Params {
    fn insert(&mut self, name: impl Into<String>, value: Option<ParamValue>) {
        self.values.insert(name.into(), value);
    }

    /// The bound value, `None` when an optional parameter was absent.
    ///
    /// # Errors
    /// Returns [`CoreError::UndeclaredParam`] if `name` was never declared.
    pub fn get(&self, name: &str) -> Result<Option<&ParamValue>, CoreError> {
        self.values
            .get(name)
            .map(Option::as_ref)
            .ok_or_else(|| CoreError::UndeclaredParam {
                name: name.to_owned(),
            })
    }

    /// # Errors
    /// Returns a [`CoreError`] if `name` is undeclared, absent, or not an integer.
    pub fn int(&self, name: &str) -> Result<i64, CoreError> {
        match self.require(name, "int")? {
            ParamValue::Int(value) => Ok(*value),
            other => Err(mistyped(name, "int", other)),
        }
    }

    /// # Errors
    /// Returns a [`CoreError`] if `name` is undeclared, absent, or not a string.
    pub fn str(&self, name: &str) -> Result<&str, CoreError> {
        match self.require(name, "str")? {
            ParamValue::Str(value) => Ok(value.as_str()),
            other => Err(mistyped(name, "str", other)),
        }
    }

    /// # Errors
    /// Returns a [`CoreError`] if `name` is undeclared or not a string.
    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, CoreError> {
        match self.get(name)? {
            None => Ok(None),
            Some(ParamValue::Str(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(mistyped(name, "str", other)),
        }
    }

    /// # Errors
    /// Returns a [`CoreError`] if `name` is undeclared, absent, or not a boolean.
    pub fn flag(&self, name: &str) -> Result<bool, CoreError> {
        match self.require(name, "bool")? {
            ParamValue::Bool(value) => Ok(*value),
            other => Err(mistyped(name, "bool", other)),
        }
    }

    fn require(&self, name: &str, expected: &'static str) -> Result<&ParamValue, CoreError> {
        self.get(name)?.ok_or_else(|| CoreError::ParamType {
            name: name.to_owned(),
            expected,
            actual: "absent",
        })
    }
}

fn mistyped(name: &str, expected: &'static str, actual: &ParamValue) -> CoreError {
    CoreError::ParamType {
        name: name.to_owned(),
        expected,
        actual: actual.type_name(),
    }
}

/// Coerce raw path captures according to the pattern's declared kinds.
///
/// Every capture is checked; all failures are pushed onto `errors`.
pub(crate) fn bind_path(
    pattern: &PathPattern,
    captures: Vec<Capture>,
    errors: &mut Vec<FieldError>,
) -> Params {
    let kinds: HashMap<&str, &ParamKind> = pattern.params().collect();
    let mut params = Params::default();

    for Capture { name, raw } in captures {
        let loc = || Location::field(Source::Path, name.clone());
        let value = match kinds.get(name.as_str()) {
            Some(ParamKind::Int) => match parse_int(&raw) {
                Some(value) => ParamValue::Int(value),
                None => {
                    errors.push(FieldError::int_parsing(loc()));
                    continue;
                }
            },
            Some(ParamKind::Enum(members)) => {
                if !members.iter().any(|m| *m == raw) {
                    errors.push(FieldError::not_a_member(loc(), members));
                    continue;
                }
                ParamValue::Str(raw)
            }
            _ => ParamValue::Str(raw),
        };
        params.insert(name, Some(value));
    }
    params
}

/// Bind declared query parameters from a raw (still encoded) query string.
///
/// Repeated keys resolve to their last occurrence; undeclared keys are ignored.
pub(crate) fn bind_query(
    declared: &[QueryParam],
    query: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Params {
    let pairs: HashMap<String, String> = query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let mut params = Params::default();
    for param in declared {
        match param.bind(pairs.get(param.name()).map(String::as_str)) {
            Ok(value) => params.insert(param.name(), value),
            Err(e) => errors.push(e),
        }
    }
    params
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn bind(declared: &[QueryParam], query: &str) -> (Params, Vec<FieldError>) {
        let mut errors = Vec::new();
        let params = bind_query(declared, Some(query), &mut errors);
        (params, errors)
    }

    #[test]
    fn defaults_fill_absent_parameters() {
        let declared = [
            QueryParam::int("skip").with_default(0_i64),
            QueryParam::int("limit").with_default(10_i64),
        ];
        let (params, errors) = bind(&declared, "limit=2");
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(params.int("skip").ok(), Some(0));
        assert_eq!(params.int("limit").ok(), Some(2));
    }

    #[test]
    fn optional_keeps_absent_apart_from_empty() {
        let declared = [QueryParam::str("q").optional()];
        let (absent, _) = bind(&declared, "");
        assert_eq!(absent.opt_str("q").ok(), Some(None));

        let (empty, _) = bind(&declared, "q=");
        assert_eq!(empty.opt_str("q").ok(), Some(Some("")));
    }

    #[test]
    fn required_parameter_missing_is_reported() {
        let declared = [QueryParam::str("needy")];
        let (_, errors) = bind(&declared, "other=1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Missing);
        assert_eq!(errors[0].loc, Location::field(Source::Query, "needy"));
    }

    #[test]
    fn length_constraints_are_enforced() {
        let declared = [QueryParam::str("q").optional().min_length(3).max_length(5)];
        let (_, short) = bind(&declared, "q=ab");
        assert_eq!(short[0].kind, ErrorKind::StringTooShort);
        let (_, long) = bind(&declared, "q=abcdef");
        assert_eq!(long[0].kind, ErrorKind::StringTooLong);
        let (ok, errors) = bind(&declared, "q=abc");
        assert!(errors.is_empty());
        assert_eq!(ok.opt_str("q").ok(), Some(Some("abc")));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let declared = [QueryParam::str("q").max_length(3)];
        let (ok, errors) = bind(&declared, "q=%C3%A9%C3%A9%C3%A9");
        assert!(errors.is_empty(), "three characters fit: {errors:?}");
        assert_eq!(ok.str("q").ok(), Some("ééé"));
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let declared = [QueryParam::bool("short").with_default(false)];
        for (raw, expected) in [("true", true), ("1", true), ("Yes", true), ("off", false), ("0", false)] {
            let (params, errors) = bind(&declared, &format!("short={raw}"));
            assert!(errors.is_empty(), "{raw} should parse");
            assert_eq!(params.flag("short").ok(), Some(expected), "{raw}");
        }
        let (_, errors) = bind(&declared, "short=maybe");
        assert_eq!(errors[0].kind, ErrorKind::BoolParsing);
    }

    #[test]
    fn last_repeated_key_wins() {
        let declared = [QueryParam::int("limit")];
        let (params, _) = bind(&declared, "limit=1&limit=7");
        assert_eq!(params.int("limit").ok(), Some(7));
    }

    #[test]
    fn all_failures_are_collected() {
        let declared = [QueryParam::int("skip"), QueryParam::int("limit")];
        let (_, errors) = bind(&declared, "skip=x&limit=y");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn invalid_declarations_are_rejected() {
        assert!(QueryParam::int("skip").with_default("zero").validate().is_err());
        assert!(QueryParam::int("n").min_length(1).validate().is_err());
        assert!(QueryParam::str("q").min_length(5).max_length(3).validate().is_err());
        assert!(QueryParam::str("q").optional().min_length(3).validate().is_ok());
    }

    #[test]
    fn accessors_report_wiring_mistakes() {
        let declared = [QueryParam::str("q").optional()];
        let (params, _) = bind(&declared, "");
        assert!(matches!(params.int("nope"), Err(CoreError::UndeclaredParam { .. })));
        assert!(matches!(params.str("q"), Err(CoreError::ParamType { actual: "absent", .. })));
    }

    #[test]
    fn path_captures_are_coerced() {
        let pattern = match PathPattern::parse("/m/{id:int}/{model:enum(a,b)}") {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        };
        let caps = vec![
            Capture { name: "id".to_owned(), raw: "12".to_owned() },
            Capture { name: "model".to_owned(), raw: "b".to_owned() },
        ];
        let mut errors = Vec::new();
        let params = bind_path(&pattern, caps, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(params.int("id").ok(), Some(12));
        assert_eq!(params.str("model").ok(), Some("b"));

        let bad = vec![
            Capture { name: "id".to_owned(), raw: "twelve".to_owned() },
            Capture { name: "model".to_owned(), raw: "c".to_owned() },
        ];
        let mut errors = Vec::new();
        bind_path(&pattern, bad, &mut errors);
        let kinds: Vec<_> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::IntParsing, ErrorKind::Enum]);
    }
}
