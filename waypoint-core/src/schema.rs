//! Request-body schemas.

use serde_json::{Map, Value};

use crate::error::{FieldError, Location, Source};

/// Body schemas a route can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BodySchema {
    Item,
}

impl BodySchema {
    /// Decode and validate a raw body against this schema.
    ///
    /// # Errors
    /// Returns every field that failed validation.
    pub fn decode(self, bytes: &[u8]) -> Result<Item, Vec<FieldError>> {
        match self {
            Self::Item => Item::decode(bytes),
        }
    }
}

/// A catalogue item as posted by clients.
///
/// Values are validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    name: String,
    description: Option<String>,
    price: f64,
    tax: Option<f64>,
}

impl Item {
    /// Decode an `Item` from a JSON body.
    ///
    /// # Errors
    /// An empty body, invalid JSON, or a non-object yields a single error at
    /// `["body"]`; otherwise every failing field is reported.
    pub fn decode(bytes: &[u8]) -> Result<Self, Vec<FieldError>> {
        let whole = Location::whole(Source::Body);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(vec![FieldError::missing(whole)]);
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| vec![FieldError::json_invalid(whole, &e.to_string())])?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON value. Unknown fields are ignored.
    ///
    /// # Errors
    /// Returns every failing field.
    pub fn from_value(value: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(object) = value.as_object() else {
            return Err(vec![FieldError::not_an_object(Location::whole(Source::Body))]);
        };

        let mut errors = Vec::new();
        let name = required(object, "name", string_field, &mut errors);
        let description = optional(object, "description", string_field, &mut errors);
        let price = required(object, "price", number_field, &mut errors);
        let tax = optional(object, "tax", number_field, &mut errors);

        match (name, description, price, tax) {
            (Some(name), Some(description), Some(price), Some(tax)) if errors.is_empty() => {
                Ok(Self {
                    name,
                    description,
                    price,
                    tax,
                })
            }
            _ => Err(errors),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` when the client omitted the field or sent `null`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub fn tax(&self) -> Option<f64> {
        self.tax
    }

    /// Every field mapped to its value, absent optionals as `null`.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_owned(), Value::from(self.name.clone()));
        map.insert(
            "description".to_owned(),
            self.description.clone().map_or(Value::Null, Value::from),
        );
        map.insert("price".to_owned(), Value::from(self.price));
        map.insert("tax".to_owned(), self.tax.map_or(Value::Null, Value::from));
        map
    }
}

fn required<T>(
    object: &Map<String, Value>,
    field: &str,
    parse: impl FnOnce(&Value, Location) -> Result<T, FieldError>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let loc = Location::field(Source::Body, field);
    let Some(value) = object.get(field) else {
        errors.push(FieldError::missing(loc));
        return None;
    };
    parse(value, loc).map_err(|e| errors.push(e)).ok()
}

/// The outer `Option` is validity, the inner one is presence.
fn optional<T>(
    object: &Map<String, Value>,
    field: &str,
    parse: impl FnOnce(&Value, Location) -> Result<T, FieldError>,
    errors: &mut Vec<FieldError>,
) -> Option<Option<T>> {
    match object.get(field) {
        None | Some(Value::Null) => Some(None),
        Some(value) => parse(value, Location::field(Source::Body, field))
            .map(Some)
            .map_err(|e| errors.push(e))
            .ok(),
    }
}

fn string_field(value: &Value, loc: Location) -> Result<String, FieldError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| FieldError::string_type(loc))
}

fn number_field(value: &Value, loc: Location) -> Result<f64, FieldError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| FieldError::float_type(loc)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| FieldError::float_parsing(loc)),
        _ => Err(FieldError::float_type(loc)),
    }
}
