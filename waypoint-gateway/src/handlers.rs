//! Request handlers.
//!
//! Every handler is a pure function of its validated inputs. Validation has
//! already happened in the binder, so a handler only fails when it asks for
//! a parameter its route never declared.

use serde_json::{json, Map, Value};
use waypoint_core::{Bound, CoreError};

/// Result type shared by all handlers.
pub type HandlerResult = Result<Value, CoreError>;

/// Read-only sample data served by [`list_items`].
pub const SAMPLE_ITEMS: [&str; 3] = ["Foo", "Bar", "Baz"];

/// Item ids returned by [`new_items`] and [`required_query`].
pub const LISTED_ITEM_IDS: [&str; 2] = ["Foo", "Bar"];

/// Attached to item details unless the caller asks for the short form.
pub const LONG_DESCRIPTION: &str = "This is an amazing item that has a long description";

/// Substituted by [`create_item`] when the client sent no description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Substituted by [`create_item`] when the client did send a description.
pub const WITHHELD_DESCRIPTION: &str = "Description withheld";

/// Known models for `/models/{model_name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelName {
    Alexnet,
    Resnet,
    Lenet,
}

impl ModelName {
    pub const ALL: [Self; 3] = [Self::Alexnet, Self::Resnet, Self::Lenet];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alexnet => "alexnet",
            Self::Resnet => "resnet",
            Self::Lenet => "lenet",
        }
    }

    #[must_use]
    pub fn from_member(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.as_str() == value)
    }

    /// Comma-separated members, as used in an `enum(...)` placeholder.
    #[must_use]
    pub fn members() -> String {
        Self::ALL.map(Self::as_str).join(",")
    }
}

/// `GET /`
pub fn root(_bound: &Bound) -> HandlerResult {
    Ok(json!({"message": "Hello World"}))
}

/// `GET /user/me`
pub fn user_me(_bound: &Bound) -> HandlerResult {
    Ok(json!({"user_id": "current user"}))
}

/// `GET /user/{user_id:int}`
pub fn user_by_id(bound: &Bound) -> HandlerResult {
    let user_id = bound.path().int("user_id")?;
    Ok(json!({"user_id": user_id}))
}

/// `GET /models/{model_name}`
///
/// Only alexnet and lenet get their own message; resnet shares "other".
pub fn model(bound: &Bound) -> HandlerResult {
    let raw = bound.path().str("model_name")?;
    let model = ModelName::from_member(raw).ok_or_else(|| CoreError::ParamType {
        name: "model_name".to_owned(),
        expected: "ModelName",
        actual: "str",
    })?;

    let message = if model == ModelName::Alexnet {
        "Deep Learning!"
    } else if model == ModelName::Lenet {
        "AAAA!"
    } else {
        "other"
    };
    Ok(json!({"model_name": model.as_str(), "message": message}))
}

/// `GET /files/{file_path:path}`
pub fn file_path(bound: &Bound) -> HandlerResult {
    let file_path = bound.path().str("file_path")?;
    Ok(json!({"file_path": file_path}))
}

/// `GET /items/?skip&limit`
pub fn list_items(bound: &Bound) -> HandlerResult {
    let skip = bound.query().int("skip")?;
    let limit = bound.query().int("limit")?;
    let page: Vec<Value> = slice_clamped(&SAMPLE_ITEMS, skip, skip.saturating_add(limit))
        .iter()
        .map(|name| json!({"item_name": name}))
        .collect();
    Ok(Value::Array(page))
}

/// `GET /query/{item_id}?q`
pub fn query_item(bound: &Bound) -> HandlerResult {
    let mut item = Map::new();
    item.insert("item_id".to_owned(), json!(bound.path().str("item_id")?));
    attach_query(&mut item, bound)?;
    Ok(Value::Object(item))
}

/// `GET /query2/{item_id}?q&short`
pub fn query_item_verbose(bound: &Bound) -> HandlerResult {
    let mut item = Map::new();
    item.insert("item_id".to_owned(), json!(bound.path().str("item_id")?));
    attach_query(&mut item, bound)?;
    attach_description(&mut item, bound)?;
    Ok(Value::Object(item))
}

/// `GET /users/{user_id:int}/items/{item_id}?q&short`
pub fn user_item(bound: &Bound) -> HandlerResult {
    let mut item = Map::new();
    item.insert("item_id".to_owned(), json!(bound.path().str("item_id")?));
    item.insert("owner_id".to_owned(), json!(bound.path().int("user_id")?));
    attach_query(&mut item, bound)?;
    attach_description(&mut item, bound)?;
    Ok(Value::Object(item))
}

/// `GET /query-items/{item_id}?needy`
pub fn needy_item(bound: &Bound) -> HandlerResult {
    Ok(json!({
        "item_id": bound.path().str("item_id")?,
        "needy": bound.query().str("needy")?,
    }))
}

/// `POST /items/`
///
/// The response never echoes the client's description: it is replaced by
/// one of two fixed strings depending on whether one was supplied.
pub fn create_item(bound: &Bound) -> HandlerResult {
    let item = bound.item()?;
    let description = match item.description() {
        None | Some("") => DEFAULT_DESCRIPTION,
        Some(_) => WITHHELD_DESCRIPTION,
    };
    let mut body = item.snapshot();
    body.insert("description".to_owned(), json!(description));
    Ok(Value::Object(body))
}

/// `POST /cart/`
pub fn add_to_cart(bound: &Bound) -> HandlerResult {
    let item = bound.item()?;
    let mut body = item.snapshot();
    if let Some(tax) = item.tax().filter(|tax| tax.abs() > 0.0) {
        body.insert("price_with_tax".to_owned(), json!(item.price() + tax));
    }
    Ok(Value::Object(body))
}

/// `GET /new-items/?q`
pub fn new_items(bound: &Bound) -> HandlerResult {
    listed_items(bound.query().opt_str("q")?)
}

/// `GET /query-required/?q`
pub fn required_query(bound: &Bound) -> HandlerResult {
    listed_items(Some(bound.query().str("q")?))
}

fn listed_items(q: Option<&str>) -> HandlerResult {
    let items: Vec<Value> = LISTED_ITEM_IDS
        .iter()
        .map(|id| json!({"item_id": id}))
        .collect();
    let mut results = Map::new();
    results.insert("items".to_owned(), Value::Array(items));
    if let Some(q) = q.filter(|q| !q.is_empty()) {
        results.insert("q".to_owned(), json!(q));
    }
    Ok(Value::Object(results))
}

fn attach_query(item: &mut Map<String, Value>, bound: &Bound) -> Result<(), CoreError> {
    if let Some(q) = bound.query().opt_str("q")?.filter(|q| !q.is_empty()) {
        item.insert("q".to_owned(), json!(q));
    }
    Ok(())
}

fn attach_description(item: &mut Map<String, Value>, bound: &Bound) -> Result<(), CoreError> {
    if !bound.query().flag("short")? {
        item.insert("description".to_owned(), json!(LONG_DESCRIPTION));
    }
    Ok(())
}

/// Slice `items[start..stop]` with sequence-slice semantics: negative
/// indices count from the end and out-of-range bounds are clamped, so the
/// result may be shorter or empty but never an error.
#[must_use]
pub fn slice_clamped<T>(items: &[T], start: i64, stop: i64) -> &[T] {
    let start = clamp_index(start, items.len());
    let stop = clamp_index(stop, items.len());
    items.get(start..stop).unwrap_or(&[])
}

fn clamp_index(index: i64, len: usize) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if index < 0 {
        (index + len).max(0)
    } else {
        index.min(len)
    };
    usize::try_from(resolved).unwrap_or(0)
}
