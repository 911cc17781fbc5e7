//! Route declarations and request binding.

use http::Method;

use crate::error::{CoreError, FieldError};
use crate::params::{bind_path, bind_query, Params, QueryParam};
use crate::pattern::{Capture, PathPattern};
use crate::schema::{BodySchema, Item};

/// Everything a route declares about its inputs, before compilation.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    method: Method,
    template: String,
    query: Vec<QueryParam>,
    body: Option<BodySchema>,
}

impl RouteSpec {
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(template: impl Into<String>) -> Self {
        Self::new(Method::GET, template)
    }

    pub fn post(template: impl Into<String>) -> Self {
        Self::new(Method::POST, template)
    }

    /// Declare a query parameter.
    #[must_use]
    pub fn query(mut self, param: QueryParam) -> Self {
        self.query.push(param);
        self
    }

    /// Declare the request body schema.
    #[must_use]
    pub fn body(mut self, schema: BodySchema) -> Self {
        self.body = Some(schema);
        self
    }

    pub(crate) fn compile<H>(self, handler: H) -> Result<Route<H>, CoreError> {
        let pattern = PathPattern::parse(&self.template)?;
        for (index, param) in self.query.iter().enumerate() {
            param.validate()?;
            if self.query[..index].iter().any(|p| p.name() == param.name()) {
                return Err(CoreError::InvalidQueryParam {
                    name: param.name().to_owned(),
                    reason: "declared twice".to_owned(),
                });
            }
        }
        let rank = pattern.rank();
        Ok(Route {
            method: self.method,
            pattern,
            rank,
            query: self.query,
            body: self.body,
            handler,
        })
    }
}

/// A compiled route: its pattern, declared inputs, and handler.
#[derive(Debug)]
pub struct Route<H> {
    method: Method,
    pattern: PathPattern,
    rank: Vec<u8>,
    query: Vec<QueryParam>,
    body: Option<BodySchema>,
    handler: H,
}

impl<H> Route<H> {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub(crate) fn rank(&self) -> &[u8] {
        &self.rank
    }

    /// `HEAD` is served by `GET` routes.
    pub(crate) fn accepts(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }

    /// Coerce path captures, query string, and body into typed inputs.
    ///
    /// The body is only read when the route declares a schema. Validation
    /// covers every location before reporting, so the error list names all
    /// failing fields at once.
    ///
    /// # Errors
    /// Returns every [`FieldError`] found.
    pub fn bind(
        &self,
        captures: Vec<Capture>,
        query: Option<&str>,
        body: &[u8],
    ) -> Result<Bound, Vec<FieldError>> {
        let mut errors = Vec::new();
        let path = bind_path(&self.pattern, captures, &mut errors);
        let query = bind_query(&self.query, query, &mut errors);
        let item = match self.body.map(|schema| schema.decode(body)) {
            None => None,
            Some(Ok(item)) => Some(item),
            Some(Err(body_errors)) => {
                errors.extend(body_errors);
                None
            }
        };

        if errors.is_empty() {
            Ok(Bound { path, query, item })
        } else {
            Err(errors)
        }
    }
}

/// Validated inputs for one request. Handlers only ever see this.
#[derive(Debug, Clone, Default)]
pub struct Bound {
    path: Params,
    query: Params,
    item: Option<Item>,
}

impl Bound {
    #[must_use]
    pub fn path(&self) -> &Params {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &Params {
        &self.query
    }

    /// The decoded body.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingBody`] if the route declares no body.
    pub fn item(&self) -> Result<&Item, CoreError> {
        self.item.as_ref().ok_or(CoreError::MissingBody)
    }
}
