//! The route table and dispatcher.
//!
//! Routes are registered once at start-up; the built table is immutable and
//! safe to share across request tasks.

use std::borrow::Cow;

use http::Method;

use crate::error::CoreError;
use crate::pattern::Capture;
use crate::route::{Route, RouteSpec};

/// Outcome of matching an incoming request against the table.
#[derive(Debug)]
pub enum RouteMatch<'a, H> {
    /// No route matches the path.
    NotFound,
    /// The path matches, but not for this method.
    MethodNotAllowed { allowed: Vec<Method> },
    /// The single most specific route, with its raw captures.
    Matched {
        route: &'a Route<H>,
        captures: Vec<Capture>,
    },
}

/// Incrementally registers routes, rejecting ambiguous ones.
#[derive(Debug)]
pub struct RouteTableBuilder<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTableBuilder<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H> RouteTableBuilder<H> {
    /// Register a route.
    ///
    /// # Errors
    /// Returns a [`CoreError`] if the template or a query declaration is
    /// invalid, or if a route with the same method and shape already exists.
    pub fn route(mut self, spec: RouteSpec, handler: H) -> Result<Self, CoreError> {
        let route = spec.compile(handler)?;
        let clash = self.routes.iter().any(|existing| {
            existing.method() == route.method() && existing.pattern().same_shape(route.pattern())
        });
        if clash {
            return Err(CoreError::DuplicateRoute {
                method: route.method().clone(),
                template: route.pattern().template().to_owned(),
            });
        }
        self.routes.push(route);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> RouteTable<H> {
        RouteTable {
            routes: self.routes,
        }
    }
}

/// An immutable, ordered set of routes.
#[derive(Debug)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> RouteTable<H> {
    #[must_use]
    pub fn builder() -> RouteTableBuilder<H> {
        RouteTableBuilder::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Select the route for `(method, path)`.
    ///
    /// `path` is the raw request path without the query string. It is
    /// percent-decoded before being split on `/`. Among routes that match
    /// structurally and accept the method, the lowest precedence rank wins
    /// (literal before placeholder before path capture, segment by segment);
    /// equal ranks resolve to the earliest registration.
    #[must_use]
    pub fn dispatch(&self, method: &Method, path: &str) -> RouteMatch<'_, H> {
        let decoded = decode_path(path);
        let Some(rest) = decoded.strip_prefix('/') else {
            return RouteMatch::NotFound;
        };
        let segments: Vec<&str> = rest.split('/').collect();

        let mut best: Option<(&Route<H>, Vec<Capture>)> = None;
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(captures) = route.pattern().captures(&segments) else {
                continue;
            };
            if !route.accepts(method) {
                allowed.push(route.method().clone());
                if *route.method() == Method::GET {
                    allowed.push(Method::HEAD);
                }
                continue;
            }
            let better = best
                .as_ref()
                .map_or(true, |(current, _)| route.rank() < current.rank());
            if better {
                best = Some((route, captures));
            }
        }

        match best {
            Some((route, captures)) => RouteMatch::Matched { route, captures },
            None if allowed.is_empty() => RouteMatch::NotFound,
            None => {
                allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
                allowed.dedup();
                RouteMatch::MethodNotAllowed { allowed }
            }
        }
    }
}

fn decode_path(path: &str) -> Cow<'_, str> {
    match urlencoding::decode_binary(path.as_bytes()) {
        Cow::Borrowed(_) => Cow::Borrowed(path),
        Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::QueryParam;

    type Table = RouteTable<&'static str>;

    fn table(routes: Vec<(RouteSpec, &'static str)>) -> Table {
        let mut builder = RouteTable::builder();
        for (spec, name) in routes {
            builder = match builder.route(spec, name) {
                Ok(b) => b,
                Err(e) => panic!("failed to register route: {e}"),
            };
        }
        builder.build()
    }

    fn matched(table: &Table, method: &Method, path: &str) -> Option<&'static str> {
        match table.dispatch(method, path) {
            RouteMatch::Matched { route, .. } => Some(*route.handler()),
            _ => None,
        }
    }

    #[test]
    fn literal_wins_regardless_of_registration_order() {
        for routes in [
            vec![
                (RouteSpec::get("/user/me"), "me"),
                (RouteSpec::get("/user/{user_id:int}"), "by_id"),
            ],
            vec![
                (RouteSpec::get("/user/{user_id:int}"), "by_id"),
                (RouteSpec::get("/user/me"), "me"),
            ],
        ] {
            let table = table(routes);
            assert_eq!(matched(&table, &Method::GET, "/user/me"), Some("me"));
            assert_eq!(matched(&table, &Method::GET, "/user/7"), Some("by_id"));
        }
    }

    #[test]
    fn empty_builder_builds_empty_table() {
        let table: Table = RouteTable::builder().build();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert!(matches!(table.dispatch(&Method::GET, "/"), RouteMatch::NotFound));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let table = table(vec![(RouteSpec::get("/"), "root")]);
        assert!(matches!(table.dispatch(&Method::GET, "/nope"), RouteMatch::NotFound));
        assert!(matches!(table.dispatch(&Method::GET, "relative"), RouteMatch::NotFound));
    }

    #[test]
    fn wrong_method_lists_allowed_methods() {
        let table = table(vec![
            (RouteSpec::get("/items/"), "list"),
            (RouteSpec::post("/items/"), "create"),
        ]);
        match table.dispatch(&Method::DELETE, "/items/") {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::HEAD, Method::POST]);
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
        assert_eq!(matched(&table, &Method::POST, "/items/"), Some("create"));
        assert_eq!(matched(&table, &Method::HEAD, "/items/"), Some("list"));
    }

    #[test]
    fn full_match_beats_partial_method_match() {
        let table = table(vec![
            (RouteSpec::get("/user/me"), "me"),
            (RouteSpec::post("/user/{name}"), "rename"),
        ]);
        assert_eq!(matched(&table, &Method::POST, "/user/me"), Some("rename"));
    }

    #[test]
    fn path_capture_is_decoded_and_keeps_slashes() {
        let table = table(vec![(RouteSpec::get("/files/{file_path:path}"), "files")]);
        match table.dispatch(&Method::GET, "/files/home/john%20doe/a.txt") {
            RouteMatch::Matched { captures, .. } => {
                assert_eq!(captures[0].raw, "home/john doe/a.txt");
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_shapes_are_rejected() {
        let result = RouteTable::builder()
            .route(RouteSpec::get("/user/{id:int}"), "a")
            .and_then(|b| b.route(RouteSpec::get("/user/{name}"), "b"));
        assert!(matches!(result, Err(CoreError::DuplicateRoute { .. })));

        let different_method = RouteTable::builder()
            .route(RouteSpec::get("/items/"), "a")
            .and_then(|b| b.route(RouteSpec::post("/items/"), "b"));
        assert!(different_method.is_ok());
    }

    #[test]
    fn invalid_declarations_fail_registration() {
        let result = RouteTable::builder().route(
            RouteSpec::get("/items/").query(QueryParam::int("skip").with_default(true)),
            "list",
        );
        assert!(matches!(result, Err(CoreError::InvalidQueryParam { .. })));
    }
}
