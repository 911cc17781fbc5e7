//! Route dispatcher and request binder for the Waypoint API.
//!
//! Defines the route table, typed path templates, query parameter
//! declarations, and the `Item` body schema. Nothing here performs I/O: the
//! gateway crate feeds raw method, path, query and body in, and gets either a
//! matched route with validated inputs or a structured rejection back.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod params;
pub mod pattern;
pub mod route;
pub mod schema;
pub mod table;

pub use error::{CoreError, ErrorKind, FieldError, Location, Source};
pub use params::{ParamValue, Params, Presence, QueryKind, QueryParam};
pub use pattern::{Capture, ParamKind, PathPattern, Segment};
pub use route::{Bound, Route, RouteSpec};
pub use schema::{BodySchema, Item};
pub use table::{RouteMatch, RouteTable, RouteTableBuilder};
