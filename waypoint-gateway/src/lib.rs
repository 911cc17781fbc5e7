//! HTTP gateway for the Waypoint API.
//!
//! Serves the route table from `waypoint-core` over axum: path and query
//! binding, `Item` body validation, and FastAPI-style `{"detail": ...}`
//! error bodies.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
