//! HTTP API: axum server, routing, and request/response mapping.

pub mod app;
