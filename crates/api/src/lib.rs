//! HTTP front end: routing, sessions, and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
