//! Wound-care order service HTTP layer.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! background jobs) so integration tests and the binary entrypoint can both
//! reach them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod request_meta;
pub mod response;
pub mod router;
pub mod routes;
pub mod services;
pub mod state;
pub mod twiml;
