//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the session from the `wc_session` cookie or a Bearer token.
//! - [`rbac::RequireSuperadmin`] -- Requires the `superadmin` role.
//! - [`csrf::CsrfVerified`] -- Requires a matching `X-CSRF-Token` header.

pub mod auth;
pub mod csrf;
pub mod rbac;
