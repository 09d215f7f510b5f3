//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing, verification and strength rules.
//! - [`jwt`] -- session token generation and validation.
//! - [`session`] -- the `wc_session` cookie.

pub mod jwt;
pub mod password;
pub mod session;
