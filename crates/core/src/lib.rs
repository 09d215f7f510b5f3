//! Pure domain rules for the wound-care order service.
//!
//! Nothing in this crate talks to the database or the network; the
//! repository, HTTP and messaging layers call into it.

pub mod carrier;
pub mod completeness;
pub mod delivery;
pub mod error;
pub mod hashing;
pub mod media;
pub mod order_status;
pub mod phone;
pub mod photo_prompt;
pub mod reset_token;
pub mod roles;
pub mod tokens;
pub mod types;
