//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts where rows are created from Rust

pub mod delivery_confirmation;
pub mod order;
pub mod order_alert;
pub mod order_status_change;
pub mod password_reset;
pub mod patient;
pub mod photo_prompt_schedule;
pub mod photo_request;
pub mod user;
pub mod wound_photo;
