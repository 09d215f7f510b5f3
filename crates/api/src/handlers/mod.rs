//! Request handlers.
//!
//! Each submodule owns the handlers for one resource. JSON handlers return
//! [`AppResult`](crate::error::AppResult); the messaging webhooks answer
//! TwiML and the patient-facing links render HTML pages.

pub mod auth;
pub mod carriers;
pub mod delivery;
pub mod files;
pub mod orders;
pub mod password_reset;
pub mod patients;
pub mod twilio;
pub mod upload;

/// Trim an optional request field, treating blank values as absent.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
