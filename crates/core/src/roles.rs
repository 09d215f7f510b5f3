//! Well-known role name constants.
//!
//! These must match the `chk_users_role` constraint in
//! `20261016000001_create_users_and_patients.sql`.

pub const ROLE_SUPERADMIN: &str = "superadmin";
pub const ROLE_PHYSICIAN: &str = "physician";
pub const ROLE_PRACTICE_ADMIN: &str = "practice_admin";

/// Recipient role stored on `order_alerts` rows addressed to the ordering physician.
pub const ALERT_RECIPIENT_PHYSICIAN: &str = ROLE_PHYSICIAN;
