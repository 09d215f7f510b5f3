//! Patient entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `patients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Patient {
    pub id: DbId,
    /// Owning physician.
    pub user_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new patient.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePatient {
    pub user_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub dob: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}
