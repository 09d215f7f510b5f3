//! Photo prompt schedule rows.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use woundcare_core::types::{DbId, Timestamp};

/// A row from the `photo_prompt_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoPromptSchedule {
    pub id: DbId,
    pub order_id: DbId,
    pub patient_id: DbId,
    pub frequency_days: i32,
    pub start_date: NaiveDate,
    pub next_prompt_date: NaiveDate,
    pub end_date: NaiveDate,
    pub last_prompt_sent_at: Option<Timestamp>,
    pub active: bool,
    pub total_prompts_sent: i32,
    pub total_photos_received: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A schedule that is due, joined with what the prompt message needs.
#[derive(Debug, Clone, FromRow)]
pub struct DuePrompt {
    pub schedule_id: DbId,
    pub order_id: DbId,
    pub patient_id: DbId,
    pub frequency_days: i32,
    pub product: Option<String>,
    pub patient_first_name: String,
    pub patient_phone: Option<String>,
    pub physician_id: DbId,
    pub physician_last_name: String,
}
