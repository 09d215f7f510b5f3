//! Repository for `photo_prompt_schedules`.

use chrono::NaiveDate;
use sqlx::PgPool;
use woundcare_core::photo_prompt::PromptPlan;
use woundcare_core::types::DbId;

use crate::models::photo_prompt_schedule::{DuePrompt, PhotoPromptSchedule};
use crate::models::photo_request::{CreatePhotoRequest, PhotoRequest};
use crate::repositories::PhotoRequestRepo;

const COLUMNS: &str = "id, order_id, patient_id, frequency_days, start_date, next_prompt_date, \
    end_date, last_prompt_sent_at, active, total_prompts_sent, total_photos_received, \
    created_at, updated_at";

pub struct PhotoPromptScheduleRepo;

impl PhotoPromptScheduleRepo {
    /// Create the schedule for an order unless one exists. Returns `None` in that case.
    pub async fn create_if_absent(
        pool: &PgPool,
        order_id: DbId,
        patient_id: DbId,
        plan: &PromptPlan,
    ) -> Result<Option<PhotoPromptSchedule>, sqlx::Error> {
        let query = format!(
            "INSERT INTO photo_prompt_schedules
                (order_id, patient_id, frequency_days, start_date, next_prompt_date, end_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT ON CONSTRAINT uq_photo_prompt_schedules_order DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhotoPromptSchedule>(&query)
            .bind(order_id)
            .bind(patient_id)
            .bind(plan.frequency_days)
            .bind(plan.start_date)
            .bind(plan.next_prompt_date)
            .bind(plan.end_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<PhotoPromptSchedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photo_prompt_schedules WHERE order_id = $1");
        sqlx::query_as::<_, PhotoPromptSchedule>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Active schedules due on `today` whose order is delivered.
    pub async fn list_due(pool: &PgPool, today: NaiveDate) -> Result<Vec<DuePrompt>, sqlx::Error> {
        sqlx::query_as::<_, DuePrompt>(
            "SELECT s.id AS schedule_id, s.order_id, s.patient_id, s.frequency_days, o.product,
                    p.first_name AS patient_first_name, p.phone AS patient_phone,
                    u.id AS physician_id, u.last_name AS physician_last_name
             FROM photo_prompt_schedules s
             JOIN orders o ON o.id = s.order_id
             JOIN patients p ON p.id = s.patient_id
             JOIN users u ON u.id = o.user_id
             WHERE s.active
               AND s.next_prompt_date <= $1
               AND s.end_date >= $1
               AND o.status = 'delivered'
             ORDER BY s.next_prompt_date ASC, s.id ASC",
        )
        .bind(today)
        .fetch_all(pool)
        .await
    }

    /// Record a sent prompt: insert its photo request and advance the schedule.
    pub async fn record_prompt_sent(
        pool: &PgPool,
        schedule_id: DbId,
        next_prompt_date: NaiveDate,
        request: &CreatePhotoRequest,
        sms_sid: Option<&str>,
    ) -> Result<PhotoRequest, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let created = PhotoRequestRepo::insert(&mut *tx, request, sms_sid).await?;

        sqlx::query(
            "UPDATE photo_prompt_schedules
             SET next_prompt_date = $2, last_prompt_sent_at = NOW(),
                 total_prompts_sent = total_prompts_sent + 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(schedule_id)
        .bind(next_prompt_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Deactivate schedules whose end date has passed. Returns the number deactivated.
    pub async fn deactivate_expired(pool: &PgPool, today: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE photo_prompt_schedules SET active = false, updated_at = NOW()
             WHERE active AND end_date < $1",
        )
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
