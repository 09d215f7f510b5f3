//! Repository for the `photo_requests` table.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::photo_request::{CreatePhotoRequest, PhotoRequest, STATUS_PENDING};

const COLUMNS: &str = "id, patient_id, physician_id, order_id, requested_via, \
    wound_location, request_notes, upload_token, token_expires_at, status, sms_sid, sms_sent_at, \
    photo_id, completed_at, requested_at";

pub struct PhotoRequestRepo;

impl PhotoRequestRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreatePhotoRequest,
    ) -> Result<PhotoRequest, sqlx::Error> {
        Self::insert(pool, input, None).await
    }

    /// Insert a request, optionally stamping the SMS sid it was sent with.
    pub(crate) async fn insert<'e, E>(
        executor: E,
        input: &CreatePhotoRequest,
        sms_sid: Option<&str>,
    ) -> Result<PhotoRequest, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO photo_requests
                (patient_id, physician_id, order_id, requested_via, wound_location,
                 request_notes, upload_token, token_expires_at, sms_sid, sms_sent_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                     CASE WHEN $9::text IS NOT NULL THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhotoRequest>(&query)
            .bind(input.patient_id)
            .bind(input.physician_id)
            .bind(input.order_id)
            .bind(input.requested_via)
            .bind(&input.wound_location)
            .bind(&input.request_notes)
            .bind(&input.upload_token)
            .bind(input.token_expires_at)
            .bind(sms_sid)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_upload_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<PhotoRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM photo_requests WHERE upload_token = $1");
        sqlx::query_as::<_, PhotoRequest>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// The patient's most recent request that has not received a photo yet.
    pub async fn latest_open_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Option<PhotoRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM photo_requests
             WHERE patient_id = $1 AND status = $2
             ORDER BY requested_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, PhotoRequest>(&query)
            .bind(patient_id)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Record the SMS sid once the request message has been sent.
    pub async fn record_sms_sent(
        pool: &PgPool,
        id: DbId,
        sms_sid: &str,
    ) -> Result<Option<PhotoRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE photo_requests SET sms_sid = $2, sms_sent_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhotoRequest>(&query)
            .bind(id)
            .bind(sms_sid)
            .fetch_optional(pool)
            .await
    }
}
