//! Repository for the `wound_photos` table.
//!
//! Storing a photo also completes the photo request it answers and counts it
//! on the patient's prompt schedule, all in one transaction.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::photo_request::{STATUS_COMPLETED, STATUS_PENDING};
use crate::models::wound_photo::{CreateWoundPhoto, WoundPhoto, WoundPhotoAccess};

const COLUMNS: &str = "id, patient_id, order_id, photo_request_id, uploaded_via, photo_path, \
    photo_mime, photo_size_bytes, patient_notes, from_phone, reviewed, reviewed_at, uploaded_at";

pub struct WoundPhotoRepo;

impl WoundPhotoRepo {
    /// Insert a photo linked to the patient's most recent open photo request
    /// (if any).
    pub async fn create_linked(
        pool: &PgPool,
        input: &CreateWoundPhoto,
    ) -> Result<WoundPhoto, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let open_request: Option<(DbId, Option<DbId>)> = sqlx::query_as(
            "SELECT id, order_id FROM photo_requests
             WHERE patient_id = $1 AND status = $2
             ORDER BY requested_at DESC, id DESC
             LIMIT 1
             FOR UPDATE",
        )
        .bind(input.patient_id)
        .bind(STATUS_PENDING)
        .fetch_optional(&mut *tx)
        .await?;

        let photo = insert_and_link(&mut tx, input, open_request).await?;
        tx.commit().await?;
        Ok(photo)
    }

    /// Insert a photo answering a specific request. Returns `None` when the
    /// request is no longer pending.
    pub async fn create_for_request(
        pool: &PgPool,
        request_id: DbId,
        input: &CreateWoundPhoto,
    ) -> Result<Option<WoundPhoto>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let request: Option<(DbId, Option<DbId>)> = sqlx::query_as(
            "SELECT id, order_id FROM photo_requests
             WHERE id = $1 AND status = $2
             FOR UPDATE",
        )
        .bind(request_id)
        .bind(STATUS_PENDING)
        .fetch_optional(&mut *tx)
        .await?;
        if request.is_none() {
            return Ok(None);
        }

        let photo = insert_and_link(&mut tx, input, request).await?;
        tx.commit().await?;
        Ok(Some(photo))
    }

    /// Path, MIME type and owning physician of a photo.
    pub async fn find_access(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WoundPhotoAccess>, sqlx::Error> {
        sqlx::query_as::<_, WoundPhotoAccess>(
            "SELECT w.id, w.photo_path, w.photo_mime, p.user_id AS physician_id
             FROM wound_photos w
             JOIN patients p ON p.id = w.patient_id
             WHERE w.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: DbId,
    ) -> Result<Vec<WoundPhoto>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wound_photos WHERE patient_id = $1 ORDER BY uploaded_at DESC, id DESC"
        );
        sqlx::query_as::<_, WoundPhoto>(&query)
            .bind(patient_id)
            .fetch_all(pool)
            .await
    }
}

/// Insert the photo, complete `request` (id, order id) when given, and bump
/// the patient's active prompt schedule.
async fn insert_and_link(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    input: &CreateWoundPhoto,
    request: Option<(DbId, Option<DbId>)>,
) -> Result<WoundPhoto, sqlx::Error> {
    let (request_id, order_id) = match request {
        Some((id, order_id)) => (Some(id), order_id),
        None => (None, None),
    };

    let query = format!(
        "INSERT INTO wound_photos
            (patient_id, order_id, photo_request_id, uploaded_via, photo_path, photo_mime,
             photo_size_bytes, patient_notes, from_phone)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {COLUMNS}"
    );
    let photo = sqlx::query_as::<_, WoundPhoto>(&query)
        .bind(input.patient_id)
        .bind(order_id)
        .bind(request_id)
        .bind(input.uploaded_via)
        .bind(&input.photo_path)
        .bind(&input.photo_mime)
        .bind(input.photo_size_bytes)
        .bind(&input.patient_notes)
        .bind(&input.from_phone)
        .fetch_one(&mut **tx)
        .await?;

    if let Some(request_id) = request_id {
        sqlx::query(
            "UPDATE photo_requests SET status = $2, photo_id = $3, completed_at = NOW()
             WHERE id = $1",
        )
        .bind(request_id)
        .bind(STATUS_COMPLETED)
        .bind(photo.id)
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query(
        "UPDATE photo_prompt_schedules
         SET total_photos_received = total_photos_received + 1, updated_at = NOW()
         WHERE patient_id = $1 AND active",
    )
    .bind(input.patient_id)
    .execute(&mut **tx)
    .await?;

    Ok(photo)
}
