//! Patient-scoped endpoints: manual photo requests and the photo gallery.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use woundcare_core::error::CoreError;
use woundcare_core::media::{generate_upload_token, upload_url, UPLOAD_TOKEN_TTL_DAYS};
use woundcare_core::phone::{mask, normalize_e164};
use woundcare_core::types::DbId;
use woundcare_db::models::patient::Patient;
use woundcare_db::models::photo_request::{CreatePhotoRequest, PhotoRequest, REQUESTED_VIA_MANUAL};
use woundcare_db::models::wound_photo::WoundPhoto;
use woundcare_db::repositories::{PatientRepo, PhotoRequestRepo, WoundPhotoRepo};
use woundcare_notify::templates;

use super::trimmed;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::csrf::CsrfVerified;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /patients/{id}/photo-requests`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePhotoRequestInput {
    pub wound_location: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/patients/{id}/photo-requests
///
/// Create a pending photo request and text the patient an upload link.
/// A failed SMS is logged; the request is still returned so it can be resent.
pub async fn create_photo_request(
    State(state): State<AppState>,
    CsrfVerified(user): CsrfVerified,
    Path(patient_id): Path<DbId>,
    Json(input): Json<CreatePhotoRequestInput>,
) -> AppResult<(StatusCode, Json<DataResponse<PhotoRequest>>)> {
    let patient = accessible_patient(&state, &user, patient_id).await?;
    let phone = patient
        .phone
        .as_deref()
        .and_then(normalize_e164)
        .ok_or_else(|| AppError::BadRequest("Patient has no valid mobile phone number".into()))?;

    let token = generate_upload_token();
    let request = PhotoRequestRepo::create(
        &state.pool,
        &CreatePhotoRequest {
            patient_id,
            physician_id: Some(patient.user_id),
            order_id: None,
            requested_via: REQUESTED_VIA_MANUAL,
            wound_location: trimmed(input.wound_location),
            request_notes: trimmed(input.notes),
            upload_token: token.clone(),
            token_expires_at: Utc::now() + Duration::days(UPLOAD_TOKEN_TTL_DAYS),
        },
    )
    .await?;

    let body = templates::photo_request_sms(
        &patient.first_name,
        &upload_url(&state.config.public_base_url, &token),
    );
    let request = match state.sms.send_sms(&phone, &body).await {
        Ok(receipt) => PhotoRequestRepo::record_sms_sent(&state.pool, request.id, &receipt.sid)
            .await?
            .unwrap_or(request),
        Err(e) => {
            tracing::warn!(
                photo_request_id = request.id,
                phone = %mask(&phone),
                error = %e,
                "Photo request SMS failed",
            );
            request
        }
    };

    tracing::info!(
        photo_request_id = request.id,
        patient_id,
        requested_by = user.user_id,
        "Photo request created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/patients/{id}/wound-photos
pub async fn list_wound_photos(
    State(state): State<AppState>,
    user: AuthUser,
    Path(patient_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<WoundPhoto>>>> {
    accessible_patient(&state, &user, patient_id).await?;
    let photos = WoundPhotoRepo::list_for_patient(&state.pool, patient_id).await?;
    Ok(Json(DataResponse { data: photos }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a patient the caller may act on: 404 if unknown, 403 if not theirs.
async fn accessible_patient(
    state: &AppState,
    user: &AuthUser,
    patient_id: DbId,
) -> AppResult<Patient> {
    let patient = PatientRepo::find_by_id(&state.pool, patient_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "patient",
            id: patient_id,
        }))?;
    if !user.can_access(patient.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this patient".into(),
        )));
    }
    Ok(patient)
}
