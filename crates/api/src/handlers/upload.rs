//! Token-based photo upload for patients (link from a photo request SMS).
//!
//! The token is the only credential: it must belong to a pending request that
//! has not expired. Both endpoints render HTML.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use woundcare_core::media::MAX_PHOTO_BYTES;
use woundcare_db::models::photo_request::{PhotoRequest, STATUS_PENDING};
use woundcare_db::models::wound_photo::{CreateWoundPhoto, UPLOADED_VIA_PORTAL};
use woundcare_db::repositories::{PhotoRequestRepo, WoundPhotoRepo};

use super::trimmed;
use crate::pages::{self, Page};
use crate::services::photo_intake::{discard_photo, store_photo, PhotoStoreError};
use crate::state::AppState;

/// GET /upload/{token}
pub async fn upload_form(State(state): State<AppState>, Path(token): Path<String>) -> Page {
    match open_request(&state, &token).await {
        Ok(request) => pages::upload_form(&token, request.wound_location.as_deref()),
        Err(page) => page,
    }
}

/// POST /upload/{token}
///
/// Multipart fields: `photo` (required) and `notes` (optional).
pub async fn submit_upload(
    State(state): State<AppState>,
    Path(token): Path<String>,
    mut multipart: Multipart,
) -> Result<Page, Page> {
    let request = open_request(&state, &token).await?;

    let mut photo: Option<(Vec<u8>, String)> = None;
    let mut notes: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "photo" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                photo = Some((data.to_vec(), content_type));
            }
            "notes" => {
                notes = trimmed(Some(field.text().await.map_err(multipart_error)?));
            }
            _ => {}
        }
    }

    let (data, content_type) =
        photo.ok_or_else(|| upload_rejected("Please choose a photo to upload."))?;
    let stored = store_photo(&state.config.uploads_dir, &data, &content_type)
        .await
        .map_err(|e| match e {
            PhotoStoreError::UnsupportedType(_) => {
                upload_rejected("Please upload a JPEG, PNG or HEIC photo.")
            }
            PhotoStoreError::Empty => upload_rejected("The selected file is empty."),
            PhotoStoreError::TooLarge => too_large(),
            PhotoStoreError::Io(e) => {
                tracing::error!(photo_request_id = request.id, error = %e, "Failed to store upload");
                pages::server_error()
            }
        })?;

    let input = CreateWoundPhoto {
        patient_id: request.patient_id,
        uploaded_via: UPLOADED_VIA_PORTAL,
        photo_path: stored.public_path.clone(),
        photo_mime: stored.mime.clone(),
        photo_size_bytes: stored.size_bytes,
        patient_notes: notes,
        from_phone: None,
    };
    match WoundPhotoRepo::create_for_request(&state.pool, request.id, &input).await {
        Ok(Some(photo)) => {
            tracing::info!(
                photo_request_id = request.id,
                photo_id = photo.id,
                patient_id = request.patient_id,
                "Wound photo uploaded via link",
            );
            Ok(pages::upload_complete())
        }
        Ok(None) => {
            discard_photo(&state.config.uploads_dir, &stored).await;
            Err(pages::upload_link_expired())
        }
        Err(e) => {
            tracing::error!(photo_request_id = request.id, error = %e, "Failed to record upload");
            discard_photo(&state.config.uploads_dir, &stored).await;
            Err(pages::server_error())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The pending, unexpired request for `token`, or the page explaining why not.
async fn open_request(state: &AppState, token: &str) -> Result<PhotoRequest, Page> {
    let request = PhotoRequestRepo::find_by_upload_token(&state.pool, token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Upload token lookup failed");
            pages::server_error()
        })?
        .ok_or_else(pages::unknown_link)?;

    if request.status != STATUS_PENDING || request.token_expires_at <= Utc::now() {
        return Err(pages::upload_link_expired());
    }
    Ok(request)
}

fn upload_rejected(message: &str) -> Page {
    Page::message(StatusCode::BAD_REQUEST, "Upload Failed", message)
}

fn too_large() -> Page {
    Page::message(
        StatusCode::PAYLOAD_TOO_LARGE,
        "Upload Failed",
        &format!(
            "Photos must be smaller than {} MB.",
            MAX_PHOTO_BYTES / (1024 * 1024)
        ),
    )
}

fn multipart_error(e: MultipartError) -> Page {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large()
    } else {
        tracing::warn!(error = %e, "Malformed upload");
        upload_rejected("The upload could not be read. Please try again.")
    }
}
