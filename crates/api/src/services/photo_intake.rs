//! Wound photo intake.
//!
//! [`store_photo`] validates and writes a photo below the uploads root; it is
//! shared by the MMS webhook and the token upload form. [`process_mms`] runs
//! the inbound MMS flow end to end and reports what happened as an
//! [`MmsOutcome`]. Every outcome is communicated to the patient by SMS.

use std::path::Path;

use woundcare_core::delivery::{matches_confirmation_keyword, CONFIRMATION_WINDOW_DAYS};
use woundcare_core::media::{
    essence, is_allowed_photo_mime, new_photo_location, photo_extension, MAX_PHOTO_BYTES,
    WOUND_PHOTO_DIR,
};
use woundcare_core::phone::{mask, match_candidates, normalize_e164};
use woundcare_core::types::DbId;
use woundcare_db::models::patient::Patient;
use woundcare_db::models::wound_photo::{CreateWoundPhoto, UPLOADED_VIA_SMS};
use woundcare_db::repositories::{DeliveryConfirmationRepo, PatientRepo, WoundPhotoRepo};
use woundcare_notify::templates;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// A photo written to disk.
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// `/uploads/wound_photos/<file>` as stored in `wound_photos.photo_path`.
    pub public_path: String,
    pub mime: String,
    pub size_bytes: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PhotoStoreError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("Photo is empty")]
    Empty,

    #[error("Photo exceeds {MAX_PHOTO_BYTES} bytes")]
    TooLarge,

    #[error("Failed to write photo: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate a photo and write it under `{uploads_dir}/wound_photos/`.
pub async fn store_photo(
    uploads_dir: &Path,
    bytes: &[u8],
    content_type: &str,
) -> Result<StoredPhoto, PhotoStoreError> {
    let mime = essence(content_type);
    let extension =
        photo_extension(&mime).ok_or_else(|| PhotoStoreError::UnsupportedType(mime.clone()))?;
    if bytes.is_empty() {
        return Err(PhotoStoreError::Empty);
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(PhotoStoreError::TooLarge);
    }

    let location = new_photo_location(extension);
    let dir = uploads_dir.join(WOUND_PHOTO_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&location.file_name), bytes).await?;

    Ok(StoredPhoto {
        public_path: location.public_path,
        mime,
        size_bytes: bytes.len() as i64,
    })
}

/// Best-effort removal of a stored photo whose database row was not written.
pub async fn discard_photo(uploads_dir: &Path, photo: &StoredPhoto) {
    let Some(file_name) = photo.public_path.rsplit('/').next() else {
        return;
    };
    let path = uploads_dir.join(WOUND_PHOTO_DIR).join(file_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove orphaned photo");
    }
}

// ---------------------------------------------------------------------------
// Inbound MMS
// ---------------------------------------------------------------------------

/// The first media item of an inbound message.
#[derive(Debug, Clone)]
pub struct InboundMedia {
    pub url: String,
    pub content_type: String,
}

/// An inbound message as posted by the messaging provider.
#[derive(Debug, Clone)]
pub struct InboundMms {
    pub from: String,
    pub body: String,
    pub media: Option<InboundMedia>,
}

/// What [`process_mms`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MmsOutcome {
    /// No patient matches the sender.
    PatientNotFound,
    /// A text reply confirmed a pending delivery.
    DeliveryConfirmed { confirmation_id: DbId },
    /// A text reply without a keyword while a confirmation is pending.
    ConfirmationInstructions,
    /// A text reply with nothing pending: the patient was asked to attach a photo.
    PhotoHint,
    /// The media type is not an accepted photo format.
    UnsupportedMedia,
    /// The media could not be fetched from the provider.
    DownloadFailed,
    /// The media was fetched but could not be stored.
    SaveFailed,
    /// The photo was stored.
    PhotoStored { photo_id: DbId },
}

/// Handle one inbound MMS. Database errors while identifying the patient are
/// returned; everything after that is reported through the outcome.
pub async fn process_mms(state: &AppState, message: &InboundMms) -> Result<MmsOutcome, sqlx::Error> {
    let reply_to = normalize_e164(&message.from).unwrap_or_else(|| message.from.clone());
    let candidates = match_candidates(&message.from);

    let Some(patient) = PatientRepo::find_by_phone_candidates(&state.pool, &candidates).await?
    else {
        tracing::info!(phone = %mask(&message.from), "Inbound MMS from unknown number");
        reply(state, &reply_to, templates::PATIENT_NOT_FOUND_SMS).await;
        return Ok(MmsOutcome::PatientNotFound);
    };

    match &message.media {
        None => handle_text_reply(state, &patient, &reply_to, &message.body).await,
        Some(media) => Ok(handle_photo(state, &patient, &reply_to, message, media).await),
    }
}

async fn handle_text_reply(
    state: &AppState,
    patient: &Patient,
    reply_to: &str,
    body: &str,
) -> Result<MmsOutcome, sqlx::Error> {
    let pending = DeliveryConfirmationRepo::find_pending_for_patient(
        &state.pool,
        patient.id,
        CONFIRMATION_WINDOW_DAYS,
    )
    .await?;

    let Some(pending) = pending else {
        reply(state, reply_to, &templates::attach_photo_hint_sms(&patient.first_name)).await;
        return Ok(MmsOutcome::PhotoHint);
    };

    if !matches_confirmation_keyword(body) {
        reply(state, reply_to, templates::DELIVERY_REPLY_INSTRUCTIONS).await;
        return Ok(MmsOutcome::ConfirmationInstructions);
    }

    if DeliveryConfirmationRepo::confirm_sms_reply(&state.pool, pending.id, body).await? {
        tracing::info!(
            patient_id = patient.id,
            order_id = pending.order_id,
            "Delivery confirmed by SMS reply",
        );
        reply(state, reply_to, &templates::delivery_reply_confirmed(&patient.first_name)).await;
        Ok(MmsOutcome::DeliveryConfirmed {
            confirmation_id: pending.id,
        })
    } else {
        reply(state, reply_to, &templates::attach_photo_hint_sms(&patient.first_name)).await;
        Ok(MmsOutcome::PhotoHint)
    }
}

async fn handle_photo(
    state: &AppState,
    patient: &Patient,
    reply_to: &str,
    message: &InboundMms,
    media: &InboundMedia,
) -> MmsOutcome {
    if !is_allowed_photo_mime(&media.content_type) {
        tracing::info!(
            patient_id = patient.id,
            content_type = %media.content_type,
            "Rejected inbound media type",
        );
        reply(state, reply_to, templates::UNSUPPORTED_MEDIA_SMS).await;
        return MmsOutcome::UnsupportedMedia;
    }

    let download = match state.sms.download_media(&media.url, MAX_PHOTO_BYTES).await {
        Ok(download) => download,
        Err(e) => {
            tracing::warn!(patient_id = patient.id, error = %e, "MMS media download failed");
            reply(state, reply_to, templates::PHOTO_RECEIVE_ERROR_SMS).await;
            return MmsOutcome::DownloadFailed;
        }
    };

    let content_type = download
        .content_type
        .as_deref()
        .unwrap_or(&media.content_type);
    let stored = match store_photo(&state.config.uploads_dir, &download.bytes, content_type).await {
        Ok(stored) => stored,
        Err(PhotoStoreError::UnsupportedType(mime)) => {
            tracing::info!(patient_id = patient.id, %mime, "Downloaded media is not a photo");
            reply(state, reply_to, templates::UNSUPPORTED_MEDIA_SMS).await;
            return MmsOutcome::UnsupportedMedia;
        }
        Err(e @ (PhotoStoreError::Empty | PhotoStoreError::TooLarge)) => {
            tracing::warn!(patient_id = patient.id, error = %e, "Rejected downloaded media");
            reply(state, reply_to, templates::PHOTO_RECEIVE_ERROR_SMS).await;
            return MmsOutcome::DownloadFailed;
        }
        Err(e) => {
            tracing::error!(patient_id = patient.id, error = %e, "Failed to store MMS photo");
            reply(state, reply_to, templates::PHOTO_SAVE_ERROR_SMS).await;
            return MmsOutcome::SaveFailed;
        }
    };

    let input = CreateWoundPhoto {
        patient_id: patient.id,
        uploaded_via: UPLOADED_VIA_SMS,
        photo_path: stored.public_path.clone(),
        photo_mime: stored.mime.clone(),
        photo_size_bytes: stored.size_bytes,
        patient_notes: Some(message.body.trim().to_string()).filter(|b| !b.is_empty()),
        from_phone: Some(reply_to.to_string()),
    };
    match WoundPhotoRepo::create_linked(&state.pool, &input).await {
        Ok(photo) => {
            tracing::info!(
                patient_id = patient.id,
                photo_id = photo.id,
                photo_request_id = ?photo.photo_request_id,
                "Wound photo received by MMS",
            );
            reply(state, reply_to, &templates::photo_received_sms(&patient.first_name)).await;
            MmsOutcome::PhotoStored { photo_id: photo.id }
        }
        Err(e) => {
            tracing::error!(patient_id = patient.id, error = %e, "Failed to record MMS photo");
            discard_photo(&state.config.uploads_dir, &stored).await;
            reply(state, reply_to, templates::PHOTO_SAVE_ERROR_SMS).await;
            MmsOutcome::SaveFailed
        }
    }
}

/// Send an SMS, logging (not propagating) provider failures.
pub async fn reply(state: &AppState, to: &str, body: &str) {
    if let Err(e) = state.sms.send_sms(to, body).await {
        tracing::warn!(phone = %mask(to), error = %e, "Outbound SMS failed");
    }
}
