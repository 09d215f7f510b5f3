//! Authenticated file serving.
//!
//! Stored paths are public-style (`/uploads/...`) and are always resolved
//! through [`resolve_upload_path`], which refuses anything outside the
//! uploads root.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use woundcare_core::error::CoreError;
use woundcare_core::media::{content_type_for_path, resolve_upload_path, UploadPathError};
use woundcare_core::types::DbId;
use woundcare_db::repositories::WoundPhotoRepo;

use super::trimmed;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::csrf::csrf_matches;
use crate::middleware::rbac::RequireSuperadmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub p: Option<String>,
    pub mode: Option<String>,
    pub csrf: Option<String>,
}

/// GET /api/v1/wound-photos/{id}
///
/// Superadmins and the physician who owns the photo's patient only.
pub async fn wound_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "wound_photo",
            id,
        })
    };
    let photo = WoundPhotoRepo::find_access(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    if !user.can_access(photo.physician_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this photo".into(),
        )));
    }

    let path = resolve_upload_path(&state.config.uploads_dir, &photo.photo_path).map_err(|e| {
        tracing::warn!(photo_id = id, error = %e, "Wound photo file unavailable");
        not_found()
    })?;
    let file = tokio::fs::File::open(&path).await.map_err(|_| not_found())?;

    Response::builder()
        .header(CONTENT_TYPE, photo.photo_mime)
        .header(CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}

/// GET /api/v1/files?p=&mode=&csrf=
///
/// Superadmin only: the path is not tied to an owner, so physicians go
/// through [`wound_photo`] instead. `mode=view` serves inline; anything else
/// downloads as an attachment.
pub async fn download(
    State(state): State<AppState>,
    RequireSuperadmin(user): RequireSuperadmin,
    Query(query): Query<FileQuery>,
) -> AppResult<Response> {
    if !csrf_matches(query.csrf.as_deref().unwrap_or_default(), &user.csrf) {
        return Err(AppError::CsrfInvalid);
    }
    let requested =
        trimmed(query.p).ok_or_else(|| AppError::BadRequest("Missing file path".into()))?;

    let path = resolve_upload_path(&state.config.uploads_dir, &requested).map_err(|e| match e {
        UploadPathError::NotFound => AppError::NotFound("File not found".into()),
        UploadPathError::InvalidPrefix | UploadPathError::Traversal => {
            tracing::warn!(user_id = user.user_id, error = %e, "Rejected file path");
            AppError::BadRequest("Invalid file path".into())
        }
    })?;
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| AppError::NotFound("File not found".into()))?;

    let disposition = if query.mode.as_deref() == Some("view") {
        "inline"
    } else {
        "attachment"
    };

    Response::builder()
        .header(CONTENT_TYPE, content_type_for_path(&path))
        .header(
            CONTENT_DISPOSITION,
            format!("{disposition}; filename=\"{}\"", download_name(&path)),
        )
        .header("x-content-type-options", "nosniff")
        .header(CACHE_CONTROL, "no-store")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(format!("Failed to build response: {e}")))
}

/// File name for `Content-Disposition`, limited to characters safe inside quotes.
fn download_name(path: &FsPath) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_name_strips_unsafe_characters() {
        assert_eq!(
            download_name(FsPath::new("/x/wound-20240101-000000-ab12cd34.jpg")),
            "wound-20240101-000000-ab12cd34.jpg"
        );
        assert_eq!(download_name(FsPath::new("/x/a\"b;c.pdf")), "abc.pdf");
    }
}
