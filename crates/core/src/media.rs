//! Wound-photo media rules and upload path handling.
//!
//! Inbound media (MMS or portal upload) is accepted only for a small set of
//! image types, renamed to a generated filename and written below the
//! uploads root. Serving goes through [`resolve_upload_path`], which refuses
//! anything that would resolve outside that root.

use std::path::{Path, PathBuf};

use chrono::Utc;
use strict_path::{PathBoundary, StrictPathError};

use crate::tokens::random_hex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// MIME types accepted for wound photos.
pub const ALLOWED_PHOTO_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/heic",
    "image/heif",
];

/// Maximum accepted photo size.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Directory below the uploads root that holds wound photos.
pub const WOUND_PHOTO_DIR: &str = "wound_photos";

/// Public URL prefixes accepted by the file download endpoint.
pub const UPLOAD_URL_PREFIXES: [&str; 2] = ["/public/uploads/", "/uploads/"];

// ---------------------------------------------------------------------------
// MIME handling
// ---------------------------------------------------------------------------

/// Strip parameters and lowercase a content type (`image/JPEG; q=1` -> `image/jpeg`).
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a content type is an accepted photo format.
pub fn is_allowed_photo_mime(content_type: &str) -> bool {
    ALLOWED_PHOTO_MIME_TYPES.contains(&essence(content_type).as_str())
}

/// File extension used when storing a photo of the given type.
pub fn photo_extension(content_type: &str) -> Option<&'static str> {
    match essence(content_type).as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/heic" | "image/heif" => Some("heic"),
        _ => None,
    }
}

/// Content type advertised when serving a stored file, keyed by extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// A generated storage location for a new photo.
#[derive(Debug, Clone)]
pub struct PhotoLocation {
    /// Bare filename, `wound-YYYYmmdd-HHMMSS-<8 hex>.<ext>`.
    pub file_name: String,
    /// Path stored in the database and used in URLs.
    pub public_path: String,
}

/// Generate the filename and public path for a photo of `extension`.
pub fn new_photo_location(extension: &str) -> PhotoLocation {
    let file_name = format!(
        "wound-{}-{}.{extension}",
        Utc::now().format("%Y%m%d-%H%M%S"),
        random_hex(4)
    );
    let public_path = format!("/uploads/{WOUND_PHOTO_DIR}/{file_name}");
    PhotoLocation {
        file_name,
        public_path,
    }
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum UploadPathError {
    #[error("path must start with /uploads/ or /public/uploads/")]
    InvalidPrefix,

    #[error("path escapes the uploads directory")]
    Traversal,

    #[error("file not found")]
    NotFound,
}

/// Marker for paths proven to sit below the uploads root.
pub struct UploadsDir;

/// Resolve a public upload path (`/uploads/...`) to a regular file inside
/// `uploads_root`.
///
/// The boundary is enforced by [`PathBoundary::strict_join`], which
/// canonicalizes the candidate (symlinks included) and refuses anything that
/// lands outside the root.
pub fn resolve_upload_path(uploads_root: &Path, requested: &str) -> Result<PathBuf, UploadPathError> {
    let relative = UPLOAD_URL_PREFIXES
        .iter()
        .find_map(|prefix| requested.strip_prefix(prefix))
        .ok_or(UploadPathError::InvalidPrefix)?;

    if relative.is_empty() || relative.contains('\0') || relative.contains('\\') {
        return Err(UploadPathError::Traversal);
    }

    let boundary = PathBoundary::<UploadsDir>::try_new(uploads_root)
        .map_err(|_| UploadPathError::NotFound)?;
    let file = boundary.strict_join(relative).map_err(|e| match e {
        StrictPathError::PathEscapesBoundary { .. } => UploadPathError::Traversal,
        _ => UploadPathError::NotFound,
    })?;

    if !file.is_file() {
        return Err(UploadPathError::NotFound);
    }
    Ok(file.unstrict())
}

// ---------------------------------------------------------------------------
// Upload tokens
// ---------------------------------------------------------------------------

/// Lifetime of a photo-request upload link.
pub const UPLOAD_TOKEN_TTL_DAYS: i64 = 7;

/// Random bytes in an upload token (hex encoded, so twice as many characters).
pub const UPLOAD_TOKEN_BYTES: usize = 32;

pub fn generate_upload_token() -> String {
    random_hex(UPLOAD_TOKEN_BYTES)
}

/// Patient-facing link for a photo-request upload token.
pub fn upload_url(public_base_url: &str, token: &str) -> String {
    format!("{}/upload/{token}", public_base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn whitelist_accepts_photo_types_with_parameters() {
        assert!(is_allowed_photo_mime("image/jpeg"));
        assert!(is_allowed_photo_mime("IMAGE/PNG; charset=binary"));
        assert!(is_allowed_photo_mime("image/heif"));
        assert!(!is_allowed_photo_mime("image/gif"));
        assert!(!is_allowed_photo_mime("application/pdf"));
        assert!(!is_allowed_photo_mime(""));
    }

    #[test]
    fn extensions_collapse_aliases() {
        assert_eq!(photo_extension("image/jpg"), Some("jpg"));
        assert_eq!(photo_extension("image/jpeg"), Some("jpg"));
        assert_eq!(photo_extension("image/heif"), Some("heic"));
        assert_eq!(photo_extension("video/mp4"), None);
    }

    #[test]
    fn generated_names_follow_pattern() {
        let loc = new_photo_location("png");
        let re = regex::Regex::new(r"^wound-\d{8}-\d{6}-[0-9a-f]{8}\.png$").unwrap();
        assert!(re.is_match(&loc.file_name), "unexpected name {}", loc.file_name);
        assert_eq!(loc.public_path, format!("/uploads/wound_photos/{}", loc.file_name));
    }

    #[test]
    fn resolves_files_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("wound_photos")).unwrap();
        std::fs::write(dir.path().join("wound_photos/a.jpg"), b"x").unwrap();

        let resolved = resolve_upload_path(dir.path(), "/uploads/wound_photos/a.jpg").unwrap();
        assert!(resolved.ends_with("wound_photos/a.jpg"));
        let resolved = resolve_upload_path(dir.path(), "/public/uploads/wound_photos/a.jpg").unwrap();
        assert!(resolved.is_file());
    }

    #[test]
    fn rejects_bad_prefix_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            resolve_upload_path(dir.path(), "/etc/passwd"),
            Err(UploadPathError::InvalidPrefix)
        );
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/../secret.txt"),
            Err(UploadPathError::Traversal)
        );
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads//etc/passwd"),
            Err(UploadPathError::Traversal)
        );
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/"),
            Err(UploadPathError::Traversal)
        );
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/wound_photos/../../etc/passwd"),
            Err(UploadPathError::Traversal)
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_out_of_root_are_refused() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.txt"), b"x").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();

        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/link.txt"),
            Err(UploadPathError::Traversal)
        );
    }

    #[test]
    fn missing_files_and_directories_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("wound_photos")).unwrap();
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/nope.jpg"),
            Err(UploadPathError::NotFound)
        );
        assert_matches!(
            resolve_upload_path(dir.path(), "/uploads/wound_photos"),
            Err(UploadPathError::NotFound)
        );
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for_path(Path::new("a.pdf")), "application/pdf");
        assert_eq!(content_type_for_path(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn upload_url_joins_base_and_token() {
        assert_eq!(
            upload_url("https://portal.test/", "abc"),
            "https://portal.test/upload/abc"
        );
        assert_eq!(generate_upload_token().len(), UPLOAD_TOKEN_BYTES * 2);
    }
}
