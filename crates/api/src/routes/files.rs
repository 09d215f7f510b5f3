use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// File serving routes (requires auth).
///
/// ```text
/// GET /wound-photos/{id}       -> wound_photo
/// GET /files?p=&mode=&csrf=    -> download
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wound-photos/{id}", get(files::wound_photo))
        .route("/files", get(files::download))
}
