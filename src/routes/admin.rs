use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users holding the ADMIN
/// permission bit: the administrator profile editor.
///
/// Access Control:
/// This router is wrapped in the same authentication middleware layer as the
/// authenticated routes; the ADMIN bit is then explicitly checked inside each
/// handler before any data access, matching the two-step
/// authenticate-then-authorize flow. The paths stay at the application's
/// original URL scheme rather than a /admin prefix.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /edit-profile/{id}
        // Any user's full editable profile plus the assignable roles for the
        // role selector.
        // POST /edit-profile/{id}
        // Applies changes to email, username, confirmed, role, and profile
        // fields. Uniqueness collisions return 409; an unknown role returns 422.
        .route(
            "/edit-profile/{id}",
            get(handlers::get_profile_admin).post(handlers::update_profile_admin),
        )
}
