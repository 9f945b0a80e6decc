use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer: self-service profile editing and event editing.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `AuthUser` extractor middleware being present
/// on the router layer above this module. This guarantees that all handlers receive a
/// validated `AuthUser` struct containing the user's ID and permission mask, which is
/// then used for all ownership checks (e.g., in `update_event`).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /edit-profile
        // The caller's current editable profile fields.
        // POST /edit-profile
        // Applies changes to name, location, and about_me; returns the updated user.
        .route(
            "/edit-profile",
            get(handlers::get_own_profile).post(handlers::update_own_profile),
        )
        // GET /edit/{id}
        // Fetches an event for editing. Only the author or an administrator may
        // proceed; everyone else receives 403.
        // POST /edit/{id}
        // Replaces the event body under the same author-or-admin rule.
        .route(
            "/edit/{id}",
            get(handlers::get_event_for_edit).post(handlers::update_event),
        )
}
