use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Defines endpoints that are accessible to any client (anonymous or
/// logged-in): the paginated feed, public profiles, and single-event lookup.
///
/// The feed path also accepts POST for publishing a new event. That handler is
/// not behind the router-level auth middleware; it authenticates through the
/// `AuthUser` extractor in its signature, so an anonymous POST is rejected with
/// 401 while GET stays open.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /?page=N — one page of the event feed, newest first.
        // POST / — publish a new event (requires WRITE permission, via extractor).
        .route("/", get(handlers::get_feed).post(handlers::create_event))
        // GET /user/{username}
        // A user's profile and their full event history. 404 for unknown usernames.
        .route("/user/{username}", get(handlers::get_user_page))
        // GET /event/{id}
        // Permalink view of a single event.
        .route("/event/{id}", get(handlers::get_event_details))
}
