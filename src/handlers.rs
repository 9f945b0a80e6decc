use crate::{
    AppState,
    auth::AuthUser,
    models::{
        AdminEditProfileRequest, AdminProfileView, CreateEventRequest, EditProfileRequest, Event,
        EventPage, Permission, UpdateEventRequest, User, UserPage,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// FeedQuery
///
/// Defines the accepted query parameters for the feed endpoint (GET /).
/// Used by Axum's Query extractor to safely bind the page number.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    /// 1-based page number. Defaults to 1; values below 1 are clamped.
    pub page: Option<i64>,
}

// --- Handlers ---

/// get_feed
///
/// [Public Route] One page of the shared event feed, newest first.
/// Page size comes from configuration; a page past the end returns an empty
/// item list rather than an error.
#[utoipa::path(
    get,
    path = "/",
    params(FeedQuery),
    responses((status = 200, description = "Event feed page", body = EventPage))
)]
pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Json<EventPage> {
    let page = query.page.unwrap_or(1).max(1);
    let feed = state
        .repo
        .list_events(page, state.config.events_per_page)
        .await;
    Json(feed)
}

/// create_event
///
/// [Authenticated Route] Posts a new event to the feed.
///
/// *Authorization*: Requires the WRITE permission bit on the caller's role.
/// A role stripped of WRITE (e.g. a suspended account) receives 403 even
/// though the token is valid.
#[utoipa::path(
    post,
    path = "/",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 403, description = "Missing WRITE permission"),
        (status = 422, description = "Empty body")
    )
)]
pub async fn create_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), StatusCode> {
    if !auth.can(Permission::WRITE) {
        return Err(StatusCode::FORBIDDEN);
    }
    if payload.body.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let event = state.repo.create_event(auth.id, payload.body).await;
    Ok((StatusCode::CREATED, Json(event)))
}

/// get_user_page
///
/// [Public Route] A user's profile together with everything they have posted,
/// newest first. 404 when the username is unknown.
#[utoipa::path(
    get,
    path = "/user/{username}",
    params(("username" = String, Path, description = "Profile username")),
    responses(
        (status = 200, description = "Profile and events", body = UserPage),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_user_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserPage>, StatusCode> {
    let user = state
        .repo
        .get_user_by_username(&username)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let events = state.repo.events_by_author(user.id).await;
    Ok(Json(UserPage { user, events }))
}

/// get_event_details
///
/// [Public Route] Retrieves a single event by ID. 404 if missing.
#[utoipa::path(
    get,
    path = "/event/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, StatusCode> {
    match state.repo.get_event(id).await {
        Some(event) => Ok(Json(event)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_own_profile
///
/// [Authenticated Route] The caller's current profile record, i.e. the values
/// the profile editor starts from.
#[utoipa::path(
    get,
    path = "/edit-profile",
    responses((status = 200, description = "Current profile", body = User))
)]
pub async fn get_own_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, StatusCode> {
    // The extractor has already verified existence; a miss here means the
    // account was deleted between the lookup and this query.
    state
        .repo
        .get_user(auth.id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_own_profile
///
/// [Authenticated Route] Updates the caller's name, location, and about_me.
/// Omitted fields keep their stored values. Returns the updated record.
#[utoipa::path(
    post,
    path = "/edit-profile",
    request_body = EditProfileRequest,
    responses((status = 200, description = "Profile updated", body = User))
)]
pub async fn update_own_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<EditProfileRequest>,
) -> Result<Json<User>, StatusCode> {
    match state.repo.update_profile(auth.id, payload).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_profile_admin
///
/// [Admin Route] Any user's full editable profile plus the list of assignable
/// roles, so the client can render the role selector.
///
/// *RBAC*: Strict enforcement of the ADMIN permission bit before any lookup.
#[utoipa::path(
    get,
    path = "/edit-profile/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile and assignable roles", body = AdminProfileView),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn get_profile_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminProfileView>, StatusCode> {
    if !auth.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    let user = state.repo.get_user(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let roles = state.repo.list_roles().await;
    Ok(Json(AdminProfileView { user, roles }))
}

/// update_profile_admin
///
/// [Admin Route] Updates any user's email, username, confirmation state, role,
/// and profile fields. Omitted fields keep their stored values.
///
/// *Validation*: email and username must not collide with another account
/// (409); an assigned role must exist (422).
#[utoipa::path(
    post,
    path = "/edit-profile/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AdminEditProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 403, description = "Not an administrator"),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "Email or username already taken"),
        (status = 422, description = "Unknown role")
    )
)]
pub async fn update_profile_admin(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminEditProfileRequest>,
) -> Result<Json<User>, StatusCode> {
    if !auth.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }

    // Existence first, so a bad ID reads as 404 rather than a conflict.
    if state.repo.get_user(id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    if let Some(email) = &payload.email {
        if state.repo.email_taken(email, id).await {
            return Err(StatusCode::CONFLICT);
        }
    }
    if let Some(username) = &payload.username {
        if state.repo.username_taken(username, id).await {
            return Err(StatusCode::CONFLICT);
        }
    }
    if let Some(role_id) = payload.role_id {
        if state.repo.get_role(role_id).await.is_none() {
            return Err(StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    match state.repo.admin_update_profile(id, payload).await {
        Some(user) => Ok(Json(user)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// get_event_for_edit
///
/// [Authenticated Route] Fetches an event for editing, i.e. the body the editor
/// starts from.
///
/// *Authorization*: Only the author or a holder of the ADMIN bit may edit;
/// everyone else receives 403.
#[utoipa::path(
    get,
    path = "/edit/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event to edit", body = Event),
        (status = 403, description = "Not the author and not an administrator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event_for_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Event>, StatusCode> {
    let event = state.repo.get_event(id).await.ok_or(StatusCode::NOT_FOUND)?;

    if event.author_id != auth.id && !auth.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(Json(event))
}

/// update_event
///
/// [Authenticated Route] Replaces an event's body under the same
/// author-or-admin rule as `get_event_for_edit`. Returns the updated event.
#[utoipa::path(
    post,
    path = "/edit/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 403, description = "Not the author and not an administrator"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Empty body")
    )
)]
pub async fn update_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<Event>, StatusCode> {
    let event = state.repo.get_event(id).await.ok_or(StatusCode::NOT_FOUND)?;

    if event.author_id != auth.id && !auth.is_admin() {
        return Err(StatusCode::FORBIDDEN);
    }
    if payload.body.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state.repo.update_event(id, payload.body).await {
        Some(updated) => Ok(Json(updated)),
        None => Err(StatusCode::NOT_FOUND),
    }
}
