use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Permission
///
/// Bit values composing the `roles.permissions` bitmask. A user holds a
/// permission when the bit is set on their role's mask. The values are stable
/// and stored in the database, so they must never be renumbered.
pub struct Permission;

impl Permission {
    pub const FOLLOW: i32 = 0x01;
    pub const COMMENT: i32 = 0x02;
    pub const WRITE: i32 = 0x04;
    pub const MODERATE: i32 = 0x08;
    pub const ADMIN: i32 = 0x10;
}

/// Role
///
/// Represents an authorization level from the `public.roles` table. Exactly one
/// role carries `default = true` and is assigned to newly provisioned users.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Role {
    pub id: i32,
    pub name: String,

    /// Maps SQL column "default" to Rust field "is_default".
    /// This renaming is necessary because `default` is a reserved keyword in Rust.
    #[sqlx(rename = "default")]
    #[serde(rename = "default")]
    pub is_default: bool,

    /// Combined `Permission` bits granted to users holding this role.
    pub permissions: i32,
}

impl Role {
    /// Returns true when every bit in `perm` is present on this role's mask.
    pub fn has_permission(&self, perm: i32) -> bool {
        self.permissions & perm == perm
    }
}

/// User
///
/// Represents the user's canonical identity and profile record stored in the
/// `public.users` table. The `id` is provisioned by the external auth system.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // Primary Key, mirroring the external auth system's user id.
    pub id: Uuid,
    pub email: String,
    pub username: String,
    // Whether the account's email address has been confirmed.
    pub confirmed: bool,

    // Free-form profile fields, all optional.
    pub name: Option<String>,
    pub location: Option<String>,
    pub about_me: Option<String>,

    #[ts(type = "string")]
    pub member_since: DateTime<Utc>,
    /// Refreshed on every authenticated request.
    #[ts(type = "string")]
    pub last_seen: DateTime<Utc>,

    // FK to public.roles.id.
    pub role_id: i32,
}

/// Event
///
/// A timestamped entry on the shared feed, from the `public.events` table.
/// Uses BigInt (i64) for the ID due to the high volume potential.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: i64,
    pub author_id: Uuid,
    pub body: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    // This field is loaded via a JOIN with `users` in the repository query.
    #[sqlx(default)]
    pub author_username: Option<String>,
}

/// AuthIdentity
///
/// The minimal identity row resolved during authentication: the user joined
/// with their role's permission mask. Internal to the auth flow; never
/// serialized to clients.
#[derive(Debug, Clone, FromRow, Default)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub username: String,
    pub role_id: i32,
    pub permissions: i32,
}

/// --- Request Payloads (Input Schemas) ---

/// CreateEventRequest
///
/// Input payload for posting a new event to the feed (POST /).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateEventRequest {
    pub body: String,
}

/// UpdateEventRequest
///
/// Input payload for replacing an event's body (POST /edit/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateEventRequest {
    pub body: String,
}

/// EditProfileRequest
///
/// Partial update payload for the caller's own profile (POST /edit-profile).
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so that only provided fields are touched; omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EditProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
}

/// AdminEditProfileRequest
///
/// Partial update payload for the administrator profile editor
/// (POST /edit-profile/{id}). Extends the self-service fields with account
/// identity, confirmation state, and role assignment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminEditProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
}

/// --- Feed & Profile Schemas (Output) ---

/// EventPage
///
/// One page of the event feed plus the pagination envelope the frontend needs
/// to render page controls: current position, page size, and totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EventPage {
    pub items: Vec<Event>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl EventPage {
    /// Builds the envelope from a fetched slice and the overall row count.
    /// A page beyond the end yields an empty `items` list, never an error.
    pub fn new(items: Vec<Event>, page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }
}

/// UserPage
///
/// Output schema for the public profile view (GET /user/{username}):
/// the user's record together with everything they have posted, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserPage {
    pub user: User,
    pub events: Vec<Event>,
}

/// AdminProfileView
///
/// Output schema for the administrator profile editor (GET /edit-profile/{id}).
/// Carries the assignable roles alongside the user so the client can render
/// the role selector without a second round trip.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminProfileView {
    pub user: User,
    pub roles: Vec<Role>,
}
