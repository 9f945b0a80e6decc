use crate::models::{
    AdminEditProfileRequest, AuthIdentity, EditProfileRequest, Event, EventPage, Permission, Role,
    User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Feed ---
    // One page of the shared feed, newest first. Pages are 1-based; a page past
    // the end yields an empty item list (never an error).
    async fn list_events(&self, page: i64, per_page: i64) -> EventPage;
    async fn get_event(&self, id: i64) -> Option<Event>;
    // Everything a single user has posted, newest first.
    async fn events_by_author(&self, author_id: Uuid) -> Vec<Event>;
    async fn create_event(&self, author_id: Uuid, body: String) -> Event;
    // Replaces the body. Authorization (author-or-admin) is the handler's job.
    async fn update_event(&self, id: i64, body: String) -> Option<Event>;

    // --- Users & Profiles ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    // Self-service profile update: name/location/about_me only. Uses COALESCE
    // so omitted fields keep their stored value.
    async fn update_profile(&self, user_id: Uuid, req: EditProfileRequest) -> Option<User>;
    // Administrator update: identity, confirmation, role, and profile fields.
    async fn admin_update_profile(&self, id: Uuid, req: AdminEditProfileRequest) -> Option<User>;
    // Uniqueness probes for the admin editor; `exclude` is the user being edited.
    async fn email_taken(&self, email: &str, exclude: Uuid) -> bool;
    async fn username_taken(&self, username: &str, exclude: Uuid) -> bool;

    // --- Auth & Roles ---
    // The user joined with their role's permission mask; the auth extractor's lookup.
    async fn get_auth_identity(&self, id: Uuid) -> Option<AuthIdentity>;
    // Refreshes `last_seen`. Failures are logged and swallowed.
    async fn touch_last_seen(&self, id: Uuid);
    async fn get_role(&self, id: i32) -> Option<Role>;
    async fn list_roles(&self) -> Vec<Role>;
    // Idempotent upsert of the built-in roles and their permission masks.
    async fn seed_roles(&self);
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Column list repeated across user queries; kept in one place so the RETURNING
// clauses cannot drift from the SELECTs.
const USER_COLUMNS: &str =
    "id, email, username, confirmed, name, location, about_me, member_since, last_seen, role_id";

#[async_trait]
impl Repository for PostgresRepository {
    /// list_events
    ///
    /// Fetches one feed page plus the total row count so the handler can build
    /// the pagination envelope. Joins `users` to enrich each event with the
    /// author's username, the same enrichment the single-event queries use.
    async fn list_events(&self, page: i64, per_page: i64) -> EventPage {
        let page = page.max(1);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_events count error: {:?}", e);
                0
            });

        let items = sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.author_id, e.body, e.timestamp, u.username AS author_username
            FROM events e
            JOIN users u ON e.author_id = u.id
            ORDER BY e.timestamp DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_events error: {:?}", e);
            vec![]
        });

        EventPage::new(items, page, per_page, total)
    }

    /// get_event
    ///
    /// Single event retrieval by ID, enriched with the author's username.
    async fn get_event(&self, id: i64) -> Option<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.author_id, e.body, e.timestamp, u.username AS author_username
            FROM events e
            JOIN users u ON e.author_id = u.id
            WHERE e.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_event error: {:?}", e);
            None
        })
    }

    /// events_by_author
    ///
    /// All of a user's events for the profile page, newest first. Unpaginated:
    /// the profile view shows the full history.
    async fn events_by_author(&self, author_id: Uuid) -> Vec<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT e.id, e.author_id, e.body, e.timestamp, u.username AS author_username
            FROM events e
            JOIN users u ON e.author_id = u.id
            WHERE e.author_id = $1
            ORDER BY e.timestamp DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("events_by_author error: {:?}", e);
            vec![]
        })
    }

    /// create_event
    ///
    /// Inserts a new event and immediately joins with `users` to return the
    /// enriched row. Uses a CTE (Common Table Expression) to perform the insert
    /// and subsequent join in one query.
    async fn create_event(&self, author_id: Uuid, body: String) -> Event {
        sqlx::query_as::<_, Event>(
            r#"
            WITH inserted AS (
                INSERT INTO events (author_id, body) VALUES ($1, $2)
                RETURNING id, author_id, body, timestamp
            )
            SELECT i.id, i.author_id, i.body, i.timestamp, u.username AS author_username
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert event")
    }

    /// update_event
    ///
    /// Replaces the event body. Returns None when the ID does not exist.
    async fn update_event(&self, id: i64, body: String) -> Option<Event> {
        sqlx::query_as::<_, Event>(
            r#"
            WITH updated AS (
                UPDATE events SET body = $2 WHERE id = $1
                RETURNING id, author_id, body, timestamp
            )
            SELECT up.id, up.author_id, up.body, up.timestamp, u.username AS author_username
            FROM updated up JOIN users u ON up.author_id = u.id
            "#,
        )
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_event error: {:?}", e);
            None
        })
    }

    /// get_user
    ///
    /// Retrieves the full user record by ID.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    /// get_user_by_username
    ///
    /// Username lookup for the public profile route.
    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_username error: {:?}", e);
            None
        })
    }

    /// update_profile
    ///
    /// Self-service profile update. Uses the PostgreSQL `COALESCE` function to
    /// efficiently handle `Option<T>` fields, only updating a column if the
    /// corresponding field in `req` is `Some`.
    async fn update_profile(&self, user_id: Uuid, req: EditProfileRequest) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                about_me = COALESCE($4, about_me)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(req.name)
        .bind(req.location)
        .bind(req.about_me)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_profile error: {:?}", e);
            None
        })
    }

    /// admin_update_profile
    ///
    /// Administrator update across identity, confirmation, role, and profile
    /// fields. Same COALESCE pattern; uniqueness and role validity are checked
    /// by the handler before this runs.
    async fn admin_update_profile(&self, id: Uuid, req: AdminEditProfileRequest) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                username = COALESCE($3, username),
                confirmed = COALESCE($4, confirmed),
                role_id = COALESCE($5, role_id),
                name = COALESCE($6, name),
                location = COALESCE($7, location),
                about_me = COALESCE($8, about_me)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.email)
        .bind(req.username)
        .bind(req.confirmed)
        .bind(req.role_id)
        .bind(req.name)
        .bind(req.location)
        .bind(req.about_me)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("admin_update_profile error: {:?}", e);
            None
        })
    }

    /// email_taken
    ///
    /// True when another user (not `exclude`) already owns the email.
    async fn email_taken(&self, email: &str, exclude: Uuid) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("email_taken error: {:?}", e);
            false
        })
    }

    /// username_taken
    ///
    /// True when another user (not `exclude`) already owns the username.
    async fn username_taken(&self, username: &str, exclude: Uuid) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("username_taken error: {:?}", e);
            false
        })
    }

    /// get_auth_identity
    ///
    /// The authentication lookup: user joined with their role so the extractor
    /// gets the permission mask in a single round trip.
    async fn get_auth_identity(&self, id: Uuid) -> Option<AuthIdentity> {
        sqlx::query_as::<_, AuthIdentity>(
            r#"
            SELECT u.id, u.username, u.role_id, r.permissions
            FROM users u
            JOIN roles r ON u.role_id = r.id
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_auth_identity error: {:?}", e);
            None
        })
    }

    /// touch_last_seen
    ///
    /// Bumps `last_seen` to NOW(). Best-effort: a failure here must never fail
    /// the request that triggered it.
    async fn touch_last_seen(&self, id: Uuid) {
        if let Err(e) = sqlx::query("UPDATE users SET last_seen = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            tracing::error!("touch_last_seen error: {:?}", e);
        }
    }

    /// get_role
    ///
    /// Role lookup, used to validate admin role assignments.
    async fn get_role(&self, id: i32) -> Option<Role> {
        sqlx::query_as::<_, Role>(
            r#"SELECT id, name, "default", permissions FROM roles WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_role error: {:?}", e);
            None
        })
    }

    /// list_roles
    ///
    /// All assignable roles for the admin profile editor.
    async fn list_roles(&self) -> Vec<Role> {
        sqlx::query_as::<_, Role>(r#"SELECT id, name, "default", permissions FROM roles ORDER BY id"#)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_roles error: {:?}", e);
                vec![]
            })
    }

    /// seed_roles
    ///
    /// Upserts the built-in roles keyed by name so permission masks can be
    /// amended in code and rolled out on restart. Safe to run on every startup.
    async fn seed_roles(&self) {
        let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE;
        let moderator = user | Permission::MODERATE;
        let administrator = moderator | Permission::ADMIN;

        let presets: [(&str, bool, i32); 3] = [
            ("User", true, user),
            ("Moderator", false, moderator),
            ("Administrator", false, administrator),
        ];

        for (name, is_default, permissions) in presets {
            let result = sqlx::query(
                r#"
                INSERT INTO roles (name, "default", permissions) VALUES ($1, $2, $3)
                ON CONFLICT (name)
                DO UPDATE SET "default" = EXCLUDED."default", permissions = EXCLUDED.permissions
                "#,
            )
            .bind(name)
            .bind(is_default)
            .bind(permissions)
            .execute(&self.pool)
            .await;

            if let Err(e) = result {
                tracing::error!("seed_roles error for {}: {:?}", name, e);
            }
        }
    }
}
