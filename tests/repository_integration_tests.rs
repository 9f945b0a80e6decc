use event_board::{
    models::{AdminEditProfileRequest, EditProfileRequest, Permission},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// DB-backed repository tests. They need a reachable Postgres (DATABASE_URL)
// and are therefore ignored by default:
//
//   DATABASE_URL=postgres://... cargo test -- --ignored

// --- Test Context and Setup ---

/// A simple structure to hold the database pool for testing
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool }
    }

    fn repo(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }

    /// Seeds the built-in roles and inserts a user on the default role.
    /// Usernames/emails are salted with a UUID so tests do not collide.
    async fn seed_user(&self, repo: &PostgresRepository) -> Uuid {
        repo.seed_roles().await;

        let id = Uuid::new_v4();
        let salt = id.simple().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, confirmed, role_id)
            VALUES ($1, $2, $3, true, (SELECT id FROM roles WHERE "default" = true))
            "#,
        )
        .bind(id)
        .bind(format!("user_{salt}@example.com"))
        .bind(format!("user_{salt}"))
        .execute(&self.pool)
        .await
        .expect("Failed to seed user");
        id
    }
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_seed_roles_masks_and_idempotency() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();

    repo.seed_roles().await;
    repo.seed_roles().await;

    let roles = repo.list_roles().await;
    let find = |name: &str| {
        roles
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("role {name} missing"))
    };

    let user = find("User");
    assert!(user.is_default);
    assert!(user.has_permission(Permission::WRITE));
    assert!(!user.has_permission(Permission::MODERATE));

    let moderator = find("Moderator");
    assert!(moderator.has_permission(Permission::WRITE | Permission::MODERATE));
    assert!(!moderator.has_permission(Permission::ADMIN));

    let administrator = find("Administrator");
    assert!(administrator.has_permission(Permission::ADMIN));

    // Re-seeding must not duplicate the set.
    assert_eq!(roles.iter().filter(|r| r.name == "User").count(), 1);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_event_roundtrip_with_author_join() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();
    let author_id = ctx.seed_user(&repo).await;

    let created = repo.create_event(author_id, "integration hello".to_string()).await;
    assert_eq!(created.author_id, author_id);
    assert!(created.author_username.is_some());

    let fetched = repo.get_event(created.id).await.expect("event not found");
    assert_eq!(fetched.body, "integration hello");
    assert_eq!(fetched.author_username, created.author_username);

    let updated = repo
        .update_event(created.id, "integration edited".to_string())
        .await
        .expect("update failed");
    assert_eq!(updated.body, "integration edited");
    assert_eq!(updated.id, created.id);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_feed_pagination_order_and_bounds() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();
    let author_id = ctx.seed_user(&repo).await;

    for i in 0..5 {
        repo.create_event(author_id, format!("pagination event {i}")).await;
    }

    let first = repo.list_events(1, 2).await;
    assert_eq!(first.items.len(), 2);
    assert!(first.total >= 5);
    assert!(first.has_next);
    // Newest first.
    assert!(first.items[0].timestamp >= first.items[1].timestamp);

    // Out-of-range pages come back empty rather than erroring.
    let far = repo.list_events(10_000, 2).await;
    assert!(far.items.is_empty());
    assert_eq!(far.total, first.total);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_profile_coalesce_keeps_omitted_fields() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();
    let user_id = ctx.seed_user(&repo).await;

    let first = repo
        .update_profile(
            user_id,
            EditProfileRequest {
                name: Some("Grace".to_string()),
                location: Some("Limerick".to_string()),
                about_me: Some("hello".to_string()),
            },
        )
        .await
        .expect("update failed");
    assert_eq!(first.name.as_deref(), Some("Grace"));

    // Omitting fields keeps the stored values.
    let second = repo
        .update_profile(
            user_id,
            EditProfileRequest {
                name: None,
                location: Some("Dublin".to_string()),
                about_me: None,
            },
        )
        .await
        .expect("update failed");
    assert_eq!(second.name.as_deref(), Some("Grace"));
    assert_eq!(second.location.as_deref(), Some("Dublin"));
    assert_eq!(second.about_me.as_deref(), Some("hello"));
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_update_and_uniqueness_probes() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();
    let first_id = ctx.seed_user(&repo).await;
    let second_id = ctx.seed_user(&repo).await;

    let first = repo.get_user(first_id).await.expect("user missing");
    let second = repo.get_user(second_id).await.expect("user missing");

    // Another user's email is taken; your own is not.
    assert!(repo.email_taken(&first.email, second_id).await);
    assert!(!repo.email_taken(&first.email, first_id).await);
    assert!(repo.username_taken(&second.username, first_id).await);

    let moderator = repo
        .list_roles()
        .await
        .into_iter()
        .find(|r| r.name == "Moderator")
        .expect("Moderator role missing");

    let updated = repo
        .admin_update_profile(
            first_id,
            AdminEditProfileRequest {
                confirmed: Some(false),
                role_id: Some(moderator.id),
                ..AdminEditProfileRequest::default()
            },
        )
        .await
        .expect("admin update failed");
    assert!(!updated.confirmed);
    assert_eq!(updated.role_id, moderator.id);

    // The permission mask resolved at auth time follows the new role.
    let identity = repo.get_auth_identity(first_id).await.expect("identity missing");
    assert!(identity.permissions & Permission::MODERATE != 0);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_touch_last_seen_advances() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repo();
    let user_id = ctx.seed_user(&repo).await;

    let before = repo.get_user(user_id).await.expect("user missing").last_seen;
    repo.touch_last_seen(user_id).await;
    let after = repo.get_user(user_id).await.expect("user missing").last_seen;

    assert!(after >= before);
}
