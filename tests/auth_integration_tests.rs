use async_trait::async_trait;
use chrono::Utc;
use event_board::{
    AppState, create_router,
    auth::Claims,
    config::{AppConfig, Env},
    models::{
        AdminEditProfileRequest, AuthIdentity, EditProfileRequest, Event, EventPage, Permission,
        Role, User,
    },
    repository::{Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

// Exercises the AuthUser extractor end-to-end: bearer token parsing, JWT
// validation (signature, expiry), the database existence check, and the
// Env::Local bypass gating. Tokens are minted with the same secret the
// extractor validates against (AppConfig::default()).

const USER_ID: Uuid = Uuid::from_u128(77);

struct AuthMock {
    // None simulates a user deleted after their token was issued.
    identity: Option<AuthIdentity>,
}

fn known_identity() -> AuthIdentity {
    AuthIdentity {
        id: USER_ID,
        username: "member".to_string(),
        role_id: 1,
        permissions: Permission::FOLLOW | Permission::COMMENT | Permission::WRITE,
    }
}

#[async_trait]
impl Repository for AuthMock {
    async fn list_events(&self, page: i64, per_page: i64) -> EventPage {
        EventPage::new(vec![], page, per_page, 0)
    }
    async fn get_event(&self, _id: i64) -> Option<Event> {
        None
    }
    async fn events_by_author(&self, _author_id: Uuid) -> Vec<Event> {
        vec![]
    }
    async fn create_event(&self, author_id: Uuid, body: String) -> Event {
        Event {
            id: 1,
            author_id,
            body,
            ..Event::default()
        }
    }
    async fn update_event(&self, _id: i64, _body: String) -> Option<Event> {
        None
    }
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.identity.as_ref().map(|i| User {
            id,
            username: i.username.clone(),
            email: "member@example.com".to_string(),
            ..User::default()
        })
    }
    async fn get_user_by_username(&self, _username: &str) -> Option<User> {
        None
    }
    async fn update_profile(&self, user_id: Uuid, _req: EditProfileRequest) -> Option<User> {
        self.get_user(user_id).await
    }
    async fn admin_update_profile(&self, id: Uuid, _req: AdminEditProfileRequest) -> Option<User> {
        self.get_user(id).await
    }
    async fn email_taken(&self, _email: &str, _exclude: Uuid) -> bool {
        false
    }
    async fn username_taken(&self, _username: &str, _exclude: Uuid) -> bool {
        false
    }
    async fn get_auth_identity(&self, _id: Uuid) -> Option<AuthIdentity> {
        self.identity.clone()
    }
    async fn touch_last_seen(&self, _id: Uuid) {}
    async fn get_role(&self, _id: i32) -> Option<Role> {
        None
    }
    async fn list_roles(&self) -> Vec<Role> {
        vec![]
    }
    async fn seed_roles(&self) {}
}

async fn spawn_app(identity: Option<AuthIdentity>, env: Env) -> String {
    let repo = Arc::new(AuthMock { identity }) as RepositoryState;
    let config = AppConfig {
        env,
        ..AppConfig::default()
    };

    let state = AppState { repo, config };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    address
}

/// Mints a token signed with the test secret; `ttl_secs` may be negative to
/// produce an already-expired token.
fn mint_token(sub: Uuid, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub,
        exp: (now + ttl_secs).max(0) as usize,
        iat: now as usize,
    };
    let secret = AppConfig::default().jwt_secret;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to mint test token")
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let address = spawn_app(Some(known_identity()), Env::Local).await;
    let client = reqwest::Client::new();

    let token = mint_token(USER_ID, 3600);
    let response = client
        .get(&format!("{}/edit-profile", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let address = spawn_app(Some(known_identity()), Env::Local).await;
    let client = reqwest::Client::new();

    let token = mint_token(USER_ID, -3600);
    let response = client
        .get(&format!("{}/edit-profile", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let address = spawn_app(Some(known_identity()), Env::Local).await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/edit-profile", address))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let address = spawn_app(Some(known_identity()), Env::Local).await;
    let client = reqwest::Client::new();

    let token = mint_token(USER_ID, 3600);
    let response = client
        .get(&format!("{}/edit-profile", address))
        .header("Authorization", format!("Token {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_valid_token_for_deleted_user_is_rejected() {
    // The token verifies, but the account no longer exists.
    let address = spawn_app(None, Env::Local).await;
    let client = reqwest::Client::new();

    let token = mint_token(USER_ID, 3600);
    let response = client
        .get(&format!("{}/edit-profile", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_bypass_header_is_ignored_in_production() {
    let address = spawn_app(Some(known_identity()), Env::Production).await;
    let client = reqwest::Client::new();

    // No bearer token; the header alone must not authenticate outside Local.
    let response = client
        .get(&format!("{}/edit-profile", address))
        .header("x-user-id", USER_ID.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_bypass_header_works_locally() {
    let address = spawn_app(Some(known_identity()), Env::Local).await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/edit-profile", address))
        .header("x-user-id", USER_ID.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
