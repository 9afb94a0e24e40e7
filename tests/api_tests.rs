use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use tracktower::api::AppState;
use tracktower::config::Config;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "correct-horse-battery";

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection keeps every query on the same in-memory db.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = tracktower::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (tracktower::api::router(state.clone()), state)
}

async fn spawn_app_with_admin_key(key: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.admin.ui_key = Some(key.to_string());

    let state = tracktower::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (tracktower::api::router(state.clone()), state)
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

/// Pull `sid=<token>` out of the Set-Cookie header.
fn session_cookie(response: &Response) -> String {
    let raw = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a Set-Cookie header")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_with_cookie(
    method: &str,
    uri: &str,
    cookie: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Bootstrap the admin account and log in, returning the session cookie.
async fn login_as_admin(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register-admin",
            serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD,
                "name": "Administrator",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD,
                "loginAs": "admin",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    session_cookie(&response)
}

#[tokio::test]
async fn test_health() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_approval_end_to_end() {
    let (app, _state) = spawn_app().await;
    let admin_cookie = login_as_admin(&app).await;

    // Self-signup lands in pending state.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            serde_json::json!({
                "email": "a@b.com",
                "name": "Alice",
                "signupType": "customer",
                "customerName": "Acme",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let user_id = body["id"].as_i64().unwrap();

    // Status probe is case-insensitive on the email.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/signup-status?email=A@B.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");

    // Login before a password exists is refused.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": "a@b.com", "password": "whatever1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin approves; the response carries the reset token.
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            &format!("/auth/approve/{user_id}"),
            &admin_cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let reset_token = body["resetToken"].as_str().unwrap().to_string();
    assert_eq!(body["email"], "a@b.com");

    // Approving twice is guarded.
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            &format!("/auth/approve/{user_id}"),
            &admin_cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // First-time password set via the token.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/set-password",
            serde_json::json!({ "token": reset_token, "password": "s3cret-enough" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);

    // The token is single-use.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/set-password",
            serde_json::json!({ "token": reset_token, "password": "another-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Login with surrounding whitespace and different case still works.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": " A@B.com ", "password": "s3cret-enough" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("sid="));

    // /auth/me returns identity plus customer branding.
    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["role"], "customer");
    assert_eq!(body["customerName"], "Acme");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, _state) = spawn_app().await;
    let _admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": "nobody@nowhere.com", "password": "whatever1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_second_login_evicts_first_session() {
    let (app, _state) = spawn_app().await;
    let first_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &first_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Log in again from "another browser".
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second_cookie = session_cookie(&response);

    // The first token now behaves as anonymous.
    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &first_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &second_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_is_deleted_on_access() {
    let (app, state) = spawn_app().await;
    let _admin_cookie = login_as_admin(&app).await;

    let admin = state
        .store()
        .get_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .unwrap();

    // Plant a session that expired an hour ago.
    let stale_token = "a".repeat(64);
    let past = chrono::Utc::now() - chrono::Duration::hours(1);
    state
        .store()
        .insert_session(admin.id, &stale_token, past)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &format!("sid={stale_token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Lazy cleanup removed the row.
    let remaining = state
        .store()
        .get_session_with_user(&stale_token)
        .await
        .unwrap();
    assert!(remaining.is_none());
}

#[tokio::test]
async fn test_logout_revokes_the_session() {
    let (app, _state) = spawn_app().await;
    let cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/auth/logout",
            &cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_decline_is_terminal() {
    let (app, _state) = spawn_app().await;
    let admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            serde_json::json!({
                "email": "rejected@example.com",
                "name": "Bob",
                "signupType": "employee",
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let user_id = body["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            &format!("/auth/decline/{user_id}"),
            &admin_cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/signup-status?email=rejected@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "declined");

    // No path back: approval after decline is refused.
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            &format!("/auth/approve/{user_id}"),
            &admin_cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            serde_json::json!({
                "email": "dup@example.com",
                "name": "Dup",
                "signupType": "employee",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Same address with different case is the same account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            serde_json::json!({
                "email": "DUP@Example.com",
                "name": "Dup",
                "signupType": "employee",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_routes_are_gated() {
    let (app, _state) = spawn_app().await;

    // Anonymous: 401.
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/audit").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/pending")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Create an employee account through the admin, then check 403.
    let admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/auth/users",
            &admin_cookie,
            serde_json::json!({
                "email": "emp@example.com",
                "name": "Emp",
                "role": "employee",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let reset_token = body["resetToken"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/set-password",
            serde_json::json!({ "token": reset_token, "password": "emp-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": "emp@example.com", "password": "emp-password" }),
        ))
        .await
        .unwrap();
    let employee_cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/audit", &employee_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_as_role_mismatch() {
    let (app, _state) = spawn_app().await;
    let _admin_cookie = login_as_admin(&app).await;

    // The admin has no employee extension row.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({
                "email": ADMIN_EMAIL,
                "password": ADMIN_PASSWORD,
                "loginAs": "employee",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_change_password_requires_old_password() {
    let (app, _state) = spawn_app().await;
    let _admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/change-password",
            serde_json::json!({
                "email": ADMIN_EMAIL,
                "oldPassword": "not-the-password",
                "newPassword": "whatever-else",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/change-password",
            serde_json::json!({
                "email": ADMIN_EMAIL,
                "oldPassword": ADMIN_PASSWORD,
                "newPassword": "brand-new-password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": ADMIN_EMAIL, "password": "brand-new-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_admin_is_one_shot() {
    let (app, _state) = spawn_app().await;
    let _admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register-admin",
            serde_json::json!({
                "email": "second-admin@example.com",
                "password": "some-password",
                "name": "Impostor",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_crud_derives_duration() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks",
            serde_json::json!({
                "workstream": "Platform",
                "deliverable": "API",
                "status": "WIP",
                "startDate": "2024-01-01",
                "endDate": "2024-01-10",
                "progress": 30,
                "phase": "Build",
                "milestone": "M1",
                "owner": "dana",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["duration"], 9);
    let task_id = body["id"].as_i64().unwrap();

    // End before start clamps to zero.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/tasks/{task_id}"),
            serde_json::json!({
                "workstream": "Platform",
                "deliverable": "API",
                "startDate": "2024-01-10",
                "endDate": "2024-01-01",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["duration"], 0);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/tasks/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/tasks/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_create_requires_start_date() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/tasks",
            serde_json::json!({ "workstream": "Platform", "deliverable": "API" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_infra_task_start_date_never_null() {
    let (app, _state) = spawn_app().await;

    // Neither date supplied: falls back to "now".
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/infra-tasks",
            serde_json::json!({ "infraPhase": "Network", "taskName": "VPN setup" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["startDate"].is_string());
    assert!(body["endDate"].is_null());
    let task_id = body["id"].as_i64().unwrap();

    // Only an end date: start falls back to it.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/infra-tasks/{task_id}"),
            serde_json::json!({
                "infraPhase": "Network",
                "taskName": "VPN setup",
                "status": "WIP",
                "endDate": "2026-02-01",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["startDate"], body["endDate"]);
    assert_eq!(body["status"], "WIP");
}

#[tokio::test]
async fn test_excel_replace_rejects_bad_uploads() {
    let (app, _state) = spawn_app().await;

    // Wrong field name.
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"wrong\"\r\n\r\nx\r\n--{boundary}--\r\n"
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/excel/replace")
                .header(
                    header::CONTENT_TYPE,
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Garbage bytes under the right field name.
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"t.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\nnot an xlsx\r\n--{boundary}--\r\n"
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/excel/replace")
                .header(
                    header::CONTENT_TYPE,
                    format!("{}; boundary={boundary}", mime::MULTIPART_FORM_DATA),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_audit_feed_records_admin_actions() {
    let (app, _state) = spawn_app().await;
    let admin_cookie = login_as_admin(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/signup",
            serde_json::json!({
                "email": "audited@example.com",
                "name": "Aud",
                "signupType": "employee",
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let user_id = body["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            &format!("/auth/approve/{user_id}"),
            &admin_cookie,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/audit?limit=10", &admin_cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert!(!entries.is_empty());

    let approve = &entries[0];
    assert_eq!(approve["action"], "approve");
    assert_eq!(approve["entity"], "User");
    assert_eq!(approve["entityId"], user_id);
    assert_eq!(approve["user"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn test_append_skips_exact_duplicates() {
    use tracktower::db::TaskDraft;
    use tracktower::entities::tasks::TaskStatus;

    let (_app, state) = spawn_app().await;

    let draft = TaskDraft {
        workstream: "Platform".to_string(),
        deliverable: "API".to_string(),
        status: TaskStatus::Wip,
        duration: 9,
        start_date: chrono::Utc::now(),
        end_date: chrono::Utc::now(),
        progress: 0,
        phase: "Build".to_string(),
        milestone: "M1".to_string(),
        owner: "dana".to_string(),
    };

    let repo = state.store().task_repo();
    assert!(repo.insert_unless_duplicate(draft.clone()).await.unwrap());
    assert!(!repo.insert_unless_duplicate(draft).await.unwrap());

    assert_eq!(state.store().list_tasks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_seed_admin_is_idempotent() {
    let (_app, state) = spawn_app().await;

    let first = state
        .shared
        .auth
        .seed_admin("ops@example.com", "ChangeMe!23", "Ops")
        .await
        .unwrap();

    let second = state
        .shared
        .auth
        .seed_admin("ops@example.com", "ChangeMe!23", "Ops")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(state.store().list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_key_side_channel() {
    let (app, _state) = spawn_app_with_admin_key("sesame").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/pending-public?key=sesame")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Header variant works too.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/pending-public")
                .header("x-admin-key", "sesame")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/pending-public?key=wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Disabled entirely when no key is configured.
    let (app_no_key, _state) = spawn_app().await;
    let response = app_no_key
        .oneshot(
            Request::builder()
                .uri("/auth/pending-public?key=sesame")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
