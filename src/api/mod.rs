use axum::{
    Json,
    Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod audit;
pub mod auth;
mod error;
pub mod excel;
pub mod infra_tasks;
pub mod session;
pub mod tasks;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub shared: SharedState,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth
    }

    #[must_use]
    pub fn ingest(&self) -> &Arc<dyn crate::services::IngestService> {
        &self.shared.ingest
    }

    #[must_use]
    pub fn audit(&self) -> &crate::services::AuditRecorder {
        &self.shared.audit
    }
}

pub fn create_app_state(shared: SharedState) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = SharedState::new(config).await?;
    Ok(create_app_state(shared))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.store().ping().await?;
    Ok(Json(serde_json::json!({
        "status": "Backend running",
        "uptime": state.start_time.elapsed().as_secs(),
    })))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let admin_routes = Router::new()
        .route("/auth/pending", get(auth::list_pending))
        .route("/auth/approve/{id}", post(auth::approve_signup))
        .route("/auth/decline/{id}", post(auth::decline_signup))
        .route("/auth/users", get(auth::list_users).post(auth::create_user))
        .route("/auth/users/{id}", patch(auth::update_user))
        .route("/audit", get(audit::list_audit))
        .route_layer(middleware::from_fn(session::require_admin));

    let session_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(middleware::from_fn(session::require_auth));

    let open_routes = Router::new()
        .route("/auth/register-admin", post(auth::register_admin))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signup-status", get(auth::signup_status))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/set-password", post(auth::set_password))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/pending-public", get(auth::list_pending_public))
        .route("/auth/approve-public/{id}", post(auth::approve_signup_public))
        .route("/auth/decline-public/{id}", post(auth::decline_signup_public))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            "/infra-tasks",
            get(infra_tasks::list_infra_tasks).post(infra_tasks::create_infra_task),
        )
        .route("/infra-tasks/{id}", put(infra_tasks::update_infra_task))
        .route("/excel/replace", post(excel::replace_from_excel))
        .route("/excel/upload", post(excel::upload_excel))
        .route("/health", get(health));

    // Credentialed CORS cannot use a wildcard origin, so "*" means reflect
    // whatever Origin the browser sent.
    let allow_origin = if cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        AllowOrigin::list(origins)
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-admin-key"),
        ]);

    Router::new()
        .merge(open_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::load_session,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
