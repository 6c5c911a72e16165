use alloc::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::auth::TokenService;
use crate::config::Config;
use crate::presenters::Envelope;
use crate::repositories::UserRepository;

pub mod comment;
mod extract;
pub mod idea;
mod layers;
pub mod user;

pub use extract::{Authenticated, Viewer};
pub use layers::RateLimiter;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Everything a request handler may reach.
pub struct AppState {
    pub users: user::UserController,
    pub ideas: idea::IdeaController,
    pub comments: comment::CommentController,
    pub tokens: Arc<TokenService>,
    pub user_repository: Arc<dyn UserRepository + Sync + Send>,
    pub limiter: RateLimiter,
    pub environment: String,
}

pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    let auth = Router::new()
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .route("/me", get(user::me))
        .route("/profile", put(user::edit))
        .route("/change-password", put(user::change_password));

    let ideas = Router::new()
        .route("/", get(idea::gets).post(idea::submit))
        .route(
            "/:id",
            get(idea::get).put(idea::edit).delete(idea::withdraw),
        )
        .route("/:id/upvote", post(idea::upvote))
        .route("/:id/mentor", put(idea::assign_mentor))
        .route("/:id/review", put(idea::review))
        .route("/:id/feature", put(idea::feature))
        .route("/:id/milestones", post(idea::add_milestone))
        .route(
            "/:id/milestones/:milestone_id/complete",
            put(idea::complete_milestone),
        )
        .route("/:id/updates", post(idea::add_update))
        .route("/:id/comments", get(comment::gets).post(comment::add));

    let comments = Router::new()
        .route(
            "/ideas/:id/comments",
            get(comment::gets).post(comment::add),
        )
        .route("/:id", put(comment::edit).delete(comment::withdraw))
        .route("/:id/like", post(comment::like))
        .route("/:id/replies", get(comment::get_replies))
        .route("/:id/flag", post(comment::flag))
        .route("/:id/moderate", put(comment::moderate));

    Router::new()
        .route("/health", get(health))
        .route("/api", get(info))
        .nest("/api/auth", auth)
        .nest("/api/ideas", ideas)
        .nest("/api/comments", comments)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            layers::rate_limit,
        ))
        .layer(layers::cors(config))
        .layer(layers::security_headers())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "SparkHub API is running!",
        "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "environment": state.environment,
    }))
}

async fn info() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "SparkHub API v1.0",
        "tagline": "From Classroom Concept to Real-World Creation",
        "endpoints": {
            "auth": "/api/auth",
            "ideas": "/api/ideas",
            "comments": "/api/comments",
        },
    }))
}

async fn not_found(uri: Uri) -> Response {
    let path = uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());

    (
        StatusCode::NOT_FOUND,
        Envelope::failure(format!("Not found - {}", path)),
    )
        .into_response()
}
