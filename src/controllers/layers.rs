use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{
    AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use moka::future::Cache;
use tower::layer::util::{Identity, Stack};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use super::AppState;
use crate::config::Config;
use crate::error::AppError;

const MAX_TRACKED_CLIENTS: u64 = 100_000;

/// Fixed-window request counter per client. A window opens on a client's first request and
/// its entry expires with it, so the table never outgrows `MAX_TRACKED_CLIENTS`.
#[derive(Clone)]
pub struct RateLimiter {
    hits: Cache<String, Arc<AtomicU32>>,
    max: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            hits: Cache::builder()
                .max_capacity(MAX_TRACKED_CLIENTS)
                .time_to_live(window)
                .build(),
            max,
        }
    }

    /// Counts a request and tells whether it is still within the limit.
    pub async fn admit(&self, client: String) -> bool {
        let counter = self
            .hits
            .get_with(client, async { Arc::new(AtomicU32::new(0)) })
            .await;

        counter.fetch_add(1, Ordering::Relaxed) < self.max
    }
}

fn client_of(req: &Request) -> String {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(ip) => ip.to_string(),
        None => req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let client = client_of(&req);

    match state.limiter.admit(client.clone()).await {
        true => next.run(req).await,
        false => {
            tracing::debug!("rate limited: {}", client);
            AppError::TooManyRequests.into_response()
        },
    }
}

pub fn cors(config: &Config) -> CorsLayer {
    let origins = config
        .allowed_origins()
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("ignoring CORS origin {:?}: {}", o, e);
                None
            },
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

type HeaderLayer = SetResponseHeaderLayer<HeaderValue>;

fn header(name: HeaderName, value: &'static str) -> HeaderLayer {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}

pub fn security_headers(
) -> Stack<HeaderLayer, Stack<HeaderLayer, Stack<HeaderLayer, Stack<HeaderLayer, Identity>>>> {
    tower::ServiceBuilder::new()
        .layer(header(X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .layer(header(X_FRAME_OPTIONS, "DENY"))
        .layer(header(X_XSS_PROTECTION, "1; mode=block"))
        .layer(header(REFERRER_POLICY, "strict-origin-when-cross-origin"))
        .into_inner()
}
