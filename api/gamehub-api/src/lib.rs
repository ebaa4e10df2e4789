use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use gamehub_app::{Application, ports::image_storage::MAX_IMAGE_BYTES};
use log::{info, warn};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

mod auth;
mod error;
mod extract;
mod http;
mod jwt;
mod rooms;
mod views;
mod ws;

pub use jwt::JwtTokenService;
pub use rooms::RealtimeHub;

/// A screenshot upload carries up to five images plus form overhead.
const MAX_BODY_BYTES: usize = 6 * MAX_IMAGE_BYTES;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Application>,
    pub realtime: Arc<RealtimeHub>,
    pub started_at: Instant,
}

fn cors_layer() -> CorsLayer {
    let origins = std::env::var("GAMEHUB_CORS_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:8081,http://localhost:3000".to_string());
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn router(image_dir: &str) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", http::auth::routes())
        .nest("/users", http::users::routes())
        .nest("/tournaments", http::tournaments::routes())
        .nest("/teams", http::teams::routes())
        .nest("/matches", http::matches::routes())
        .nest("/transactions", http::transactions::routes())
        .nest("/notifications", http::notifications::routes())
        .nest("/rewards", http::rewards::routes())
        .nest("/orders", http::orders::routes())
        .nest("/images", http::images::routes())
        .nest("/email", http::email::routes());

    Router::new()
        .nest("/api", api)
        .route("/health", get(http::health::health))
        .route("/ws", get(ws::ws_handler))
        .nest_service("/images", ServeDir::new(image_dir))
        .fallback(error::not_found)
        .layer(middleware::from_fn(error::error_envelope))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer())
}

pub async fn run(
    app: Arc<Application>,
    realtime: Arc<RealtimeHub>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) {
    let host = std::env::var("GAMEHUB_HOST").expect("GAMEHUB_HOST must be set");
    let port = std::env::var("GAMEHUB_HTTP_PORT")
        .expect("GAMEHUB_HTTP_PORT must be set")
        .parse::<u16>()
        .expect("GAMEHUB_HTTP_PORT must be a valid u16");
    let image_dir = std::env::var("GAMEHUB_IMAGE_DIR").expect("GAMEHUB_IMAGE_DIR must be set");

    let state = AppState {
        app,
        realtime,
        started_at: Instant::now(),
    };

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .unwrap();

    info!("HTTP server listening on {}:{}", host, port);
    axum::serve(listener, router(&image_dir).with_state(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .unwrap();

    info!("HTTP server shut down gracefully");
}
