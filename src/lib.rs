//! Studio Backend - library for app logic and testing

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod mail;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::models::{
    Blog, BlogNew, Category, Faq, Portfolio, Service, Subcategory, Testimonial,
};
use crate::db::store::DocumentStore;
use crate::error::ApiError;
use crate::mail::Mailer;
use crate::routes::auth::{AuthConfig, AuthService};
use crate::routes::resources::register;
use crate::state::AppState;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local front-end dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route")
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();

    let router = Router::new()
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", post(routes::auth::verify_token))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/contact", post(routes::contact::send_contact))
        .route("/api/site-config", get(routes::site::site_config))
        .route("/api/blogs/grouped", get(routes::listing::blogs_grouped))
        .route("/api/services/grouped", get(routes::listing::services_grouped))
        .route(
            "/api/portfolios/grouped",
            get(routes::listing::portfolios_grouped),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready));

    let router = register::<Category>(router);
    let router = register::<Subcategory>(router);
    let router = register::<Blog>(router);
    let router = register::<BlogNew>(router);
    let router = register::<Service>(router);
    let router = register::<Portfolio>(router);
    let router = register::<Testimonial>(router);
    let router = register::<Faq>(router);

    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

/// Pick the document store: Postgres when DATABASE_URL is set, memory otherwise.
async fn connect_store() -> Result<DocumentStore, sqlx::Error> {
    if std::env::var("DATABASE_URL").is_err() {
        tracing::warn!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
        return Ok(DocumentStore::memory());
    }

    let pool = db::init_pool(None).await?;
    db::run_migrations(&pool).await?;
    Ok(DocumentStore::postgres(pool))
}

/// Run the server (used by main).
pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&config.environment);

    let auth_config = AuthConfig::from_env();
    if config.is_production() {
        if auth_config.uses_default_secret() {
            panic!(
                "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
        if auth_config.admin_email == "admin@example.com" {
            tracing::warn!(
                "SECURITY: ADMIN_EMAIL is using the placeholder default. \
                 Set ADMIN_EMAIL to the studio's real address."
            );
        }
    }
    if auth_config.admin_password_hash.is_none() {
        tracing::warn!(
            "Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. Admin login is disabled."
        );
    }

    let store = connect_store().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize the document store");
        std::io::Error::other(e)
    })?;
    tracing::info!(backend = store.kind(), "Document store ready");

    let addr = config.bind_addr().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid HOST/PORT configuration: {}", e),
        )
    })?;

    let state = AppState::new(store, AuthService::new(auth_config), Mailer::from_env(), config);
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_returns_not_found_envelope() {
        let app = create_app(test_state());
        let res = app
            .oneshot(Request::get("/api/bookings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = create_app(test_state());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
    }
}
