//! Tesisat Backend - admin back-office API for the plumbing site

pub mod activity;
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use crate::db::models::{Service, Slide, Work};
use crate::routes::content;
use crate::state::AppState;

/// Configure CORS from the allowed origin list.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::HeaderName::from_static(
            routes::ACTIVITY_WARNING_HEADER,
        )])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    let body_limit = state.config.body_limit();
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/admin/auth/login", post(routes::auth::login))
        .route("/admin/auth/logout", post(routes::auth::logout))
        .route("/admin/auth/session", get(routes::auth::session))
        .route(
            "/admin/services",
            get(content::list::<Service>)
                .post(content::create::<Service>)
                .put(content::update::<Service>)
                .delete(content::delete::<Service>),
        )
        .route("/admin/services/{id}", get(content::get_one::<Service>))
        .route(
            "/admin/slider",
            get(content::list::<Slide>)
                .post(content::create::<Slide>)
                .put(content::update::<Slide>)
                .delete(content::delete::<Slide>),
        )
        .route("/admin/slider/{id}", get(content::get_one::<Slide>))
        .route(
            "/admin/works",
            get(content::list::<Work>)
                .post(content::create::<Work>)
                .put(content::update::<Work>)
                .delete(content::delete::<Work>),
        )
        .route("/admin/works/{id}", get(content::get_one::<Work>))
        .route(
            "/admin/contact",
            get(routes::contact::get_contact)
                .post(routes::contact::save_contact)
                .put(routes::contact::update_contact),
        )
        .route(
            "/admin/users",
            get(routes::users::list_users)
                .post(routes::users::create_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/admin/users/{id}", get(routes::users::get_user))
        .route("/admin/profile", put(routes::profile::update_profile))
        .route("/admin/upload", post(routes::upload::upload_image))
        .route(
            "/admin/activities",
            get(routes::activities::list_activities).post(routes::activities::create_activity),
        )
        .route("/admin/stats", get(routes::stats::get_stats))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .nest_service("/uploads", uploads)
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Multipart/Json extractors default to 2 MB; one image plus form overhead must fit.
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::map_response(error::body_limit_as_json))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&config.environment);

    routes::health::init_start_time();

    // Refuse to start in production with the insecure default JWT secret.
    if config.is_production()
        && (config.jwt_secret.is_empty() || config.jwt_secret == DEFAULT_JWT_SECRET)
    {
        panic!(
            "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
             Refusing to start with the default secret."
        );
    }

    let pool = match db::init_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to initialize database pool: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    let state = AppState::new(config, pool);

    if let Err(e) = state.uploads.initialize().await {
        tracing::error!("Failed to create upload directory: {}", e);
        std::process::exit(1);
    }

    match state.config.admin.clone() {
        Some(seed) => {
            if let Err(e) = services::users::ensure_admin(&state, &seed).await {
                tracing::error!("Admin bootstrap failed: {}", e);
            }
        }
        None => tracing::info!("ADMIN_EMAIL not set, skipping admin bootstrap"),
    }

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
