use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use gram_api::auth::{self, AppState, AppStateInner};
use gram_api::interactions;
use gram_api::middleware::require_auth;
use gram_api::photos;
use gram_api::uploads;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gram=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("GRAM_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("GRAM_DB_PATH").unwrap_or_else(|_| "gram.db".into());
    let upload_dir = PathBuf::from(
        std::env::var("GRAM_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
    );
    let host = std::env::var("GRAM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GRAM_PORT")
        .unwrap_or_else(|_| "3001".into())
        .parse()?;

    // Init database and upload directory
    let db = gram_db::Database::open(&PathBuf::from(&db_path))?;
    std::fs::create_dir_all(&upload_dir)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir: upload_dir.clone(),
    });

    // Routes. Reads are public; everything that writes requires a token.
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/photos", get(photos::list_feed))
        .route("/api/users/{username}/photos", get(photos::list_profile))
        .route("/api/photos/{photo_id}/likes", get(interactions::get_likers))
        .route("/api/photos/{photo_id}/shares", get(interactions::get_share_count))
        .route("/api/photos/{photo_id}/comments", get(interactions::get_comments))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/api/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE)),
        )
        .route("/api/photos", post(photos::create_photo))
        .route("/api/photos/{photo_id}/like", post(interactions::like))
        .route("/api/photos/{photo_id}/share", post(interactions::share))
        .route("/api/photos/{photo_id}/comments", post(interactions::comment))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new(&upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("gram server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
