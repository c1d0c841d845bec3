use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::util::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Database,
    pub config: config::Config,
}

pub fn app(state: AppState) -> Router {
    // Every API route is scoped to the caller's X-User-Id
    let api_router = Router::new()
        .nest("/projects", routes::projects::router())
        .nest("/work-items", routes::work_items::router())
        .nest("/daily-reports", routes::daily_reports::router())
        .nest("/weekly-reports", routes::weekly_reports::router())
        .nest("/calendar", routes::calendar::router())
        .nest("/drafts", routes::drafts::router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_router)
        .fallback(serve_spa)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn serve_spa(State(state): State<AppState>, req: Request<Body>) -> Response {
    let static_dir = std::path::Path::new(&state.config.static_dir);

    // Try to serve static file first
    let static_path = static_dir.join(req.uri().path().trim_start_matches('/'));
    if static_path.is_file() {
        return match ServeDir::new(static_dir).oneshot(req).await {
            Ok(res) => res.into_response(),
            Err(never) => match never {},
        };
    }

    // For SPA routes, serve index.html
    match tokio::fs::read(static_dir.join("index.html")).await {
        Ok(contents) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            contents,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
