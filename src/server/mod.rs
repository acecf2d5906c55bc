mod handlers;
mod state;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/countries", get(handlers::countries))
        .route("/api/cities", get(handlers::cities))
        .route("/api/night", get(handlers::night))
        .route("/api/times", get(handlers::prayer_times))
        .route("/api/methods", get(handlers::methods))
        .route("/api/settings", get(handlers::get_settings).put(handlers::put_settings))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    eprintln!("  Nightwatch server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}
