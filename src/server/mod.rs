pub mod handlers;
pub mod types;
pub mod uploads;

use crate::{Result, config::Config, llm::GeminiClient};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use handlers::{AppState, Models};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uploads::UploadStore;

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/_test_model", get(handlers::test_model))
        .route("/analyze", post(handlers::analyze))
        .route("/scan-report", post(handlers::scan_report))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let llm = GeminiClient::new(&config.llm)?;

    let uploads_dir = std::env::current_dir()?.join(&config.server.uploads_dir);
    info!(
        text_model = %config.llm.text_model,
        image_model = %config.llm.image_model,
        uploads_dir = %uploads_dir.display(),
        "Initialized model client"
    );

    let app_state = AppState {
        llm: Arc::new(llm),
        models: Models::from(&config.llm),
        uploads: UploadStore::new(uploads_dir),
    };

    let app = router(app_state, config.server.max_upload_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
