use std::env;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dggforge_api::routes::create_router;
use dggforge_api::state::AppState;
use dggforge_core::config::EngineConfig;
use dggforge_engines::Dispatcher;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dggforge_api=info,dggforge_engines=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8000);

    let config = EngineConfig::from_env();
    if let Err(err) = config.validate() {
        tracing::warn!(
            error = %err,
            "engine configuration incomplete; external-engine requests will fail"
        );
    }

    tracing::info!(
        dggrid = %config.dggrid_path.display(),
        tmp_dir = %config.scratch_dir.display(),
        max_cells = config.max_cells,
        port = port,
        "Starting dggforge API server"
    );

    let state = Arc::new(AppState::new(Dispatcher::new(config)));

    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.unwrap();
}
