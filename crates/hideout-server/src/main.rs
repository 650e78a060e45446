//! Hideout Server - HTTP front end for operator hideout prediction

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hideout_server::api;
use hideout_server::config::Config;
use hideout_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("hideout_server=debug".parse()?))
        .init();

    tracing::info!("Starting Hideout Server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!(
        "Scoring strategy {}, search radius {} m, perimeter {} m",
        config.scoring_strategy,
        config.search_radius_m,
        config.perimeter_radius_m
    );
    let state = Arc::new(AppState::new(config)?);
    tracing::info!("{} known sites loaded", state.engine.registry().len());

    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
