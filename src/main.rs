//! Cardiorisk inference service.
//!
//! Main entry point for the HTTP server: loads the trained artifact set
//! once, builds the immutable service context, and serves predictions.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::FsArtifactStore;
use cardiorisk::application::InferenceService;
use cardiorisk::server::{build_router, ServiceContext};

/// Environment variable overriding the listen address.
const LISTEN_ENV: &str = "CARDIORISK_LISTEN";

const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cardiorisk inference service...");

    // Artifacts resolve relative to the binary unless overridden, so the
    // service is independent of the launch directory.
    let store = FsArtifactStore::resolve_default()?;
    tracing::info!(dir = %store.dir().display(), "Loading artifact set");
    let inference = InferenceService::from_store(&store)?;
    let context = Arc::new(ServiceContext::new(inference));

    let listen_addr =
        std::env::var(LISTEN_ENV).unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    let app = build_router(context);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(%listen_addr, "Inference service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
