use anyhow::Result;
use std::sync::Arc;

use quotation_backend::{
    app, config, logging,
    services::{autosave, Autosave, DirectorySink, LogSink, QuotationStore, SnapshotSink},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        "Starting quotation backend"
    );

    let store = QuotationStore::new(settings.change_channel_capacity);

    // Restore saved quotations and pick the autosave destination
    let sink: Arc<dyn SnapshotSink> = match &settings.snapshot_dir {
        Some(dir) => {
            let restored = autosave::load_snapshots(dir).await?;
            tracing::info!(count = restored.len(), dir = %dir.display(), "Snapshots restored");
            for quotation in restored {
                store.restore(quotation);
            }
            Arc::new(DirectorySink::new(dir.clone()))
        }
        None => {
            tracing::warn!("SNAPSHOT_DIR not set; quotations live in memory only");
            Arc::new(LogSink)
        }
    };

    let autosave = Autosave::spawn(store.clone(), sink, settings.autosave_debounce);

    // Create application state
    let state = app::AppState::new(settings.clone(), store);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Write whatever is still waiting on the debounce
    autosave.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
