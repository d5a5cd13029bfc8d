pub mod error;
pub mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::service::ApsService;
use crate::utils::error::Result;
use routes::{create_router, RouterOptions};

/// 建立 APS service 與 router，並在設定的位址上提供服務直到收到 Ctrl-C
pub async fn serve(config: &AppConfig) -> Result<()> {
    let service = Arc::new(ApsService::new(config)?);
    tracing::info!("🪣 Using bucket '{}'", service.bucket());

    let app = create_router(
        service,
        RouterOptions {
            static_dir: PathBuf::from(&config.static_dir),
            max_upload_bytes: config.max_upload_bytes(),
        },
    );

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, static_dir = %config.static_dir, "aps-simple-viewer listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
