pub mod tls;

pub use tls::*;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Serves `router` over HTTPS when TLS paths are configured, plain HTTP
/// otherwise. Runs until the server fails.
pub async fn serve(router: Router, config: &ServerConfig) -> anyhow::Result<()> {
    if let Some(paths) = &config.tls {
        let tls = configure_tls(paths).await?;
        tracing::info!(addr = %config.bind_addr, "Serving over HTTPS");
        axum_server::bind_rustls(config.bind_addr, tls)
            .serve(router.into_make_service())
            .await
            .context("received error from running server")?;
        return Ok(());
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to listen on {}", config.bind_addr))?;
    serve_on(listener, router).await
}

pub async fn serve_on(listener: TcpListener, router: Router) -> anyhow::Result<()> {
    tracing::info!(addr = ?listener.local_addr().ok(), "Serving over HTTP");
    axum::serve(listener, router)
        .await
        .context("received error from running server")?;
    Ok(())
}
