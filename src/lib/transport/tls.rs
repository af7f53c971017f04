use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsPaths;

pub async fn configure_tls(paths: &TlsPaths) -> Result<RustlsConfig, anyhow::Error> {
    RustlsConfig::from_pem_file(&paths.cert, &paths.key)
        .await
        .map_err(|e| anyhow::anyhow!("failed to load TLS certificate: {e}"))
}
