use std::sync::Arc;

use live_todos::adapters::{AppState, router};
use live_todos::config::ServerConfig;
use live_todos::storage::SqliteTodoStore;
use live_todos::transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let store = Arc::new(SqliteTodoStore::connect(&config.database_url).await?);
    let state = AppState::new(store);
    transport::serve(router(state), &config).await
}
