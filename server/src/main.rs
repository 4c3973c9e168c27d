use std::sync::Arc;

use tokio::net::TcpListener;
use todo_core::SqliteStore;
use todo_server::config::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_server=info,todo_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = if config.in_memory() {
        SqliteStore::open_in_memory()?
    } else {
        SqliteStore::open(&config.database_path)?
    };
    info!(database = %config.database_path.display(), "store ready");

    let listener = TcpListener::bind(config.addr()).await?;
    info!(addr = %listener.local_addr()?, "listening");
    todo_server::run(listener, Arc::new(store)).await?;
    Ok(())
}
