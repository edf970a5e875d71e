pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use handlers::storage::AppState;
use shared::config::{self, Config, StorageBackend};
use shared::object_storage::{LocalStore, S3Store};

/// Создание хранилища объектов по конфигурации
fn build_state(config: &Config) -> anyhow::Result<AppState> {
    match config.storage.backend {
        StorageBackend::S3 => {
            let credentials = config::s3_credentials_from(|name| std::env::var(name).ok())?;
            let bucket = config.storage.s3.bucket.clone().ok_or_else(|| {
                anyhow::anyhow!("S3 bucket is not configured (set BUCKET or [storage.s3] bucket)")
            })?;
            let region = config.s3_region();

            tracing::info!(
                "Object storage: s3 bucket={} region={} endpoint={}",
                bucket,
                region,
                config.storage.s3.endpoint.as_deref().unwrap_or("aws")
            );

            let store = S3Store::new(
                bucket,
                region,
                credentials,
                config.storage.s3.endpoint.as_deref(),
                config.storage.s3.path_style,
            )?;
            Ok(AppState::new(Arc::new(store), config.url_ttl()))
        }
        StorageBackend::Local => {
            let local = &config.storage.local;
            let secret = match local.signing_secret.as_deref() {
                Some(secret) if !secret.is_empty() => secret.to_string(),
                _ => {
                    tracing::warn!(
                        "storage.local.signing_secret is not set; signed URLs will not survive a restart"
                    );
                    uuid::Uuid::new_v4().to_string()
                }
            };
            let root = config::resolve_path(&local.root);

            tracing::info!("Object storage: local root={}", root.display());

            let store = LocalStore::new(root, &local.public_base_url, secret)?;
            Ok(AppState::with_local(Arc::new(store), config.url_ttl()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    system::tracing::initialize()?;

    let config = config::load_config()?;
    let state = build_state(&config)?;
    let port = config.server.port;

    let app = routes::configure_routes(state, &config.server);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
