use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use hotel_rs::{
    auth::AccessPolicy,
    config::StoreBackend,
    create_app, init_observability,
    repositories::{
        DocumentStore, DynamoDbStore, GuestRepository, InMemoryStore, RoomRepository,
        TableManager,
    },
    shutdown_observability, Config, Metrics, RequestRouter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()
        .await
        .context("Failed to load configuration")?;

    init_observability(&config.observability)?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!(
        "Tables: guests={}, rooms={}",
        config.database.guests_table_name, config.database.rooms_table_name
    );

    let metrics = Arc::new(Metrics::new()?);

    let store: Arc<dyn DocumentStore> = match config.database.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Dynamodb => {
            let client = Arc::new(config.aws.dynamodb_client.clone());

            if config.database.auto_create_tables {
                TableManager::new(client.clone())
                    .create_all_tables(
                        &config.database.guests_table_name,
                        &config.database.rooms_table_name,
                    )
                    .await
                    .context("Failed to create tables")?;
            }

            info!("Using DynamoDB in {}", config.aws.region);
            Arc::new(DynamoDbStore::new(client, config.aws.region.clone()))
        }
    };

    let policy = AccessPolicy::new(&config.auth.admin_group, config.auth.block_list()?);

    let router = RequestRouter::new(
        GuestRepository::new(store.clone(), &config.database.guests_table_name),
        RoomRepository::new(store, &config.database.rooms_table_name),
        policy,
    )
    .with_metrics(metrics.clone());

    let app = create_app(Arc::new(router), metrics, &config.server);

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host {}", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    shutdown_observability().await;
    info!("Server shutdown complete");
    Ok(())
}
