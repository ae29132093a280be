use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cp_livemap::config::Config;
use cp_livemap::services::geojson;
use cp_livemap::sync::{SnapshotEvent, SyncManager};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into()),
        )
        .init();

    // Load config
    let config = Config::load("config.yaml").expect("Failed to load config");
    tracing::info!(base_url = %config.base_url, locale = ?config.locale, "Loaded configuration");

    // Start sync manager in background
    let sync_manager =
        Arc::new(SyncManager::new(config).expect("Failed to initialize sync manager"));
    let view_store = sync_manager.view_store();
    let mut events = sync_manager.events_sender().subscribe();
    let sync_manager_clone = sync_manager.clone();
    tokio::spawn(async move {
        sync_manager_clone.start().await;
    });

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SnapshotEvent::VehiclesUpdated { count, .. }) => {
                    // Rebuild the map layer input from the fresh snapshot
                    let view = view_store.read().await;
                    let features: Vec<_> = view
                        .vehicles_with_headings()
                        .map(|(vehicle, heading)| geojson::vehicle_feature(vehicle, heading))
                        .collect();
                    drop(view);
                    let collection = geojson::feature_collection(features);
                    tracing::debug!(
                        vehicles = count,
                        bytes = collection.to_string().len(),
                        "Rebuilt vehicle feature collection"
                    );
                }
                Ok(SnapshotEvent::ReloadRequired { server_version }) => {
                    tracing::warn!(server_version = %server_version, "Client out of date, exiting for restart");
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }
}
