use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{GeneralStatistics, Station};
use crate::providers::cp::{ApiRequestSender, CpClient};
use crate::state::ViewState;

/// In-memory store for the reconciled view
pub type ViewStateStore = Arc<RwLock<ViewState>>;

/// In-memory store for the station index
pub type StationStore = Arc<RwLock<Vec<Station>>>;

/// In-memory store for aggregate statistics
pub type StatsStore = Arc<RwLock<Option<GeneralStatistics>>>;

/// Notification emitted after a store changed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotEvent {
    VehiclesUpdated {
        timestamp: String,
        count: usize,
        /// Whether this is the startup snapshot or a later refresh
        is_initial: bool,
    },
    StationsUpdated {
        timestamp: String,
        count: usize,
    },
    StatsUpdated {
        timestamp: String,
    },
    /// The server runs a newer release than this client; the embedding
    /// view should reload itself
    ReloadRequired {
        server_version: String,
    },
}

/// Sender for snapshot event notifications
pub type SnapshotEventSender = broadcast::Sender<SnapshotEvent>;

/// Monotonic request sequencing for one feed.
///
/// A sequence number is taken when a request is issued and committed when
/// its response is about to be applied. A commit loses if a higher number
/// already landed, which drops late out-of-order responses instead of
/// letting them overwrite fresher data.
pub struct FeedSequence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl FeedSequence {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Returns true when `seq` is newer than everything applied so far
    pub fn try_commit(&self, seq: u64) -> bool {
        self.applied.fetch_max(seq, Ordering::Relaxed) < seq
    }
}

impl Default for FeedSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Manages background polling of the live map feeds
pub struct SyncManager {
    client: CpClient,
    config: Config,
    view: ViewStateStore,
    stations: StationStore,
    stats: StatsStore,
    events_tx: SnapshotEventSender,
    diagnostics_tx: ApiRequestSender,
    reload_required: AtomicBool,
    vehicles_seq: FeedSequence,
    stations_seq: FeedSequence,
    stats_seq: FeedSequence,
}

impl SyncManager {
    pub fn new(config: Config) -> Result<Self, SyncError> {
        // Create broadcast channel for request diagnostics (capacity 100)
        let (diagnostics_tx, _) = broadcast::channel(100);

        let client = CpClient::new(config.base_url.clone(), &config.http, diagnostics_tx.clone())
            .map_err(|e| SyncError::ClientError(e.to_string()))?;

        // Create broadcast channel for snapshot events (capacity 16 - consumers read the stores anyway)
        let (events_tx, _) = broadcast::channel(16);

        Ok(Self {
            client,
            config,
            view: Arc::new(RwLock::new(ViewState::new())),
            stations: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(None)),
            events_tx,
            diagnostics_tx,
            reload_required: AtomicBool::new(false),
            vehicles_seq: FeedSequence::new(),
            stations_seq: FeedSequence::new(),
            stats_seq: FeedSequence::new(),
        })
    }

    /// Get a reference to the view state store
    pub fn view_store(&self) -> ViewStateStore {
        self.view.clone()
    }

    /// Get a reference to the station store
    pub fn station_store(&self) -> StationStore {
        self.stations.clone()
    }

    /// Get a reference to the statistics store
    pub fn stats_store(&self) -> StatsStore {
        self.stats.clone()
    }

    /// Get the snapshot event sender for subscribing
    pub fn events_sender(&self) -> SnapshotEventSender {
        self.events_tx.clone()
    }

    /// Get the request diagnostics sender for subscribing
    pub fn diagnostics_sender(&self) -> ApiRequestSender {
        self.diagnostics_tx.clone()
    }

    /// Whether a version mismatch has been detected since startup
    pub fn reload_required(&self) -> bool {
        self.reload_required.load(Ordering::Relaxed)
    }

    /// Start the background polling loops
    pub async fn start(self: Arc<Self>) {
        info!("Starting sync manager");

        // Initial fetch of everything, concurrently
        tokio::join!(
            self.sync_vehicles(true),
            self.sync_stations(),
            self.sync_stats(),
        );

        let vehicles_self = self.clone();
        let vehicles_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                vehicles_self.config.poll.vehicles_interval_secs,
            ));
            // Skip the first tick which fires immediately (we already synced above)
            interval.tick().await;

            loop {
                interval.tick().await;
                vehicles_self.sync_vehicles(false).await;
            }
        });

        let stations_self = self.clone();
        let stations_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                stations_self.config.poll.stations_interval_secs,
            ));
            interval.tick().await;

            loop {
                interval.tick().await;
                stations_self.sync_stations().await;
            }
        });

        let stats_self = self.clone();
        let stats_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                stats_self.config.poll.stats_interval_secs,
            ));
            interval.tick().await;

            loop {
                interval.tick().await;
                stats_self.sync_stats().await;
            }
        });

        let version_self = self.clone();
        let version_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
                version_self.config.poll.version_interval_secs,
            ));

            loop {
                interval.tick().await;
                version_self.check_version().await;
            }
        });

        // Wait for the loops (they run forever)
        let _ = tokio::join!(
            vehicles_handle,
            stations_handle,
            stats_handle,
            version_handle
        );
    }

    /// Poll the vehicle snapshot and apply it to the view state
    async fn sync_vehicles(&self, is_initial: bool) {
        let seq = self.vehicles_seq.next();
        match self.client.get_vehicles().await {
            Ok(vehicles) => {
                let count = vehicles.len();
                {
                    let mut view = self.view.write().await;
                    if !self.vehicles_seq.try_commit(seq) {
                        debug!(seq, "Dropping stale vehicle response");
                        return;
                    }
                    view.apply_snapshot(vehicles);
                }

                // Ignore send errors - they just mean no one is listening
                let _ = self.events_tx.send(SnapshotEvent::VehiclesUpdated {
                    timestamp: Utc::now().to_rfc3339(),
                    count,
                    is_initial,
                });
                info!(count, "Applied vehicle snapshot");
            }
            Err(e) => {
                warn!(error = %e, "Vehicle poll failed, keeping previous snapshot");
            }
        }
    }

    /// Poll the station index
    async fn sync_stations(&self) {
        let seq = self.stations_seq.next();
        match self.client.get_stations().await {
            Ok(stations) => {
                let count = stations.len();
                {
                    let mut store = self.stations.write().await;
                    if !self.stations_seq.try_commit(seq) {
                        debug!(seq, "Dropping stale station response");
                        return;
                    }
                    *store = stations;
                }

                let _ = self.events_tx.send(SnapshotEvent::StationsUpdated {
                    timestamp: Utc::now().to_rfc3339(),
                    count,
                });
                info!(count, "Applied station snapshot");
            }
            Err(e) => {
                warn!(error = %e, "Station poll failed, keeping previous snapshot");
            }
        }
    }

    /// Poll aggregate statistics
    async fn sync_stats(&self) {
        let seq = self.stats_seq.next();
        match self.client.get_stats().await {
            Ok(stats) => {
                {
                    let mut store = self.stats.write().await;
                    if !self.stats_seq.try_commit(seq) {
                        debug!(seq, "Dropping stale stats response");
                        return;
                    }
                    *store = Some(stats);
                }

                let _ = self.events_tx.send(SnapshotEvent::StatsUpdated {
                    timestamp: Utc::now().to_rfc3339(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Stats poll failed, keeping previous snapshot");
            }
        }
    }

    /// Compare the server version against our own and latch the reload
    /// flag on the first mismatch. Not an error path: the data polled so
    /// far stays valid.
    async fn check_version(&self) {
        match self.client.get_version().await {
            Ok(server_version) => {
                if server_version == env!("CARGO_PKG_VERSION") {
                    return;
                }
                let already_flagged = self.reload_required.swap(true, Ordering::Relaxed);
                if !already_flagged {
                    warn!(
                        server = %server_version,
                        client = env!("CARGO_PKG_VERSION"),
                        "Server version changed, reload required"
                    );
                    let _ = self
                        .events_tx
                        .send(SnapshotEvent::ReloadRequired { server_version });
                }
            }
            Err(e) => {
                debug!(error = %e, "Version check failed");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("API client error: {0}")]
    ClientError(String),
}
