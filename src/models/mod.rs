pub mod station;
pub mod vehicle;

pub use station::Station;
pub use vehicle::{ServiceRef, Vehicle, VehicleStatus, VehiclesResponse};

use serde::{Deserialize, Deserializer};

/// Aggregate network counters from the stats endpoint
#[derive(Debug, Clone, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStatistics {
    /// Total vehicles known to the feed right now
    #[serde(default)]
    pub total_vehicles: u32,
    /// Vehicles currently between stations
    #[serde(default)]
    pub in_transit: u32,
    /// Vehicles running late
    #[serde(default)]
    pub delayed: u32,
    /// Cancelled services
    #[serde(default)]
    pub cancelled: u32,
    /// Mean delay across delayed vehicles, in seconds
    #[serde(default)]
    pub average_delay_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct StationsResponse {
    pub stations: Vec<Station>,
}

#[derive(Debug, Deserialize)]
pub struct StatsResponse {
    pub stats: GeneralStatistics,
}

#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

/// Accepts a coordinate as either a JSON number or a numeric string.
///
/// Older feed revisions sent latitude/longitude as strings; newer ones send
/// numbers. Both shapes are still seen in the wild.
pub(crate) fn de_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}
