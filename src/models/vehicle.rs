use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de_coordinate;

/// Lifecycle status of a vehicle as reported by the feed
///
/// The feed is authoritative: whatever status arrives is rendered as-is,
/// with no transition checking on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    NotStarted,
    AtOrigin,
    InTransit,
    NearNext,
    AtStation,
    Completed,
    Cancelled,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 7] = [
        VehicleStatus::NotStarted,
        VehicleStatus::AtOrigin,
        VehicleStatus::InTransit,
        VehicleStatus::NearNext,
        VehicleStatus::AtStation,
        VehicleStatus::Completed,
        VehicleStatus::Cancelled,
    ];

    /// Terminal statuses never transition to anything else for the run date
    pub fn is_terminal(self) -> bool {
        matches!(self, VehicleStatus::Completed | VehicleStatus::Cancelled)
    }
}

/// Code/designation pair used for the service itself and for its endpoint
/// stations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    pub code: String,
    pub designation: String,
}

/// A tracked vehicle from the live feed
///
/// `train_number` is the identity key: unique within a snapshot and stable
/// across snapshots for the same physical run on the same day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub train_number: u32,
    /// Decimal degrees, WGS84
    #[serde(deserialize_with = "de_coordinate")]
    pub latitude: f64,
    /// Decimal degrees, WGS84
    #[serde(deserialize_with = "de_coordinate")]
    pub longitude: f64,
    pub status: VehicleStatus,
    /// Seconds relative to schedule: negative = early, zero = on time,
    /// positive = late
    #[serde(default)]
    pub delay: i32,
    /// Load percentage 0-100, absent when the feed has no counter data
    #[serde(default)]
    pub occupancy: Option<u8>,
    /// Speed in km/h, only present in newer feed revisions
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    #[serde(default)]
    pub origin: Option<ServiceRef>,
    #[serde(default)]
    pub destination: Option<ServiceRef>,
    /// Fleet unit identifiers in consist order
    #[serde(default)]
    pub units: Vec<String>,
    /// Code of the last station passed or stopped at
    #[serde(default)]
    pub last_station: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Upstream feed that produced this entry
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub run_date: Option<String>,
}

/// The vehicles endpoint response
///
/// Newer feed revisions wrap the list in an object; the earliest revision
/// returned a bare array. Both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VehiclesResponse {
    Wrapped { vehicles: Vec<Vehicle> },
    Bare(Vec<Vehicle>),
}

impl VehiclesResponse {
    pub fn into_vehicles(self) -> Vec<Vehicle> {
        match self {
            VehiclesResponse::Wrapped { vehicles } => vehicles,
            VehiclesResponse::Bare(vehicles) => vehicles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_coordinates() {
        let json = r#"{
            "trainNumber": 523,
            "latitude": 38.71,
            "longitude": -9.12,
            "status": "IN_TRANSIT",
            "delay": 120
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.train_number, 523);
        assert_eq!(vehicle.latitude, 38.71);
        assert_eq!(vehicle.status, VehicleStatus::InTransit);
        assert_eq!(vehicle.delay, 120);
        assert!(vehicle.occupancy.is_none());
        assert!(vehicle.speed.is_none());
    }

    #[test]
    fn test_deserialize_string_coordinates() {
        let json = r#"{
            "trainNumber": 4401,
            "latitude": "41.1496",
            "longitude": "-8.6109",
            "status": "AT_STATION"
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.latitude, 41.1496);
        assert_eq!(vehicle.longitude, -8.6109);
    }

    #[test]
    fn test_deserialize_rejects_non_numeric_coordinate() {
        let json = r#"{
            "trainNumber": 1,
            "latitude": "north",
            "longitude": "-8.6",
            "status": "IN_TRANSIT"
        }"#;
        assert!(serde_json::from_str::<Vehicle>(json).is_err());
    }

    #[test]
    fn test_deserialize_full_entry() {
        let json = r#"{
            "trainNumber": 132,
            "latitude": 40.64,
            "longitude": -8.64,
            "status": "NEAR_NEXT",
            "delay": -60,
            "occupancy": 72,
            "speed": 198.5,
            "service": {"code": "AP", "designation": "Alfa Pendular"},
            "origin": {"code": "94-2006", "designation": "Lisboa - Santa Apolonia"},
            "destination": {"code": "94-1008", "designation": "Porto - Campanha"},
            "units": ["592111", "592042"],
            "lastStation": "94-5005",
            "source": "infra-feed"
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.delay, -60);
        assert_eq!(vehicle.occupancy, Some(72));
        assert_eq!(vehicle.speed, Some(198.5));
        assert_eq!(vehicle.service.unwrap().code, "AP");
        assert_eq!(vehicle.units.len(), 2);
        assert_eq!(vehicle.last_station.as_deref(), Some("94-5005"));
    }

    #[test]
    fn test_vehicles_response_wrapped_and_bare() {
        let wrapped = r#"{"vehicles": [{"trainNumber": 1, "latitude": 1.0, "longitude": 2.0, "status": "NOT_STARTED"}]}"#;
        let bare = r#"[{"trainNumber": 1, "latitude": 1.0, "longitude": 2.0, "status": "NOT_STARTED"}]"#;

        let from_wrapped: VehiclesResponse = serde_json::from_str(wrapped).unwrap();
        let from_bare: VehiclesResponse = serde_json::from_str(bare).unwrap();

        assert_eq!(from_wrapped.into_vehicles().len(), 1);
        assert_eq!(from_bare.into_vehicles().len(), 1);
    }

    #[test]
    fn test_status_wire_form() {
        let status: VehicleStatus = serde_json::from_str("\"NOT_STARTED\"").unwrap();
        assert_eq!(status, VehicleStatus::NotStarted);
        assert_eq!(
            serde_json::to_string(&VehicleStatus::NearNext).unwrap(),
            "\"NEAR_NEXT\""
        );
        assert!(serde_json::from_str::<VehicleStatus>("\"TELEPORTING\"").is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(VehicleStatus::Completed.is_terminal());
        assert!(VehicleStatus::Cancelled.is_terminal());
        assert!(!VehicleStatus::InTransit.is_terminal());
    }
}
