/// Map feature boundary
///
/// Vehicles and stations cross into the map layer as GeoJSON point features.
/// Feature properties are flat: nested fields (service, origin, destination,
/// units) are carried as JSON-encoded strings, because the property channel
/// only preserves scalars. `decode_vehicle` is the inverse and the one place
/// where malformed properties can surface, so it returns a `Result` instead
/// of trusting the round trip.
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::{Station, Vehicle, VehicleStatus};

/// Discriminator stored in every feature's `type` property so click
/// handlers can tell layers apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Vehicle,
    Station,
    Stop,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Vehicle => "vehicle",
            FeatureKind::Station => "station",
            FeatureKind::Stop => "stop",
        }
    }
}

/// Properties that must be JSON-decoded on the way back out of the map layer
const ENCODED_FIELDS: [&str; 4] = ["service", "origin", "destination", "units"];

#[derive(Debug, Error)]
pub enum FeatureDecodeError {
    #[error("feature properties are not an object")]
    NotAnObject,
    #[error("property '{field}' is not valid JSON: {source}")]
    InvalidField {
        field: &'static str,
        source: serde_json::Error,
    },
    #[error("properties do not describe a vehicle: {0}")]
    NotAVehicle(serde_json::Error),
}

/// Marker fill color for a status. Every status gets its own color so the
/// map legend stays unambiguous.
pub fn marker_color(status: VehicleStatus) -> &'static str {
    match status {
        VehicleStatus::NotStarted => "#5b7c99",
        VehicleStatus::AtOrigin => "#2e86ab",
        VehicleStatus::InTransit => "#388344",
        VehicleStatus::NearNext => "#7fb069",
        VehicleStatus::AtStation => "#f4a259",
        VehicleStatus::Completed => "#808080",
        VehicleStatus::Cancelled => "#d7263d",
    }
}

/// Build the point feature for a vehicle. `heading` is the derived bearing
/// in degrees, absent until the vehicle has moved.
pub fn vehicle_feature(vehicle: &Vehicle, heading: Option<f64>) -> Value {
    let mut properties = Map::new();
    properties.insert("type".into(), json!(FeatureKind::Vehicle.as_str()));
    properties.insert("trainNumber".into(), json!(vehicle.train_number));
    properties.insert("latitude".into(), json!(vehicle.latitude));
    properties.insert("longitude".into(), json!(vehicle.longitude));
    properties.insert("status".into(), json!(vehicle.status));
    properties.insert("delay".into(), json!(vehicle.delay));
    properties.insert("color".into(), json!(marker_color(vehicle.status)));
    if let Some(heading) = heading {
        properties.insert("heading".into(), json!(heading));
    }
    if let Some(occupancy) = vehicle.occupancy {
        properties.insert("occupancy".into(), json!(occupancy));
    }
    if let Some(speed) = vehicle.speed {
        properties.insert("speed".into(), json!(speed));
    }
    if let Some(station) = &vehicle.last_station {
        properties.insert("lastStation".into(), json!(station));
    }
    if let Some(timestamp) = &vehicle.timestamp {
        properties.insert("timestamp".into(), json!(timestamp));
    }
    if let Some(source) = &vehicle.source {
        properties.insert("source".into(), json!(source));
    }
    if let Some(run_date) = &vehicle.run_date {
        properties.insert("runDate".into(), json!(run_date));
    }

    // Nested values survive the property channel only as strings
    for (field, value) in [
        ("service", vehicle.service.as_ref().map(|v| json!(v))),
        ("origin", vehicle.origin.as_ref().map(|v| json!(v))),
        ("destination", vehicle.destination.as_ref().map(|v| json!(v))),
    ] {
        if let Some(value) = value {
            properties.insert(field.into(), json!(value.to_string()));
        }
    }
    if !vehicle.units.is_empty() {
        properties.insert("units".into(), json!(json!(vehicle.units).to_string()));
    }

    point_feature(vehicle.longitude, vehicle.latitude, properties)
}

/// Build the point feature for a station or minor stop
pub fn station_feature(station: &Station, kind: FeatureKind) -> Value {
    let mut properties = Map::new();
    properties.insert("type".into(), json!(kind.as_str()));
    properties.insert("code".into(), json!(station.code));
    properties.insert("designation".into(), json!(station.designation));
    if let Some(region) = &station.region {
        properties.insert("region".into(), json!(region));
    }
    if !station.railways.is_empty() {
        properties.insert("railways".into(), json!(json!(station.railways).to_string()));
    }

    point_feature(station.longitude, station.latitude, properties)
}

pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

fn point_feature(longitude: f64, latitude: f64, properties: Map<String, Value>) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [longitude, latitude],
        },
        "properties": Value::Object(properties),
    })
}

/// Decode a vehicle back out of feature properties.
///
/// The nested fields come back as JSON-encoded strings and any of them can
/// be garbage if the property channel mangled it. A failure here means the
/// caller abandons the interaction for this cycle; it never aborts snapshot
/// processing.
pub fn decode_vehicle(properties: &Value) -> Result<Vehicle, FeatureDecodeError> {
    let object = properties
        .as_object()
        .ok_or(FeatureDecodeError::NotAnObject)?;

    let mut object = object.clone();
    object.remove("type");
    object.remove("heading");
    object.remove("color");

    for field in ENCODED_FIELDS {
        let encoded = match object.get(field) {
            Some(Value::String(encoded)) => encoded.clone(),
            _ => continue,
        };
        let decoded: Value = serde_json::from_str(&encoded)
            .map_err(|source| FeatureDecodeError::InvalidField { field, source })?;
        object.insert(field.to_string(), decoded);
    }

    serde_json::from_value(Value::Object(object)).map_err(FeatureDecodeError::NotAVehicle)
}
