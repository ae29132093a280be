/// Snapshot reconciliation and selection
///
/// `ViewState` is the single in-memory view the map renders from: the
/// latest vehicle snapshot, the derived per-vehicle headings, and the one
/// selected vehicle. Each poll replaces the snapshot wholesale; nothing is
/// merged. The selection survives replacement only by its `train_number`
/// key, never by reference, so a fresh snapshot always shows fresh data for
/// the vehicle the user is looking at.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::Vehicle;

/// Zoom level used when centering on a vehicle picked from search
pub const SEARCH_FOCUS_ZOOM: f64 = 11.0;

/// Camera seam to the map layer. The view state only ever asks it to move;
/// rendering lives entirely on the other side.
pub trait MapCamera: Send + Sync {
    fn fly_to(&self, longitude: f64, latitude: f64, zoom: f64);
}

/// Last known position fix for a vehicle, with the bearing derived from
/// its previous movement
#[derive(Debug, Clone)]
struct HeadingFix {
    latitude: f64,
    longitude: f64,
    heading: Option<f64>,
}

#[derive(Default)]
pub struct ViewState {
    vehicles: Vec<Vehicle>,
    selected: Option<Vehicle>,
    popup_visible: bool,
    headings: HashMap<u32, HeadingFix>,
    camera: Option<Arc<dyn MapCamera>>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_camera(&mut self, camera: Arc<dyn MapCamera>) {
        self.camera = Some(camera);
    }

    /// Replace the current snapshot with a new one.
    ///
    /// Headings are re-derived first: a vehicle that moved gets the bearing
    /// of its movement, one that stayed put keeps its previous heading, and
    /// fixes for vehicles no longer present are dropped. Then the selection
    /// is re-resolved by train number; a vanished key clears it. An empty
    /// snapshot is a valid "no vehicles right now".
    pub fn apply_snapshot(&mut self, vehicles: Vec<Vehicle>) {
        let mut headings = HashMap::with_capacity(vehicles.len());
        for vehicle in &vehicles {
            let heading = match self.headings.get(&vehicle.train_number) {
                Some(previous)
                    if previous.latitude == vehicle.latitude
                        && previous.longitude == vehicle.longitude =>
                {
                    previous.heading
                }
                Some(previous) => Some(initial_bearing(
                    previous.latitude,
                    previous.longitude,
                    vehicle.latitude,
                    vehicle.longitude,
                )),
                None => None,
            };
            headings.insert(
                vehicle.train_number,
                HeadingFix {
                    latitude: vehicle.latitude,
                    longitude: vehicle.longitude,
                    heading,
                },
            );
        }
        self.headings = headings;

        if let Some(selected) = &self.selected {
            match vehicles
                .iter()
                .find(|v| v.train_number == selected.train_number)
            {
                Some(fresh) => self.selected = Some(fresh.clone()),
                None => {
                    debug!(
                        train_number = selected.train_number,
                        "Selected vehicle left the snapshot, clearing selection"
                    );
                    self.selected = None;
                    self.popup_visible = false;
                }
            }
        }

        self.vehicles = vehicles;
    }

    /// Select a vehicle (map click). Replaces any previous selection and
    /// shows the popup.
    pub fn select_vehicle(&mut self, vehicle: Vehicle) {
        self.selected = Some(vehicle);
        self.popup_visible = true;
    }

    /// Handle a map click on a vehicle feature.
    ///
    /// The properties crossed the generic feature-property channel and can
    /// be mangled; a decode failure is logged and the current selection is
    /// left untouched for this cycle. Returns whether a selection happened.
    pub fn select_from_feature(&mut self, properties: &serde_json::Value) -> bool {
        match crate::services::geojson::decode_vehicle(properties) {
            Ok(vehicle) => {
                self.select_vehicle(vehicle);
                true
            }
            Err(e) => {
                warn!(error = %e, "Ignoring click on undecodable vehicle feature");
                false
            }
        }
    }

    /// Select a vehicle from the search overlay: same as a click, plus the
    /// camera is flown to it.
    pub fn select_from_search(&mut self, vehicle: Vehicle) {
        if let Some(camera) = &self.camera {
            camera.fly_to(vehicle.longitude, vehicle.latitude, SEARCH_FOCUS_ZOOM);
        }
        self.select_vehicle(vehicle);
    }

    pub fn deselect_vehicle(&mut self) {
        self.selected = None;
        self.popup_visible = false;
    }

    /// Popup dismissed by the user. Closing it always clears the selection.
    pub fn on_popup_closed(&mut self) {
        self.deselect_vehicle();
    }

    pub fn selected(&self) -> Option<&Vehicle> {
        self.selected.as_ref()
    }

    pub fn popup_visible(&self) -> bool {
        self.popup_visible
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Derived heading for a vehicle, absent until it has moved between
    /// two snapshots
    pub fn heading(&self, train_number: u32) -> Option<f64> {
        self.headings.get(&train_number).and_then(|fix| fix.heading)
    }

    /// Snapshot iteration paired with each vehicle's derived heading, in
    /// snapshot order
    pub fn vehicles_with_headings(&self) -> impl Iterator<Item = (&Vehicle, Option<f64>)> {
        self.vehicles
            .iter()
            .map(|v| (v, self.heading(v.train_number)))
    }

    /// Linear search over the snapshot: train number prefix match, or
    /// case-insensitive substring match on the endpoint designations.
    pub fn search(&self, query: &str) -> Vec<&Vehicle> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let lowered = query.to_lowercase();
        self.vehicles
            .iter()
            .filter(|v| {
                v.train_number.to_string().starts_with(query)
                    || endpoint_matches(v.origin.as_ref(), &lowered)
                    || endpoint_matches(v.destination.as_ref(), &lowered)
            })
            .collect()
    }
}

fn endpoint_matches(endpoint: Option<&crate::models::ServiceRef>, lowered_query: &str) -> bool {
    endpoint
        .map(|e| e.designation.to_lowercase().contains(lowered_query))
        .unwrap_or(false)
}

/// Great-circle initial bearing (forward azimuth) from one fix to the next,
/// in degrees clockwise from north, normalized to [0, 360).
pub fn initial_bearing(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let phi1 = from_lat.to_radians();
    let phi2 = to_lat.to_radians();
    let delta_lambda = (to_lon - from_lon).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}
