/// Detail popup content
///
/// Assembles everything the popup widget shows for the selected vehicle.
/// Pure extraction over the current snapshots; the widget itself lives in
/// the rendering layer.
use crate::models::{Station, Vehicle};
use crate::services::format::{
    classify_delay, classify_occupancy, format_fleet_unit, status_label, Classified, Locale,
};

/// Suffix some premium services carry in their designation. It is folded
/// into the `premium` flag instead of being displayed inline.
pub const PREMIUM_SUFFIX: &str = " (Alta Qualidade)";

/// Everything the popup renders for one vehicle
#[derive(Debug, Clone)]
pub struct PopupContent {
    /// "Comboio <number>"
    pub title: String,
    /// Formatted fleet units joined with " + ", absent when the consist is
    /// unknown
    pub fleet_units: Option<String>,
    pub service: Option<String>,
    pub premium: bool,
    pub delay: Classified,
    pub occupancy: Option<Classified>,
    pub occupancy_percent: Option<u8>,
    /// Speed line, only for feed revisions that report it
    pub speed_kmh: Option<f64>,
    /// "Origin → Destination"
    pub route: Option<String>,
    pub status: String,
    /// Designation of the last station, resolved against the station
    /// snapshot; falls back to the raw code when unknown
    pub last_station: Option<String>,
    pub updated_at: Option<String>,
    /// "via <feed>" attribution
    pub source: Option<String>,
}

pub fn build_popup(vehicle: &Vehicle, stations: &[Station], locale: Locale) -> PopupContent {
    let (service, premium) = match &vehicle.service {
        Some(service) => match service.designation.strip_suffix(PREMIUM_SUFFIX) {
            Some(stripped) => (Some(stripped.to_string()), true),
            None => (Some(service.designation.clone()), false),
        },
        None => (None, false),
    };

    let fleet_units = if vehicle.units.is_empty() {
        None
    } else {
        Some(
            vehicle
                .units
                .iter()
                .map(|u| format_fleet_unit(u))
                .collect::<Vec<_>>()
                .join(" + "),
        )
    };

    let route = match (&vehicle.origin, &vehicle.destination) {
        (Some(origin), Some(destination)) => Some(format!(
            "{} → {}",
            origin.designation, destination.designation
        )),
        _ => None,
    };

    let last_station = vehicle.last_station.as_ref().map(|code| {
        stations
            .iter()
            .find(|s| &s.code == code)
            .map(|s| s.designation.clone())
            .unwrap_or_else(|| code.clone())
    });

    PopupContent {
        title: format!("Comboio {}", vehicle.train_number),
        fleet_units,
        service,
        premium,
        delay: classify_delay(vehicle.delay, locale),
        occupancy: vehicle.occupancy.map(|p| classify_occupancy(p, locale)),
        occupancy_percent: vehicle.occupancy,
        speed_kmh: vehicle.speed,
        route,
        status: status_label(vehicle.status, locale).to_string(),
        last_station,
        updated_at: vehicle
            .timestamp
            .map(|t| t.format("%H:%M:%S").to_string()),
        source: vehicle.source.as_ref().map(|s| format!("via {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServiceRef, VehicleStatus};
    use crate::services::format::Tone;

    fn make_vehicle() -> Vehicle {
        Vehicle {
            train_number: 132,
            latitude: 40.64,
            longitude: -8.64,
            status: VehicleStatus::InTransit,
            delay: 300,
            occupancy: Some(90),
            speed: Some(201.0),
            service: Some(ServiceRef {
                code: "AP".to_string(),
                designation: "Alfa Pendular (Alta Qualidade)".to_string(),
            }),
            origin: Some(ServiceRef {
                code: "94-2006".to_string(),
                designation: "Lisboa - Santa Apolonia".to_string(),
            }),
            destination: Some(ServiceRef {
                code: "94-1008".to_string(),
                designation: "Porto - Campanha".to_string(),
            }),
            units: vec!["592111".to_string(), "592042".to_string()],
            last_station: Some("94-5005".to_string()),
            timestamp: None,
            source: Some("infra-feed".to_string()),
            run_date: None,
        }
    }

    fn make_station(code: &str, designation: &str) -> Station {
        Station {
            code: code.to_string(),
            designation: designation.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            region: None,
            railways: vec![],
        }
    }

    #[test]
    fn test_popup_strips_premium_suffix() {
        let popup = build_popup(&make_vehicle(), &[], Locale::Pt);
        assert_eq!(popup.service.as_deref(), Some("Alfa Pendular"));
        assert!(popup.premium);
    }

    #[test]
    fn test_popup_regular_service_not_premium() {
        let mut vehicle = make_vehicle();
        vehicle.service = Some(ServiceRef {
            code: "R".to_string(),
            designation: "Regional".to_string(),
        });
        let popup = build_popup(&vehicle, &[], Locale::Pt);
        assert_eq!(popup.service.as_deref(), Some("Regional"));
        assert!(!popup.premium);
    }

    #[test]
    fn test_popup_joins_formatted_fleet_units() {
        let popup = build_popup(&make_vehicle(), &[], Locale::Pt);
        assert_eq!(popup.fleet_units.as_deref(), Some("592-111 + 592-042"));
    }

    #[test]
    fn test_popup_resolves_last_station_designation() {
        let stations = vec![make_station("94-5005", "Entroncamento")];
        let popup = build_popup(&make_vehicle(), &stations, Locale::Pt);
        assert_eq!(popup.last_station.as_deref(), Some("Entroncamento"));
    }

    #[test]
    fn test_popup_falls_back_to_station_code() {
        let popup = build_popup(&make_vehicle(), &[], Locale::Pt);
        assert_eq!(popup.last_station.as_deref(), Some("94-5005"));
    }

    #[test]
    fn test_popup_lines() {
        let popup = build_popup(&make_vehicle(), &[], Locale::Pt);
        assert_eq!(popup.title, "Comboio 132");
        assert_eq!(popup.delay.label, "Atrasado 5m");
        assert_eq!(popup.occupancy.as_ref().unwrap().tone, Tone::Critical);
        assert_eq!(popup.occupancy_percent, Some(90));
        assert_eq!(popup.speed_kmh, Some(201.0));
        assert_eq!(
            popup.route.as_deref(),
            Some("Lisboa - Santa Apolonia → Porto - Campanha")
        );
        assert_eq!(popup.status, "Em viagem");
        assert_eq!(popup.source.as_deref(), Some("via infra-feed"));
        assert!(popup.updated_at.is_none());
    }
}
