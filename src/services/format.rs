/// Presentation formatting
///
/// Pure functions turning raw feed values (delay seconds, occupancy
/// percentages, status codes, fleet unit ids) into the labels and severity
/// tones shown next to a vehicle. Nothing here touches state or I/O, so the
/// popup and the overlays can call these freely on every render.
use serde::{Deserialize, Serialize};

/// Occupancy below this percentage still has seats to spare
pub const OCCUPANCY_SEATS_MAX: u8 = 65;
/// Occupancy below this percentage is crowded but boardable; at or above,
/// the train is full
pub const OCCUPANCY_CROWDED_MAX: u8 = 85;

/// Prefix of the regional diesel fleet whose unit numbers are displayed
/// with a dash (592111 -> 592-111)
pub const FLEET_DASH_PREFIX: &str = "592";

/// Display language. Portuguese is the fallback when nothing is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Pt,
    En,
}

/// Severity tone attached to a label, mapped to styling by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Info,
    Positive,
    Warning,
    Negative,
    Critical,
}

/// A user-facing label with its severity tone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub label: String,
    pub tone: Tone,
}

use crate::models::VehicleStatus;

/// Format a duration given in seconds.
///
/// Compact form concatenates the non-zero hour/minute/second parts
/// (`90 -> "1m30s"`, `3600 -> "1h"`); zero is `"0s"`. Verbose form spells
/// the units out in the given locale with comma/conjunction joining
/// (`3661 -> "1 hora, 1 minuto e 1 segundo"`). Callers pass magnitudes;
/// the sign of a delay is expressed by the surrounding label.
pub fn format_duration(seconds: u64, verbose: bool, locale: Locale) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if !verbose {
        if seconds == 0 {
            return "0s".to_string();
        }
        let mut out = String::new();
        if hours > 0 {
            out.push_str(&format!("{}h", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}m", minutes));
        }
        if secs > 0 {
            out.push_str(&format!("{}s", secs));
        }
        return out;
    }

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(spell_unit(hours, TimeUnit::Hour, locale));
    }
    if minutes > 0 {
        parts.push(spell_unit(minutes, TimeUnit::Minute, locale));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(spell_unit(secs, TimeUnit::Second, locale));
    }
    join_with_conjunction(parts, locale)
}

#[derive(Clone, Copy)]
enum TimeUnit {
    Hour,
    Minute,
    Second,
}

fn spell_unit(value: u64, unit: TimeUnit, locale: Locale) -> String {
    let word = match (locale, unit, value == 1) {
        (Locale::Pt, TimeUnit::Hour, true) => "hora",
        (Locale::Pt, TimeUnit::Hour, false) => "horas",
        (Locale::Pt, TimeUnit::Minute, true) => "minuto",
        (Locale::Pt, TimeUnit::Minute, false) => "minutos",
        (Locale::Pt, TimeUnit::Second, true) => "segundo",
        (Locale::Pt, TimeUnit::Second, false) => "segundos",
        (Locale::En, TimeUnit::Hour, true) => "hour",
        (Locale::En, TimeUnit::Hour, false) => "hours",
        (Locale::En, TimeUnit::Minute, true) => "minute",
        (Locale::En, TimeUnit::Minute, false) => "minutes",
        (Locale::En, TimeUnit::Second, true) => "second",
        (Locale::En, TimeUnit::Second, false) => "seconds",
    };
    format!("{} {}", value, word)
}

/// Join parts as "a, b e c" (pt) / "a, b and c" (en). A single part is
/// returned as-is; the output never carries a trailing separator.
fn join_with_conjunction(mut parts: Vec<String>, locale: Locale) -> String {
    let conjunction = match locale {
        Locale::Pt => "e",
        Locale::En => "and",
    };
    match parts.len() {
        0 => String::new(),
        1 => parts.remove(0),
        _ => {
            let last = parts.remove(parts.len() - 1);
            format!("{} {} {}", parts.join(", "), conjunction, last)
        }
    }
}

/// Classify a schedule deviation into a label and tone.
///
/// Zero is exactly on time; there is no tolerance band. The magnitude in
/// the label is always unsigned, the direction is carried by the wording.
pub fn classify_delay(delay_seconds: i32, locale: Locale) -> Classified {
    if delay_seconds == 0 {
        return Classified {
            label: match locale {
                Locale::Pt => "A horas".to_string(),
                Locale::En => "On time".to_string(),
            },
            tone: Tone::Neutral,
        };
    }

    let duration = format_duration(delay_seconds.unsigned_abs() as u64, false, locale);
    if delay_seconds > 0 {
        Classified {
            label: match locale {
                Locale::Pt => format!("Atrasado {}", duration),
                Locale::En => format!("Delayed {}", duration),
            },
            tone: Tone::Negative,
        }
    } else {
        Classified {
            label: match locale {
                Locale::Pt => format!("Adiantado {}", duration),
                Locale::En => format!("Early {}", duration),
            },
            tone: Tone::Info,
        }
    }
}

/// Classify an occupancy percentage into one of three bands
pub fn classify_occupancy(percent: u8, locale: Locale) -> Classified {
    if percent < OCCUPANCY_SEATS_MAX {
        Classified {
            label: match locale {
                Locale::Pt => "Lugares disponíveis".to_string(),
                Locale::En => "Seats available".to_string(),
            },
            tone: Tone::Positive,
        }
    } else if percent < OCCUPANCY_CROWDED_MAX {
        Classified {
            label: match locale {
                Locale::Pt => "Poucos lugares".to_string(),
                Locale::En => "Few seats left".to_string(),
            },
            tone: Tone::Warning,
        }
    } else {
        Classified {
            label: match locale {
                Locale::Pt => "Comboio cheio".to_string(),
                Locale::En => "Train full".to_string(),
            },
            tone: Tone::Critical,
        }
    }
}

/// Format a fleet unit identifier for display.
///
/// Six-character ids of the dash-prefixed fleet get a dash after the series
/// digits; every other id passes through unchanged.
pub fn format_fleet_unit(id: &str) -> String {
    if id.len() == 6 && id.starts_with(FLEET_DASH_PREFIX) {
        format!("{}-{}", &id[..3], &id[3..])
    } else {
        id.to_string()
    }
}

/// Localized phrase for a vehicle status. Total over the enum; every status
/// maps to a distinct non-empty phrase.
pub fn status_label(status: VehicleStatus, locale: Locale) -> &'static str {
    match locale {
        Locale::Pt => match status {
            VehicleStatus::NotStarted => "Viagem a iniciar",
            VehicleStatus::AtOrigin => "Na estação inicial",
            VehicleStatus::InTransit => "Em viagem",
            VehicleStatus::NearNext => "A aproximar-se da próxima estação",
            VehicleStatus::AtStation => "Na estação",
            VehicleStatus::Completed => "Viagem terminada",
            VehicleStatus::Cancelled => "Suprimido",
        },
        Locale::En => match status {
            VehicleStatus::NotStarted => "Not started",
            VehicleStatus::AtOrigin => "At origin station",
            VehicleStatus::InTransit => "In transit",
            VehicleStatus::NearNext => "Approaching next station",
            VehicleStatus::AtStation => "At station",
            VehicleStatus::Completed => "Journey completed",
            VehicleStatus::Cancelled => "Cancelled",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_format_duration_compact() {
        assert_eq!(format_duration(90, false, Locale::Pt), "1m30s");
        assert_eq!(format_duration(3600, false, Locale::Pt), "1h");
        assert_eq!(format_duration(0, false, Locale::Pt), "0s");
        assert_eq!(format_duration(3661, false, Locale::Pt), "1h1m1s");
        assert_eq!(format_duration(45, false, Locale::Pt), "45s");
        assert_eq!(format_duration(7200, false, Locale::Pt), "2h");
    }

    #[test]
    fn test_format_duration_verbose_pt() {
        assert_eq!(
            format_duration(3661, true, Locale::Pt),
            "1 hora, 1 minuto e 1 segundo"
        );
        assert_eq!(format_duration(120, true, Locale::Pt), "2 minutos");
        assert_eq!(format_duration(90, true, Locale::Pt), "1 minuto e 30 segundos");
        assert_eq!(format_duration(0, true, Locale::Pt), "0 segundos");
    }

    #[test]
    fn test_format_duration_verbose_en() {
        assert_eq!(
            format_duration(3661, true, Locale::En),
            "1 hour, 1 minute and 1 second"
        );
        assert_eq!(format_duration(3600, true, Locale::En), "1 hour");
    }

    #[test]
    fn test_verbose_never_trails_separator() {
        for seconds in [1, 59, 60, 61, 3599, 3600, 3601, 3660, 7322] {
            let out = format_duration(seconds, true, Locale::Pt);
            assert!(!out.ends_with(','), "trailing comma for {}: {}", seconds, out);
            assert!(!out.ends_with(" e"), "trailing conjunction for {}: {}", seconds, out);
        }
    }

    #[test]
    fn test_classify_delay_on_time() {
        let c = classify_delay(0, Locale::Pt);
        assert_eq!(c.label, "A horas");
        assert_eq!(c.tone, Tone::Neutral);
    }

    #[test]
    fn test_classify_delay_late() {
        let c = classify_delay(300, Locale::Pt);
        assert_eq!(c.label, "Atrasado 5m");
        assert_eq!(c.tone, Tone::Negative);
    }

    #[test]
    fn test_classify_delay_early_uses_unsigned_magnitude() {
        let c = classify_delay(-90, Locale::En);
        assert_eq!(c.label, "Early 1m30s");
        assert_eq!(c.tone, Tone::Info);
    }

    #[test]
    fn test_classify_occupancy_bands() {
        assert_eq!(classify_occupancy(40, Locale::Pt).tone, Tone::Positive);
        assert_eq!(classify_occupancy(70, Locale::Pt).tone, Tone::Warning);
        assert_eq!(classify_occupancy(90, Locale::Pt).tone, Tone::Critical);
    }

    #[test]
    fn test_classify_occupancy_boundaries() {
        assert_eq!(classify_occupancy(64, Locale::Pt).tone, Tone::Positive);
        assert_eq!(classify_occupancy(65, Locale::Pt).tone, Tone::Warning);
        assert_eq!(classify_occupancy(84, Locale::Pt).tone, Tone::Warning);
        assert_eq!(classify_occupancy(85, Locale::Pt).tone, Tone::Critical);
        assert_eq!(classify_occupancy(100, Locale::Pt).tone, Tone::Critical);
    }

    #[test]
    fn test_format_fleet_unit() {
        assert_eq!(format_fleet_unit("592111"), "592-111");
        assert_eq!(format_fleet_unit("592042"), "592-042");
        assert_eq!(format_fleet_unit("3401"), "3401");
        assert_eq!(format_fleet_unit("5921113"), "5921113");
        assert_eq!(format_fleet_unit("451002"), "451002");
        assert_eq!(format_fleet_unit(""), "");
    }

    #[test]
    fn test_status_labels_distinct_and_non_empty() {
        for locale in [Locale::Pt, Locale::En] {
            let labels: HashSet<_> = VehicleStatus::ALL
                .iter()
                .map(|s| status_label(*s, locale))
                .collect();
            assert_eq!(labels.len(), VehicleStatus::ALL.len());
            assert!(labels.iter().all(|l| !l.is_empty()));
        }
    }
}
