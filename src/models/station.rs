use serde::{Deserialize, Serialize};

use super::de_coordinate;

/// A station from the station index, keyed by its network code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub code: String,
    pub designation: String,
    #[serde(deserialize_with = "de_coordinate")]
    pub latitude: f64,
    #[serde(deserialize_with = "de_coordinate")]
    pub longitude: f64,
    #[serde(default)]
    pub region: Option<String>,
    /// Railway lines this station sits on
    #[serde(default)]
    pub railways: Vec<String>,
}
