pub mod format;
pub mod geojson;
pub mod popup;
