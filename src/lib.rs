pub mod config;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;
pub mod sync;
