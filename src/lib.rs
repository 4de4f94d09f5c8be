pub mod analysis;
pub mod config;
pub mod grouping;
pub mod index;
pub mod models;
pub mod search;
pub mod snapshot;
pub mod tracker;

pub use tracker::Tracker;

/// Application name for XDG paths
pub const APP_NAME: &str = "setheard";
