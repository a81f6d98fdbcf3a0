pub mod catalog;
pub mod config;
pub mod playback;
pub mod store;

/// Application name for XDG paths
pub const APP_NAME: &str = "setlist-vault";
