pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod index;
pub mod listing;
pub mod logging;
pub mod prefs;
pub mod preview;
pub mod store;
pub mod tabs;
pub mod types;
pub mod ui;
pub mod widgets;
pub mod worker;
