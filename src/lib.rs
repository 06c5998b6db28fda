pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod seed;
pub mod swipe;
pub mod ui;
pub mod undo;
