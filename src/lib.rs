pub mod ai;
pub mod app;
pub mod chat;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod reflection;
pub mod reminder;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::{spawn_reminder_task, AppState};
