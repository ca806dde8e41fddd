pub mod config;
pub mod state;

pub use config::AppConfig;
pub use state::{AppState, SharedState};

pub type Error = anyhow::Error;
