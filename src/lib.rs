// PlantAI - Plant photo upload and disease inference client
//
// This is the library crate containing the workflow state machine, controllers and
// the inference client. The binary crate (main.rs) provides a command-line host.

pub mod config;
pub mod controller;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use controller::{DragEvent, IngestionController, SubmissionController};
pub use metrics::Metrics;
pub use models::{AppState, SelectedImage, Severity, SubmissionState, UserConfig};
pub use services::{HttpInferenceClient, InferenceClient, PreviewStore};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
