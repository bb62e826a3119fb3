//! Data models for the PlantAI client.
//!
//! - [`AppState`]: The explicit state container (selection, preview, submission, drag flag)
//! - [`SubmissionState`]: Idle / InFlight / Succeeded / Failed lifecycle of one request
//! - [`Severity`]: Presentation severity derived from result text
//! - [`SelectedImage`] and [`PreviewHandle`]: The picked image and its local preview reference
//! - [`UserConfig`]: Endpoint and logging settings loaded from `PlantAI Config.yaml`
//!
//! # Architecture Note
//!
//! State updates go through [`StateManager`](crate::state::StateManager) so that change
//! events are emitted and no transition bypasses the single-flight check.

pub mod app_state;
pub mod config;
pub mod image;

pub use app_state::{
    AppState, NO_PREDICTION_MESSAGE, Severity, SubmissionState,
    TRANSPORT_FAILURE_MESSAGE,
};
pub use config::{PREDICT_PATH, UserConfig};
pub use image::{PreviewHandle, SelectedImage};
