//! Services module - Side-effecting collaborators of the submission workflow.
//!
//! The services are **framework-agnostic**: they know nothing about controllers,
//! state events or presentation, which keeps them testable on their own.
//!
//! # Components
//!
//! - [`InferenceClient`]: The seam to the remote inference service. The production
//!   implementation, [`HttpInferenceClient`], sends one multipart `POST {base}/predict`
//!   per submission and parses the JSON answer into a [`Prediction`]. Transport
//!   failures (network, non-2xx status, non-JSON body) surface as [`InferenceError`].
//!
//! - [`PreviewStore`]: Allocates and revokes [`PreviewHandle`](crate::models::PreviewHandle)s
//!   for the selected image and counts live handles.
//!
//! # Usage Example
//!
//! ```ignore
//! use plantai::services::{HttpInferenceClient, InferenceClient};
//!
//! let client = HttpInferenceClient::new(config.predict_endpoint()?)?;
//! let prediction = client.predict(&image).await?;
//! println!("{}", prediction.into_result_text());
//! ```

pub mod inference;
pub mod preview;

pub use inference::{
    HttpInferenceClient, IMAGE_FIELD_NAME, InferenceClient, InferenceError, PREDICTION_FIELD,
    Prediction,
};
pub use preview::PreviewStore;
