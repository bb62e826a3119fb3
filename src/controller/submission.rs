// Submission Controller - Sends the selected image for inference
//
// Runs at most one request at a time. The guard lives in StateManager::begin_submission;
// this module owns the async request and maps its outcome to result text.

use crate::metrics::Metrics;
use crate::models::{SubmissionState, TRANSPORT_FAILURE_MESSAGE};
use crate::services::InferenceClient;
use crate::state::{PendingSubmission, StateManager, SubmitRejection};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Drives the request lifecycle `Idle -> InFlight -> Succeeded | Failed`.
pub struct SubmissionController {
    state: Arc<StateManager>,
    client: Arc<dyn InferenceClient>,
    metrics: Arc<Metrics>,
    runtime: Handle,
}

impl SubmissionController {
    pub fn new(
        state: Arc<StateManager>,
        client: Arc<dyn InferenceClient>,
        metrics: Arc<Metrics>,
        runtime: Handle,
    ) -> Self {
        Self {
            state,
            client,
            metrics,
            runtime,
        }
    }

    /// Submit the selected image.
    ///
    /// Returns `None` without touching state when no image is selected or a request
    /// is already outstanding. Otherwise the state moves to `InFlight` before this
    /// returns and the request runs on the runtime; the handle resolves to the
    /// final state once it has been applied.
    pub fn submit(&self) -> Option<JoinHandle<SubmissionState>> {
        let pending = match self.state.begin_submission() {
            Ok(pending) => pending,
            Err(SubmitRejection::NoImage) => {
                tracing::debug!("Submit ignored: no image selected");
                self.metrics.record_submission_ignored();
                return None;
            }
            Err(SubmitRejection::AlreadyInFlight) => {
                tracing::debug!("Submit ignored: a request is already in flight");
                self.metrics.record_submission_ignored();
                return None;
            }
        };

        tracing::info!(
            "Starting request {} for {}",
            pending.request_id,
            pending.image.file_name
        );
        self.metrics.record_submission_started();

        let state = Arc::clone(&self.state);
        let client = Arc::clone(&self.client);
        let metrics = Arc::clone(&self.metrics);

        Some(
            self.runtime
                .spawn(run_submission(state, client, metrics, pending)),
        )
    }

    /// Submit and wait for the outcome.
    ///
    /// Returns `None` if the submission was ignored.
    pub async fn submit_and_wait(&self) -> Option<SubmissionState> {
        let handle = self.submit()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!("Submission task failed: {}", e);
                None
            }
        }
    }
}

/// Fails the outstanding request if the task unwinds or is dropped before it
/// applies an outcome, so the state can't stay `InFlight`.
struct CompletionGuard {
    state: Arc<StateManager>,
    metrics: Arc<Metrics>,
    request_id: u64,
    completed: bool,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        tracing::error!(
            "Request {} ended without an outcome - marking it failed",
            self.request_id
        );
        self.metrics.record_submission_failed();
        self.state.finish_submission(
            self.request_id,
            SubmissionState::Failed(TRANSPORT_FAILURE_MESSAGE.to_string()),
        );
    }
}

async fn run_submission(
    state: Arc<StateManager>,
    client: Arc<dyn InferenceClient>,
    metrics: Arc<Metrics>,
    pending: PendingSubmission,
) -> SubmissionState {
    let PendingSubmission { request_id, image } = pending;
    let mut guard = CompletionGuard {
        state: Arc::clone(&state),
        metrics: Arc::clone(&metrics),
        request_id,
        completed: false,
    };
    let start = Instant::now();

    let outcome = match client.predict(&image).await {
        Ok(prediction) => {
            metrics.record_submission_succeeded();
            SubmissionState::Succeeded(prediction.into_result_text())
        }
        Err(e) => {
            tracing::error!("Request {} for {} failed: {}", request_id, image.file_name, e);
            metrics.record_submission_failed();
            SubmissionState::Failed(TRANSPORT_FAILURE_MESSAGE.to_string())
        }
    };
    metrics.record_inference_time(start.elapsed());

    let selection_changed = state.read(|s| {
        s.selected_image
            .as_ref()
            .is_none_or(|current| !Arc::ptr_eq(&current.bytes, &image.bytes))
    });
    if selection_changed {
        tracing::warn!(
            "Selection changed while request {} for {} was in flight - applying its result anyway",
            request_id,
            image.file_name
        );
    }

    guard.completed = true;
    state.finish_submission(request_id, outcome.clone());
    outcome
}
