// Presenter - Maps state and state changes to what the host displays
//
// The host surface is deliberately thin: it shows the preview, the result text
// and its severity class. Everything it needs is derived here from AppState.

use crate::models::{AppState, Severity};
use crate::state::StateChange;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// The result area as the host should render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub text: String,
    /// `None` while nothing should be shown.
    pub severity: Option<Severity>,
}

impl ResultView {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            text: state.result_text().to_string(),
            severity: state.submission.severity(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.severity.is_some() && !self.text.is_empty()
    }

    /// Single-line form for text hosts.
    pub fn render(&self) -> String {
        match self.severity {
            Some(severity) if severity.is_error() => format!("[error] {}", self.text),
            Some(_) => format!("[ok] {}", self.text),
            None => String::new(),
        }
    }
}

/// Status line describing where the workflow currently is.
pub fn status_message(state: &AppState) -> String {
    if state.submission.is_in_flight() {
        return "Analyzing...".to_string();
    }
    match &state.selected_image {
        Some(image) if state.submission.is_finished() => format!("Finished {}", image.file_name),
        Some(image) => format!("Ready to submit {}", image.file_name),
        None if state.drag_active => "Drop the image to select it".to_string(),
        None => "Select or drop a plant photo".to_string(),
    }
}

/// Text for a single change event, or `None` if it isn't worth showing.
pub fn render_change(change: &StateChange) -> Option<String> {
    match change {
        StateChange::ImageSelected {
            file_name,
            mime_type,
            size,
        } => Some(format!("Selected {} ({}, {} bytes)", file_name, mime_type, size)),
        StateChange::ImageCleared => Some("Selection cleared".to_string()),
        StateChange::PreviewChanged { .. } | StateChange::DragActiveChanged { .. } => None,
        StateChange::SubmissionStarted { file_name, .. } => {
            Some(format!("Analyzing {}...", file_name))
        }
        StateChange::SubmissionFinished { result, severity } => Some(
            ResultView {
                text: result.clone(),
                severity: Some(*severity),
            }
            .render(),
        ),
        StateChange::ResultCleared => None,
        StateChange::StateReset => Some("Reset".to_string()),
    }
}

/// Spawn a background thread that forwards rendered change events to `sink`.
///
/// The thread exits once every sender of the channel is dropped.
pub fn spawn_presenter<F>(
    mut rx: broadcast::Receiver<StateChange>,
    mut sink: F,
) -> std::thread::JoinHandle<()>
where
    F: FnMut(String) + Send + 'static,
{
    std::thread::spawn(move || {
        tracing::debug!("Presenter thread started");

        loop {
            match rx.blocking_recv() {
                Ok(change) => {
                    tracing::trace!("State change received: {:?}", change);
                    if let Some(line) = render_change(&change) {
                        sink(line);
                    }
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("State broadcast channel closed - stopping presenter");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Presenter lagged - {} events were skipped", skipped);
                }
            }
        }
    })
}
