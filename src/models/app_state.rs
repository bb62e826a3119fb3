use super::image::{PreviewHandle, SelectedImage};

/// Result text used when the server answered but did not include a diagnosis.
pub const NO_PREDICTION_MESSAGE: &str = "No prediction returned.";

/// Result text used for every transport-level failure.
///
/// The underlying failure is logged, never shown.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Error connecting to server.";

/// Presentation severity of a result string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    /// Classify a result string.
    ///
    /// Any text containing "error" in any letter case is an error; everything
    /// else is a success. This is a text heuristic, not a status from the server:
    /// a well-formed diagnosis such as `"Error: image unreadable"` is classified as
    /// an error too. Kept for compatibility with the existing inference service,
    /// which has no structured status field.
    pub fn classify(text: &str) -> Self {
        if text.to_lowercase().contains("error") {
            Severity::Error
        } else {
            Severity::Success
        }
    }

    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

/// Lifecycle of a single submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing submitted for the current selection.
    #[default]
    Idle,

    /// Exactly one request is on the wire.
    InFlight,

    /// The server answered; holds the diagnosis or the placeholder text.
    Succeeded(String),

    /// The request failed at transport level; holds the generic failure text.
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::InFlight)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SubmissionState::Succeeded(_) | SubmissionState::Failed(_))
    }

    /// The result text, empty while idle or in flight.
    pub fn result_text(&self) -> &str {
        match self {
            SubmissionState::Succeeded(text) | SubmissionState::Failed(text) => text,
            SubmissionState::Idle | SubmissionState::InFlight => "",
        }
    }

    /// Severity derived from the result text, `None` when there is no result.
    pub fn severity(&self) -> Option<Severity> {
        let text = self.result_text();
        if text.is_empty() {
            None
        } else {
            Some(Severity::classify(text))
        }
    }
}

/// Single source of truth for the upload/inference workflow.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`].
/// Never mutate it directly - go through the controllers, which call
/// [`StateManager`](crate::state::StateManager) methods so that change events are
/// emitted and the preview handle is released on every replacement.
///
/// # Related Types
///
/// - [`crate::state::StateManager`]: Thread-safe wrapper with event emission
/// - [`crate::controller::IngestionController`]: Writes the selection and preview
/// - [`crate::controller::SubmissionController`]: Drives [`SubmissionState`]
#[derive(Clone, Debug, Default)]
pub struct AppState {
    // Selection
    pub selected_image: Option<SelectedImage>,
    pub preview: Option<PreviewHandle>,

    // Submission
    pub submission: SubmissionState,

    /// Id of the request currently on the wire.
    ///
    /// Tracked separately from `submission` because `reset()` forces the visible
    /// state back to `Idle` while a request may still be outstanding.
    pub outstanding_request: Option<u64>,

    /// Id that the next accepted submission will use.
    pub next_request_id: u64,

    // Presentation hint
    pub drag_active: bool,
}

impl AppState {
    pub fn has_image(&self) -> bool {
        self.selected_image.is_some()
    }

    pub fn result_text(&self) -> &str {
        self.submission.result_text()
    }

    /// Whether `submit()` would be accepted right now.
    pub fn can_submit(&self) -> bool {
        self.selected_image.is_some() && self.outstanding_request.is_none()
    }

    /// Clear the selection, any result and the drag highlight.
    ///
    /// Leaves `outstanding_request` untouched: a request on the wire still
    /// completes and still blocks new submissions until it does.
    ///
    /// The caller is responsible for releasing the preview handle it takes out.
    pub fn clear_selection(&mut self) -> Option<PreviewHandle> {
        self.selected_image = None;
        self.submission = SubmissionState::Idle;
        self.drag_active = false;
        self.preview.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.has_image());
        assert!(state.preview.is_none());
        assert_eq!(state.submission, SubmissionState::Idle);
        assert_eq!(state.result_text(), "");
        assert!(!state.can_submit());
    }

    #[test]
    fn test_classify_is_case_insensitive_substring() {
        assert_eq!(Severity::classify("Late Blight detected"), Severity::Success);
        assert_eq!(Severity::classify(NO_PREDICTION_MESSAGE), Severity::Success);
        assert_eq!(Severity::classify(TRANSPORT_FAILURE_MESSAGE), Severity::Error);
        assert_eq!(Severity::classify("Error: image unreadable"), Severity::Error);
        assert_eq!(Severity::classify("an ERROR occurred"), Severity::Error);
        assert_eq!(Severity::classify("terrors of the leaf"), Severity::Error);
        assert_eq!(Severity::classify("err"), Severity::Success);
    }

    #[test]
    fn test_result_text_and_severity() {
        assert_eq!(SubmissionState::Idle.severity(), None);
        assert_eq!(SubmissionState::InFlight.severity(), None);

        let ok = SubmissionState::Succeeded("Healthy".to_string());
        assert_eq!(ok.result_text(), "Healthy");
        assert_eq!(ok.severity(), Some(Severity::Success));

        let failed = SubmissionState::Failed(TRANSPORT_FAILURE_MESSAGE.to_string());
        assert_eq!(failed.severity(), Some(Severity::Error));
        assert!(failed.is_finished());
        assert!(!failed.is_in_flight());
    }

    #[test]
    fn test_can_submit_requires_image_and_no_outstanding_request() {
        let mut state = AppState::default();
        state.selected_image = Some(SelectedImage::new("leaf.png", None, vec![1, 2, 3]));
        assert!(state.can_submit());

        state.outstanding_request = Some(0);
        assert!(!state.can_submit());
    }

    #[test]
    fn test_clear_selection_keeps_outstanding_request() {
        let mut state = AppState::default();
        state.selected_image = Some(SelectedImage::new("leaf.png", None, vec![1]));
        state.preview = Some(PreviewHandle::new(7));
        state.submission = SubmissionState::InFlight;
        state.outstanding_request = Some(3);
        state.drag_active = true;

        let released = state.clear_selection();

        assert_eq!(released.map(|p| p.id()), Some(7));
        assert!(state.selected_image.is_none());
        assert!(state.preview.is_none());
        assert_eq!(state.submission, SubmissionState::Idle);
        assert_eq!(state.outstanding_request, Some(3));
        assert!(!state.drag_active);
    }
}
