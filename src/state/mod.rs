// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for presentation updates.

use crate::models::{AppState, PreviewHandle, SelectedImage, Severity, SubmissionState};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (primarily the presenter) about state
/// changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A new image has been selected
    ImageSelected {
        file_name: String,
        mime_type: String,
        size: usize,
    },

    /// The selection has been cleared
    ImageCleared,

    /// The preview handle has been replaced or released
    PreviewChanged {
        url: Option<String>,
    },

    /// The advisory drag highlight has been toggled
    DragActiveChanged {
        active: bool,
    },

    /// A request has been put on the wire
    SubmissionStarted {
        request_id: u64,
        file_name: String,
    },

    /// A request has completed, successfully or not
    SubmissionFinished {
        result: String,
        severity: Severity,
    },

    /// The previous result has been discarded
    ResultCleared,

    /// State has been reset
    StateReset,
}

/// Why a submission was not started.
///
/// Both are guarded no-ops, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitRejection {
    NoImage,
    AlreadyInFlight,
}

/// A submission accepted by [`StateManager::begin_submission`].
#[derive(Clone, Debug)]
pub struct PendingSubmission {
    pub request_id: u64,
    pub image: SelectedImage,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Enforces the single-flight rule when a submission starts
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::controller::IngestionController`]: Selection, preview and reset
/// - [`crate::controller::SubmissionController`]: Request lifecycle
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// Image bytes are shared, so this is cheap.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let can_submit = state_manager.read(|state| state.can_submit());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        self.update_with(update_fn).1
    }

    /// Like [`update()`](Self::update), but the update function can return a value
    ///
    /// The read-check-write happens under one write lock, which is what makes
    /// check-and-set transitions such as [`begin_submission()`](Self::begin_submission)
    /// race free.
    pub fn update_with<F, R>(&self, update_fn: F) -> (R, Vec<StateChange>)
    where
        F: FnOnce(&mut AppState) -> R,
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        let value = update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        (value, changes)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        // Selection changes
        if !same_image(old.selected_image.as_ref(), new.selected_image.as_ref()) {
            match &new.selected_image {
                Some(image) => changes.push(StateChange::ImageSelected {
                    file_name: image.file_name.clone(),
                    mime_type: image.mime_type.clone(),
                    size: image.size(),
                }),
                None => changes.push(StateChange::ImageCleared),
            }
        }

        // Preview changes
        if old.preview != new.preview {
            changes.push(StateChange::PreviewChanged {
                url: new.preview.as_ref().map(PreviewHandle::url),
            });
        }

        // Drag highlight
        if old.drag_active != new.drag_active {
            changes.push(StateChange::DragActiveChanged {
                active: new.drag_active,
            });
        }

        // Submission lifecycle
        if old.submission != new.submission {
            match &new.submission {
                SubmissionState::InFlight => changes.push(StateChange::SubmissionStarted {
                    request_id: new.outstanding_request.unwrap_or_default(),
                    file_name: new
                        .selected_image
                        .as_ref()
                        .map(|image| image.file_name.clone())
                        .unwrap_or_default(),
                }),
                SubmissionState::Succeeded(text) | SubmissionState::Failed(text) => {
                    changes.push(StateChange::SubmissionFinished {
                        result: text.clone(),
                        severity: Severity::classify(text),
                    })
                }
                SubmissionState::Idle => changes.push(StateChange::ResultCleared),
            }
        }

        changes
    }

    // Convenience methods for the documented transitions

    /// Replace the selected image
    ///
    /// `swap_preview` receives the previous preview handle (if any) and the new
    /// image; it must release the former and return a handle for the latter. Both
    /// happen inside the same write lock, so no reader ever sees two live handles
    /// or an image without its preview.
    ///
    /// The previous result is discarded and the drag highlight is cleared. A
    /// request already on the wire keeps the state at `InFlight`; it is not
    /// cancelled.
    pub fn replace_selection<F>(&self, image: SelectedImage, swap_preview: F) -> Vec<StateChange>
    where
        F: FnOnce(Option<PreviewHandle>, &SelectedImage) -> PreviewHandle,
    {
        self.update(|state| {
            let previous = state.preview.take();
            state.preview = Some(swap_preview(previous, &image));
            state.selected_image = Some(image);
            state.drag_active = false;

            if !state.submission.is_in_flight() {
                state.submission = SubmissionState::Idle;
            }
        })
    }

    /// Clear the selection, preview, result and drag highlight
    ///
    /// `release` receives the preview handle being dropped, if there was one.
    /// Always leaves the submission state at `Idle`. Any outstanding request is
    /// still tracked, so single-flight holds until it completes.
    pub fn reset_selection<F>(&self, release: F) -> Vec<StateChange>
    where
        F: FnOnce(PreviewHandle),
    {
        let mut changes = self.update(|state| {
            if let Some(preview) = state.clear_selection() {
                release(preview);
            }
        });

        // Emit a reset event
        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Set the advisory drag highlight
    pub fn set_drag_active(&self, active: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.drag_active = active;
        })
    }

    /// Start a submission if the single-flight preconditions hold
    ///
    /// Checks that an image is selected and no request is outstanding, then marks
    /// the state `InFlight` and hands out a request id and a shared copy of the
    /// image. Check and set happen under one write lock.
    pub fn begin_submission(&self) -> Result<PendingSubmission, SubmitRejection> {
        self.update_with(|state| {
            if state.outstanding_request.is_some() {
                return Err(SubmitRejection::AlreadyInFlight);
            }
            let image = state
                .selected_image
                .clone()
                .ok_or(SubmitRejection::NoImage)?;

            let request_id = state.next_request_id;
            state.next_request_id += 1;
            state.outstanding_request = Some(request_id);
            state.submission = SubmissionState::InFlight;

            Ok(PendingSubmission { request_id, image })
        })
        .0
    }

    /// Apply the outcome of a request
    ///
    /// The outcome is applied even if the selection changed or was reset while the
    /// request was on the wire. The outstanding marker is always cleared.
    pub fn finish_submission(&self, request_id: u64, outcome: SubmissionState) -> Vec<StateChange> {
        debug_assert!(outcome.is_finished());

        self.update(|state| {
            if state.outstanding_request != Some(request_id) {
                tracing::warn!(
                    "Completing request {} but outstanding request is {:?}",
                    request_id,
                    state.outstanding_request
                );
            }
            state.outstanding_request = None;
            state.submission = outcome;
        })
    }
}

/// Identity comparison: same file name and the very same shared blob.
fn same_image(old: Option<&SelectedImage>, new: Option<&SelectedImage>) -> bool {
    match (old, new) {
        (None, None) => true,
        (Some(a), Some(b)) => a.file_name == b.file_name && Arc::ptr_eq(&a.bytes, &b.bytes),
        _ => false,
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across tasks
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_PREDICTION_MESSAGE, TRANSPORT_FAILURE_MESSAGE};

    fn leaf(name: &str) -> SelectedImage {
        SelectedImage::new(name, Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF])
    }

    fn select(manager: &StateManager, image: SelectedImage, id: u64) -> Vec<StateChange> {
        manager.replace_selection(image, |_, _| PreviewHandle::new(id))
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::new();
        let state = manager.snapshot();

        assert!(!state.has_image());
        assert_eq!(state.submission, SubmissionState::Idle);
        assert!(!state.drag_active);
    }

    #[test]
    fn test_replace_selection_events() {
        let manager = StateManager::new();

        let changes = select(&manager, leaf("a.jpg"), 0);

        assert_eq!(changes.len(), 2);
        assert!(matches!(
            &changes[0],
            StateChange::ImageSelected { file_name, size: 3, .. } if file_name == "a.jpg"
        ));
        assert_eq!(
            changes[1],
            StateChange::PreviewChanged {
                url: Some("blob:plantai/0".to_string())
            }
        );
    }

    #[test]
    fn test_replace_selection_hands_over_previous_preview() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);

        let mut released = None;
        manager.replace_selection(leaf("b.jpg"), |previous, _| {
            released = previous;
            PreviewHandle::new(1)
        });

        assert_eq!(released, Some(PreviewHandle::new(0)));
        assert_eq!(manager.read(|s| s.preview.clone()), Some(PreviewHandle::new(1)));
    }

    #[test]
    fn test_selection_discards_finished_result() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        let pending = manager.begin_submission().unwrap();
        manager.finish_submission(
            pending.request_id,
            SubmissionState::Succeeded("Healthy".to_string()),
        );

        let changes = select(&manager, leaf("b.jpg"), 1);

        assert!(changes.contains(&StateChange::ResultCleared));
        let state = manager.snapshot();
        assert_eq!(state.submission, SubmissionState::Idle);
        assert_eq!(state.result_text(), "");
    }

    #[test]
    fn test_selection_keeps_in_flight() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        manager.begin_submission().unwrap();

        select(&manager, leaf("b.jpg"), 1);

        assert!(manager.read(|s| s.submission.is_in_flight()));
    }

    #[test]
    fn test_begin_submission_without_image() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        assert_eq!(
            manager.begin_submission().unwrap_err(),
            SubmitRejection::NoImage
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.read(|s| s.submission.clone()), SubmissionState::Idle);
    }

    #[test]
    fn test_begin_submission_is_single_flight() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);

        let first = manager.begin_submission().unwrap();
        assert_eq!(first.request_id, 0);
        assert_eq!(first.image.file_name, "a.jpg");

        for _ in 0..3 {
            assert_eq!(
                manager.begin_submission().unwrap_err(),
                SubmitRejection::AlreadyInFlight
            );
        }

        let state = manager.snapshot();
        assert!(state.submission.is_in_flight());
        assert_eq!(state.outstanding_request, Some(0));
    }

    #[test]
    fn test_begin_submission_emits_started() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        let mut rx = manager.subscribe();

        manager.begin_submission().unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            StateChange::SubmissionStarted {
                request_id: 0,
                file_name: "a.jpg".to_string()
            }
        );
    }

    #[test]
    fn test_finish_submission_success() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        let pending = manager.begin_submission().unwrap();

        let changes = manager.finish_submission(
            pending.request_id,
            SubmissionState::Succeeded(NO_PREDICTION_MESSAGE.to_string()),
        );

        assert_eq!(
            changes,
            vec![StateChange::SubmissionFinished {
                result: NO_PREDICTION_MESSAGE.to_string(),
                severity: Severity::Success
            }]
        );
        let state = manager.snapshot();
        assert!(state.outstanding_request.is_none());
        assert!(state.can_submit());
    }

    #[test]
    fn test_finish_submission_failure() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        let pending = manager.begin_submission().unwrap();

        let changes = manager.finish_submission(
            pending.request_id,
            SubmissionState::Failed(TRANSPORT_FAILURE_MESSAGE.to_string()),
        );

        assert!(matches!(
            changes[0],
            StateChange::SubmissionFinished {
                severity: Severity::Error,
                ..
            }
        ));
    }

    #[test]
    fn test_request_ids_increase() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);

        let first = manager.begin_submission().unwrap();
        manager.finish_submission(first.request_id, SubmissionState::Succeeded("x".into()));
        let second = manager.begin_submission().unwrap();

        assert_eq!(second.request_id, first.request_id + 1);
    }

    #[test]
    fn test_reset_selection() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 4);

        let mut released = Vec::new();
        let changes = manager.reset_selection(|preview| released.push(preview));

        assert_eq!(released, vec![PreviewHandle::new(4)]);
        assert!(changes.contains(&StateChange::ImageCleared));
        assert!(changes.contains(&StateChange::PreviewChanged { url: None }));
        assert_eq!(changes.last(), Some(&StateChange::StateReset));

        let state = manager.snapshot();
        assert!(!state.has_image());
        assert!(state.preview.is_none());
    }

    #[test]
    fn test_reset_selection_is_idempotent() {
        let manager = StateManager::new();

        let mut calls = 0;
        manager.reset_selection(|_| calls += 1);
        let changes = manager.reset_selection(|_| calls += 1);

        assert_eq!(calls, 0);
        assert_eq!(changes, vec![StateChange::StateReset]);
    }

    #[test]
    fn test_reset_while_in_flight_keeps_single_flight() {
        let manager = StateManager::new();
        select(&manager, leaf("a.jpg"), 0);
        let pending = manager.begin_submission().unwrap();

        manager.reset_selection(|_| {});
        assert_eq!(manager.read(|s| s.submission.clone()), SubmissionState::Idle);

        select(&manager, leaf("b.jpg"), 1);
        assert_eq!(
            manager.begin_submission().unwrap_err(),
            SubmitRejection::AlreadyInFlight
        );

        manager.finish_submission(pending.request_id, SubmissionState::Succeeded("late".into()));
        assert!(manager.begin_submission().is_ok());
    }

    #[test]
    fn test_drag_active_events() {
        let manager = StateManager::new();

        let changes = manager.set_drag_active(true);
        assert_eq!(changes, vec![StateChange::DragActiveChanged { active: true }]);

        // No change, no event
        assert!(manager.set_drag_active(true).is_empty());
    }

    #[test]
    fn test_subscribe_to_changes() {
        let manager = StateManager::new();
        let mut rx = manager.subscribe();

        manager.set_drag_active(true);

        let event = rx.try_recv();
        assert!(matches!(
            event.unwrap(),
            StateChange::DragActiveChanged { active: true }
        ));
    }

    #[test]
    fn test_multiple_subscribers() {
        let manager = StateManager::new();
        let mut rx1 = manager.subscribe();
        let mut rx2 = manager.subscribe();

        select(&manager, leaf("a.jpg"), 0);

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_clone_state_manager() {
        let manager1 = StateManager::new();
        let manager2 = manager1.clone();

        manager1.set_drag_active(true);

        assert!(manager2.read(|s| s.drag_active));
    }

    #[test]
    fn test_same_image_is_identity() {
        let a = leaf("a.jpg");
        let copy = leaf("a.jpg");

        assert!(same_image(Some(&a), Some(&a.clone())));
        // Equal content, different blob: a fresh selection
        assert!(!same_image(Some(&a), Some(&copy)));
        assert!(same_image(None, None));
        assert!(!same_image(Some(&a), None));
    }
}
