// Ingestion Controller - Turns picker and drop events into one selected image
//
// Both entry points converge on `select_from_picker`, which replaces the selection
// and swaps the preview handle inside a single state update.

use super::events::{DragEvent, DragEventKind};
use crate::metrics::Metrics;
use crate::models::SelectedImage;
use crate::services::PreviewStore;
use crate::state::{StateChange, StateManager};
use anyhow::Result;
use camino::Utf8PathBuf;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions offered by the picker's type filter.
///
/// The filter is advisory: nothing downstream re-validates the file type.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

/// Owns the selected image and its preview handle.
///
/// Every path that replaces or clears the selection releases the previous preview
/// handle before a new one exists, so at most one handle is live at any time.
pub struct IngestionController {
    state: Arc<StateManager>,
    previews: Arc<PreviewStore>,
    metrics: Arc<Metrics>,
}

impl IngestionController {
    pub fn new(
        state: Arc<StateManager>,
        previews: Arc<PreviewStore>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            previews,
            metrics,
        }
    }

    /// Handle a file-picker result.
    ///
    /// `None` (picker cancelled, nothing chosen) is a no-op. Otherwise the image
    /// replaces the current selection, the previous preview is released, a new one
    /// is allocated and the previous result is discarded.
    ///
    /// A request already in flight is not cancelled; its response will still be
    /// applied when it arrives.
    pub fn select_from_picker(&self, file: Option<SelectedImage>) -> Vec<StateChange> {
        let Some(image) = file else {
            tracing::debug!("Picker returned no file - ignoring");
            return Vec::new();
        };

        tracing::info!(
            "Image selected: {} ({} bytes, {})",
            image.file_name,
            image.size(),
            image.mime_type
        );
        if !image.is_image() {
            tracing::debug!(
                "{} does not look like an image ({}) - selecting it anyway",
                image.file_name,
                image.mime_type
            );
        }

        if self.state.read(|s| s.submission.is_in_flight()) {
            tracing::warn!(
                "New image selected while a request is in flight - its response will still be applied"
            );
        }

        let previews = &self.previews;
        let metrics = &self.metrics;
        self.state.replace_selection(image, |previous, image| {
            if let Some(previous) = previous {
                previews.revoke(&previous);
                metrics.record_preview_released();
            }
            let handle = previews.create(image);
            metrics.record_preview_created();
            handle
        })
    }

    /// Handle a drop: only the first file is considered.
    ///
    /// Suppresses the host default (navigating to the dropped file) and clears the
    /// drag highlight, whether or not the drop carried a file.
    pub fn select_from_drop(&self, event: &mut DragEvent) -> Vec<StateChange> {
        event.prevent_default();
        event.stop_propagation();

        let mut changes = self.state.set_drag_active(false);

        let dropped = event.files().len();
        if dropped > 1 {
            tracing::debug!("{} files dropped - using the first one", dropped);
        }

        match event.take_first_file() {
            Some(image) => changes.extend(self.select_from_picker(Some(image))),
            None => tracing::debug!("Drop carried no files - ignoring"),
        }

        changes
    }

    /// Dispatch any drag event.
    ///
    /// Enter and over raise the advisory highlight, leave and drop clear it.
    pub fn handle_drag(&self, event: &mut DragEvent) -> Vec<StateChange> {
        match event.kind() {
            DragEventKind::Enter | DragEventKind::Over => {
                event.prevent_default();
                event.stop_propagation();
                self.state.set_drag_active(true)
            }
            DragEventKind::Leave => {
                event.prevent_default();
                event.stop_propagation();
                self.state.set_drag_active(false)
            }
            DragEventKind::Drop => self.select_from_drop(event),
        }
    }

    /// Clear the selection, preview and result. Idempotent.
    pub fn reset(&self) -> Vec<StateChange> {
        tracing::info!("Resetting selection");

        let previews = &self.previews;
        let metrics = &self.metrics;
        self.state.reset_selection(|preview| {
            previews.revoke(&preview);
            metrics.record_preview_released();
        })
    }

    /// Show the native picker and select whatever the user chooses.
    ///
    /// Cancelling the dialog is a no-op. Fails only if the chosen file can't be read.
    pub fn pick_from_dialog(&self) -> Result<Vec<StateChange>> {
        let file = match show_image_picker() {
            Some(path) => Some(SelectedImage::from_path(&path)?),
            None => None,
        };
        Ok(self.select_from_picker(file))
    }

    /// Handle paths dropped onto the executable.
    ///
    /// Like any drop, only the first entry is considered, and only that file is
    /// read. An empty list is a no-op.
    pub fn select_from_paths(&self, paths: &[Utf8PathBuf]) -> Result<Vec<StateChange>> {
        let Some((first, rest)) = paths.split_first() else {
            tracing::debug!("No paths given - ignoring");
            return Ok(Vec::new());
        };
        if !rest.is_empty() {
            tracing::debug!("{} paths given - using {}", paths.len(), first);
        }

        let image = SelectedImage::from_path(first)?;
        Ok(self.handle_drag(&mut DragEvent::drop(vec![image])))
    }

    /// Resolve the current preview to its bytes, if there is one.
    pub fn preview_bytes(&self) -> Option<Arc<[u8]>> {
        self.state
            .read(|s| s.preview.clone())
            .and_then(|handle| self.previews.resolve(&handle))
    }
}

/// Convert raw command-line arguments to UTF-8 paths, skipping any that aren't
/// valid UTF-8.
pub fn utf8_paths<I>(args: I) -> Vec<Utf8PathBuf>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .filter_map(|arg| match Utf8PathBuf::from_path_buf(PathBuf::from(arg)) {
            Ok(path) => Some(path),
            Err(path) => {
                tracing::warn!("Skipping non UTF-8 path: {}", path.display());
                None
            }
        })
        .collect()
}

/// Show a native file picker filtered to image types
///
/// Uses the `rfd` crate to display a native file dialog.
///
/// # Returns
/// The selected file path, or None if cancelled
pub fn show_image_picker() -> Option<Utf8PathBuf> {
    use rfd::FileDialog;

    FileDialog::new()
        .set_title("Select a plant photo")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .and_then(|path| {
            Utf8PathBuf::try_from(path)
                .map_err(|e| {
                    tracing::error!("Failed to convert path to UTF-8: {}", e);
                    e
                })
                .ok()
        })
}
