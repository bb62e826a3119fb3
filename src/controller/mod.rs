// Controllers - the two halves of the upload workflow
//
// IngestionController owns "what image is selected"; SubmissionController owns
// "is a request outstanding and what did it return". Both mutate AppState only
// through the shared StateManager.

pub mod events;
pub mod ingestion;
pub mod submission;

pub use events::{DragEvent, DragEventKind};
pub use ingestion::{IMAGE_EXTENSIONS, IngestionController, show_image_picker, utf8_paths};
pub use submission::SubmissionController;
