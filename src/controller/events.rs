use crate::models::SelectedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEventKind {
    Enter,
    Over,
    Leave,
    Drop,
}

/// A drag-and-drop event as delivered by the host surface.
///
/// Hosts treat an unhandled drop as "open the dropped file", so handlers must
/// call [`prevent_default`](Self::prevent_default); the host checks
/// [`default_prevented`](Self::default_prevented) after dispatch.
#[derive(Debug)]
pub struct DragEvent {
    kind: DragEventKind,
    files: Vec<SelectedImage>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DragEvent {
    fn new(kind: DragEventKind, files: Vec<SelectedImage>) -> Self {
        Self {
            kind,
            files,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn enter() -> Self {
        Self::new(DragEventKind::Enter, Vec::new())
    }

    pub fn over() -> Self {
        Self::new(DragEventKind::Over, Vec::new())
    }

    pub fn leave() -> Self {
        Self::new(DragEventKind::Leave, Vec::new())
    }

    pub fn drop(files: Vec<SelectedImage>) -> Self {
        Self::new(DragEventKind::Drop, files)
    }

    pub fn kind(&self) -> DragEventKind {
        self.kind
    }

    pub fn files(&self) -> &[SelectedImage] {
        &self.files
    }

    /// Take the first dropped file; the rest are ignored.
    pub fn take_first_file(&mut self) -> Option<SelectedImage> {
        if self.files.is_empty() {
            None
        } else {
            Some(self.files.swap_remove(0))
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_first_file() {
        let mut event = DragEvent::drop(vec![
            SelectedImage::new("first.png", None, vec![1]),
            SelectedImage::new("second.png", None, vec![2]),
            SelectedImage::new("third.png", None, vec![3]),
        ]);

        let first = event.take_first_file().unwrap();
        assert_eq!(first.file_name, "first.png");
    }

    #[test]
    fn test_take_first_file_empty() {
        let mut event = DragEvent::drop(Vec::new());
        assert!(event.take_first_file().is_none());
    }

    #[test]
    fn test_flags_start_clear() {
        let mut event = DragEvent::over();
        assert_eq!(event.kind(), DragEventKind::Over);
        assert!(!event.default_prevented());
        assert!(!event.propagation_stopped());

        event.prevent_default();
        event.stop_propagation();
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }
}
