//! Preview handle allocation.
//!
//! A [`PreviewStore`] plays the role a browser's object-URL table plays for a web
//! client: it maps short handles to image bytes so presentation can render the
//! selection before it is submitted. Every handle must be revoked when the image it
//! was derived from is replaced or cleared; the store counts live handles so leaks
//! are observable.

use crate::models::{PreviewHandle, SelectedImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct PreviewStore {
    next_id: AtomicU64,
    live: Mutex<HashMap<u64, Arc<[u8]>>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for the image's bytes.
    pub fn create(&self, image: &SelectedImage) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live
            .lock()
            .unwrap()
            .insert(id, Arc::clone(&image.bytes));

        tracing::debug!("Created preview {} for {}", id, image.file_name);
        PreviewHandle::new(id)
    }

    /// Release the resource behind a handle.
    ///
    /// Returns `false` if the handle was already revoked.
    pub fn revoke(&self, handle: &PreviewHandle) -> bool {
        let removed = self.live.lock().unwrap().remove(&handle.id()).is_some();
        if removed {
            tracing::debug!("Revoked preview {}", handle.id());
        } else {
            tracing::warn!("Preview {} was already revoked", handle.id());
        }
        removed
    }

    /// Resolve a handle to the bytes it refers to, if it is still live.
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.live.lock().unwrap().get(&handle.id()).cloned()
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live.lock().unwrap().contains_key(&handle.id())
    }

    /// Number of handles not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }
}
