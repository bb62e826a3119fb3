use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fmt;
use std::fs;
use std::sync::Arc;

/// MIME type used when neither the host nor the file name tells us anything.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// The image the user picked or dropped.
///
/// Bytes are shared (`Arc<[u8]>`) so the submission task can hold a read-only
/// copy without duplicating the blob.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedImage {
    /// Build an image from raw bytes.
    ///
    /// `mime_type` is whatever the host supplied; when absent it is guessed from
    /// the file name.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let file_name = file_name.into();
        let mime_type = match mime_type {
            Some(mime) if !mime.is_empty() => mime.to_string(),
            _ => mime_guess::from_path(&file_name)
                .first_raw()
                .unwrap_or(FALLBACK_MIME_TYPE)
                .to_string(),
        };

        Self {
            file_name,
            mime_type,
            bytes: bytes.into(),
        }
    }

    /// Read an image from disk.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read image file: {}", path))?;
        let file_name = path.file_name().unwrap_or("image").to_string();

        tracing::debug!("Read {} bytes from {}", bytes.len(), path);
        Ok(Self::new(file_name, None, bytes))
    }

    /// Size of the blob in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the MIME type looks like an image. Advisory only.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

// The blob itself is never useful in logs.
impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

/// A locally resolvable reference to the selected image's bytes.
///
/// Issued and revoked by [`crate::services::PreviewStore`]. Cloning the handle does
/// not keep the underlying resource alive; once revoked, resolving it yields nothing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: u64,
}

impl PreviewHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// URL form consumed by presentation.
    pub fn url(&self) -> String {
        format!("blob:plantai/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::io::Write;

    #[test]
    fn test_mime_from_host_wins() {
        let image = SelectedImage::new("leaf.bin", Some("image/png"), vec![0u8; 4]);
        assert_eq!(image.mime_type, "image/png");
        assert!(image.is_image());
    }

    #[test]
    fn test_mime_guessed_from_name() {
        let image = SelectedImage::new("leaf.jpg", None, vec![0u8; 4]);
        assert_eq!(image.mime_type, "image/jpeg");

        let empty_host_mime = SelectedImage::new("leaf.webp", Some(""), vec![0u8; 4]);
        assert_eq!(empty_host_mime.mime_type, "image/webp");
    }

    #[test]
    fn test_mime_fallback() {
        let image = SelectedImage::new("no_extension", None, vec![0u8; 4]);
        assert_eq!(image.mime_type, FALLBACK_MIME_TYPE);
        assert!(!image.is_image());
    }

    #[test]
    fn test_from_path() {
        let mut temp_file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        temp_file.write_all(b"\x89PNG fake").unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        let image = SelectedImage::from_path(&path).unwrap();

        assert_eq!(image.size(), 9);
        assert_eq!(image.mime_type, "image/png");
        assert!(image.file_name.ends_with(".png"));
    }

    #[test]
    fn test_from_missing_path() {
        let result = SelectedImage::from_path(Utf8Path::new("/definitely/not/here.png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_omits_bytes() {
        let image = SelectedImage::new("leaf.png", None, vec![42u8; 3]);
        let rendered = format!("{:?}", image);
        assert!(rendered.contains("size: 3"));
        assert!(!rendered.contains("42"));
    }

    #[test]
    fn test_preview_url() {
        let handle = PreviewHandle::new(12);
        assert_eq!(handle.url(), "blob:plantai/12");
    }
}
