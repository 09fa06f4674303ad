//! Image form field with local preview
//!
//! Selecting a file shows it at once as a `data:` URL. Uploading swaps the
//! preview for the stored URL; a failed upload keeps the local preview and
//! reports the error. There is no automatic retry.

use crate::dialog::ErrorDialog;
use crate::error::{AdminError, AdminResult};
use async_trait::async_trait;
use studio_client::ApiClient;
use studio_core::{
    Error,
    types::UploadedImage,
    utils::{image_data_url, resolve_asset_url},
};
use tracing::{debug, warn};

/// Destination for image files
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Store `bytes` and return where they landed
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> studio_core::Result<UploadedImage>;
}

#[async_trait]
impl ImageUploader for ApiClient {
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> studio_core::Result<UploadedImage> {
        Self::upload_image(self, bytes, file_name).await
    }
}

#[derive(Debug, Clone)]
struct PendingFile {
    bytes: Vec<u8>,
    file_name: String,
}

/// State of one image input
#[derive(Debug, Clone)]
pub struct ImageField {
    max_bytes: u64,
    value: Option<String>,
    preview: Option<String>,
    pending: Option<PendingFile>,
    error: ErrorDialog,
}

impl ImageField {
    /// Empty field accepting files up to `max_bytes`
    #[must_use]
    pub const fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            value: None,
            preview: None,
            pending: None,
            error: ErrorDialog::new(),
        }
    }

    /// Field showing an already stored image
    #[must_use]
    pub fn existing(max_bytes: u64, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            preview: Some(url.clone()),
            value: Some(url),
            ..Self::new(max_bytes)
        }
    }

    /// Pick a file; the preview is available immediately
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileSizeExceeded`] when the file is over the cap;
    /// the previous selection is kept.
    pub fn select(&mut self, bytes: Vec<u8>, file_name: &str) -> studio_core::Result<&str> {
        let size = bytes.len() as u64;
        if size > self.max_bytes {
            let error = Error::FileSizeExceeded {
                size,
                max_size: self.max_bytes,
            };
            self.error.show(&error);
            return Err(error);
        }

        self.error.dismiss();
        let data_url = image_data_url(&bytes, file_name);
        self.pending = Some(PendingFile {
            bytes,
            file_name: file_name.to_string(),
        });
        debug!(file = file_name, size, "image selected");
        Ok(self.preview.insert(data_url))
    }

    /// Upload the selected file
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NothingToUpload`] when no file is selected, or
    /// the upload failure. On failure the local preview stays and the file
    /// must be selected again to retry.
    pub async fn upload<U>(&mut self, uploader: &U) -> AdminResult<UploadedImage>
    where
        U: ImageUploader + ?Sized,
    {
        let PendingFile { bytes, file_name } = self.pending.take().ok_or(AdminError::NothingToUpload)?;
        self.error.dismiss();

        match uploader.upload_image(bytes, &file_name).await {
            Ok(uploaded) => {
                self.value = Some(uploaded.url.clone());
                self.preview = Some(uploaded.url.clone());
                Ok(uploaded)
            }
            Err(e) => {
                warn!(file = %file_name, error = %e, "image upload failed");
                self.error.show(format_args!("Image upload failed: {e}"));
                Err(e.into())
            }
        }
    }

    /// What to show: the local file or the stored URL
    #[must_use]
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// The stored URL to save with the record
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Last selection or upload error
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.message()
    }

    /// Modal reporting the last error
    #[must_use]
    pub const fn error_dialog(&self) -> &ErrorDialog {
        &self.error
    }

    /// Close the error modal, keeping the selection
    pub fn dismiss_error(&mut self) {
        self.error.dismiss();
    }

    /// Size cap in bytes
    #[must_use]
    pub const fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Whether a selected file still awaits upload
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Preview resolved against the asset server
    #[must_use]
    pub fn display_url(&self, asset_base_url: &str) -> Option<String> {
        self.preview
            .as_deref()
            .map(|reference| resolve_asset_url(asset_base_url, reference))
    }

    /// Forget selection, value and error
    pub fn clear(&mut self) {
        *self = Self::new(self.max_bytes);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(studio_core::Result<UploadedImage>);

    #[async_trait]
    impl ImageUploader for Fixed {
        async fn upload_image(&self, _bytes: Vec<u8>, _file_name: &str) -> studio_core::Result<UploadedImage> {
            match &self.0 {
                Ok(image) => Ok(image.clone()),
                Err(e) => Err(Error::Other(e.to_string())),
            }
        }
    }

    #[test]
    fn test_select_previews_data_url() {
        let mut field = ImageField::new(1024);
        let preview = field.select(b"png!".to_vec(), "logo.png").unwrap();

        assert_eq!(preview, "data:image/png;base64,cG5nIQ==");
        assert!(field.has_pending());
        assert!(field.value().is_none());
    }

    #[test]
    fn test_oversized_file_keeps_previous_selection() {
        let mut field = ImageField::existing(4, "/uploads/old.jpg");

        let error = field.select(vec![0; 5], "big.jpg").unwrap_err();

        assert!(matches!(error, Error::FileSizeExceeded { size: 5, max_size: 4 }));
        assert_eq!(field.preview(), Some("/uploads/old.jpg"));
        assert!(field.error().is_some());
        assert!(!field.has_pending());
    }

    #[test]
    fn test_error_modal_closes_without_losing_selection() {
        let mut field = ImageField::new(4);
        field.select(vec![1], "a.png").unwrap();
        field.select(vec![0; 5], "big.png").unwrap_err();
        assert!(field.error_dialog().is_open());

        field.dismiss_error();

        assert!(!field.error_dialog().is_open());
        assert!(field.error().is_none());
        assert!(field.has_pending());

        field.select(vec![0; 5], "big.png").unwrap_err();
        field.select(vec![2], "b.png").unwrap();
        assert!(field.error().is_none());
    }

    #[tokio::test]
    async fn test_upload_swaps_preview_for_stored_url() {
        let mut field = ImageField::new(1024);
        field.select(vec![1, 2, 3], "a.jpg").unwrap();
        let uploader = Fixed(Ok(UploadedImage {
            url: "/uploads/a.jpg".to_string(),
            id: Some("a".to_string()),
        }));

        field.upload(&uploader).await.unwrap();

        assert_eq!(field.value(), Some("/uploads/a.jpg"));
        assert_eq!(
            field.display_url("http://localhost:5000/").as_deref(),
            Some("http://localhost:5000/uploads/a.jpg")
        );
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_local_preview() {
        let mut field = ImageField::new(1024);
        field.select(vec![1, 2, 3], "a.gif").unwrap();
        let local = field.preview().unwrap().to_string();

        let result = field.upload(&Fixed(Err(Error::Network("offline".to_string())))).await;

        assert!(result.is_err());
        assert_eq!(field.preview(), Some(local.as_str()));
        assert!(field.error_dialog().is_open());
        assert!(field.error().unwrap().starts_with("Image upload failed"));
        assert!(field.error().unwrap().contains("offline"));
        assert!(matches!(field.upload(&Fixed(Err(Error::Other(String::new())))).await, Err(AdminError::NothingToUpload)));
    }
}
