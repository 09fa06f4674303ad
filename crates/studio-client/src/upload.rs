//! Image upload endpoint

use crate::api_client::ApiClient;
use reqwest::{
    Method,
    multipart::{Form, Part},
};
use studio_core::{Error, Result, types::UploadedImage};
use tracing::info;

/// Path of the shared upload endpoint
pub const UPLOAD_PATH: &str = "content/upload-image";

/// Build a multipart part for an image file, typed from its extension
///
/// # Errors
///
/// Returns an error if the guessed MIME type is rejected by the HTTP stack.
pub fn image_part(bytes: Vec<u8>, file_name: &str) -> Result<Part> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime.essence_str())
        .map_err(|e| Error::Other(format!("Invalid content type for {file_name}: {e}")))
}

impl ApiClient {
    /// Post an image to the upload endpoint and return where it landed
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or the response cannot be parsed.
    pub async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadedImage> {
        let size = bytes.len();
        let form = Form::new().part("image", image_part(bytes, file_name)?);
        let uploaded: UploadedImage = self.send_multipart(Method::POST, UPLOAD_PATH, form).await?;

        info!(file = file_name, size, url = %uploaded.url, "uploaded image");
        Ok(uploaded)
    }
}
