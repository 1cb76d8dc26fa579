//! Uploaded images and their inline transport encoding.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Bytes;
use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;
use serde::Serialize;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("failed to read image: {0}")]
    Read(#[from] std::io::Error),
    #[error("image is empty")]
    Empty,
    #[error("content declared as {mime_type} is not a recognizable image")]
    Unrecognized { mime_type: String },
}

/// An uploaded image. Cloning is cheap; the content is shared.
#[derive(Debug, Clone)]
pub struct Image {
    id: ImageId,
    name: Option<String>,
    mime_type: String,
    bytes: Bytes,
}

impl Image {
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)),
            name,
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file fully into memory. The MIME type is sniffed from the
    /// content, falling back to the file extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, EncodingError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let format = image::guess_format(&bytes)
            .ok()
            .or_else(|| ImageFormat::from_path(path).ok());
        let mime_type = format.map_or("application/octet-stream", mime_for);
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(Self::new(bytes, mime_type, name))
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Display reference served by the HTTP layer.
    pub fn url(&self) -> String {
        format!("/images/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

/// Base64-encodes the image for inline transport. The declared MIME type is
/// passed through untouched.
///
/// Content is only checked against its magic bytes when the declared type is
/// one the `image` crate can sniff. Anything else (HEIC, SVG, ...) is left
/// for the analysis service to judge.
pub fn encode(image: &Image) -> Result<EncodedImage, EncodingError> {
    if image.bytes.is_empty() {
        return Err(EncodingError::Empty);
    }
    if is_sniffable(&image.mime_type) && image::guess_format(&image.bytes).is_err() {
        return Err(EncodingError::Unrecognized {
            mime_type: image.mime_type.clone(),
        });
    }

    Ok(EncodedImage {
        data: general_purpose::STANDARD.encode(&image.bytes),
        mime_type: image.mime_type.clone(),
    })
}

fn is_sniffable(mime_type: &str) -> bool {
    matches!(
        mime_type.to_ascii_lowercase().as_str(),
        "image/png" | "image/jpeg" | "image/jpg" | "image/gif" | "image/webp" | "image/bmp"
    )
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
pub(crate) const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
