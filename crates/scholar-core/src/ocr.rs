//! OCR engine trait

use async_trait::async_trait;

use crate::Result;

pub const MEDIA_TYPE_PNG: &str = "image/png";
pub const MEDIA_TYPE_JPEG: &str = "image/jpeg";
pub const MEDIA_TYPE_PDF: &str = "application/pdf";

/// Trait for optical character recognition backends
///
/// Used for images and for PDFs that carry no text layer.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text contained in `bytes` of the given media type
    async fn recognize(&self, bytes: &[u8], media_type: &str) -> Result<String>;
}
