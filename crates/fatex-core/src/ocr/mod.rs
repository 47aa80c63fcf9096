//! External OCR service integration.
//!
//! No OCR engine runs locally: scanned PDFs are posted as-is to a
//! configured HTTP service and the recognized text comes back.

mod remote;

pub use remote::RemoteOcrClient;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Trait for text recognition backends.
#[allow(async_fn_in_trait)]
pub trait TextRecognizer {
    /// Recognize text in a PDF document given its raw bytes.
    async fn recognize(&self, pdf_data: &[u8]) -> Result<String>;
}
