//! PDF text extraction and scan detection using lopdf and pdf-extract.

use lopdf::{Document, Object};
use tracing::debug;

use super::{PdfKind, PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor.
///
/// `lopdf` handles document structure (pages, encryption, image
/// XObjects for scan detection), `pdf-extract` handles text. The raw
/// bytes are kept so scanned documents can be forwarded to the OCR
/// service as-is.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// The loaded PDF bytes (decrypted when the source was encrypted
    /// with an empty password). Used to hand the document to OCR.
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    /// Check whether the document contains any image XObjects.
    ///
    /// Scanned invoices carry one full-page image per page and little
    /// or no text; this is the cheap signal for routing to OCR.
    fn has_images(&self) -> bool {
        let doc = match self.document.as_ref() {
            Some(d) => d,
            None => return false,
        };

        for (_id, object) in doc.objects.iter() {
            if let Object::Stream(stream) = object {
                let is_image = stream
                    .dict
                    .get(b"Subtype")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|name| name == b"Image")
                    .unwrap_or(false);
                if is_image {
                    return true;
                }
            }
        }
        false
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn analyze(&self) -> PdfKind {
        let text = self.extract_text().unwrap_or_default();
        let has_text = text.trim().len() > 50;
        let has_images = self.has_images();

        let kind = match (has_text, has_images) {
            (true, false) => PdfKind::Text,
            (false, true) => PdfKind::Image,
            (true, true) => PdfKind::Hybrid,
            (false, false) => PdfKind::Empty,
        };

        debug!(
            "PDF analysis: has_text={}, has_images={} -> {:?}",
            has_text, has_images, kind
        );
        kind
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        Ok(text)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page));
        }

        // pdf-extract gives no page boundaries; partition the text
        // evenly by lines. Good enough for last-page trigger scans on
        // uniformly laid-out vendor invoices.
        let full_text = self.extract_text()?;
        let lines: Vec<&str> = full_text.lines().collect();

        let lines_per_page = (lines.len() / page_count as usize).max(1);
        let start = ((page - 1) as usize) * lines_per_page;
        let end = if page == page_count {
            lines.len()
        } else {
            (page as usize) * lines_per_page
        };

        Ok(lines[start.min(lines.len())..end.min(lines.len())].join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.raw_data().is_empty());
    }

    #[test]
    fn test_extract_text_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(
            extractor.extract_text(),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_last_page_without_document() {
        let extractor = PdfExtractor::new();
        assert!(matches!(extractor.last_page_text(), Err(PdfError::NoPages)));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(
            extractor.load(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
