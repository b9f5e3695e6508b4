//! Embedded-text PDF extractor backed by the local object store.
//!
//! Handles PDFs whose text layer is readable by lopdf. Scanned decks and
//! image uploads need a real OCR backend behind the same trait; this
//! implementation rejects them rather than guessing.

use std::sync::Arc;

use crate::error::ExtractError;
use crate::storage::FileStore;

use super::TextExtractor;

pub struct PdfTextExtractor {
    store: Arc<FileStore>,
}

impl PdfTextExtractor {
    pub fn new(store: Arc<FileStore>) -> Self {
        Self { store }
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, locator: &str, content_type: &str) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("extract.pdf", locator = %locator).entered();

        if !content_type.eq_ignore_ascii_case("application/pdf") {
            return Err(ExtractError::UnsupportedFormat(content_type.to_string()));
        }

        let pdf_bytes = self.store.read(locator).map_err(ExtractError::Read)?;

        let doc = lopdf::Document::load_mem(&pdf_bytes)
            .map_err(|e| ExtractError::PdfProcessing(format!("Failed to load PDF: {}", e)))?;

        let mut text = String::new();
        for (page_num, _) in doc.get_pages() {
            if let Ok(page_text) = doc.extract_text(&[page_num]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        if text.trim().is_empty() {
            return Err(ExtractError::PdfProcessing(
                "PDF has no extractable text layer".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ObjectStore;

    /// Builds a minimal valid PDF with one page of embedded text.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }),
        );

        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            }),
        );

        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        let content_stream = Stream::new(dictionary! {}, content.into_bytes());
        doc.objects
            .insert(content_id, Object::Stream(content_stream));

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }),
        );

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut pdf_bytes = Vec::new();
        doc.save_to(&mut pdf_bytes).unwrap();
        pdf_bytes
    }

    fn store_with(bytes: &[u8]) -> (tempfile::TempDir, Arc<FileStore>, String) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        let stored = store.put("u1", "deck.pdf", bytes, "application/pdf").unwrap();
        (dir, store, stored.locator)
    }

    #[test]
    fn test_extract_embedded_text() {
        let pdf = minimal_pdf("Q3 revenue 10k");
        let (_dir, store, locator) = store_with(&pdf);

        let extractor = PdfTextExtractor::new(store);
        let text = extractor.extract(&locator, "application/pdf").unwrap();
        assert!(text.contains("Q3 revenue 10k"));
    }

    #[test]
    fn test_rejects_non_pdf_content_type() {
        let (_dir, store, locator) = store_with(b"png bytes");

        let extractor = PdfTextExtractor::new(store);
        let result = extractor.extract(&locator, "image/png");
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupted_pdf() {
        let (_dir, store, locator) = store_with(b"not a valid pdf");

        let extractor = PdfTextExtractor::new(store);
        let result = extractor.extract(&locator, "application/pdf");
        assert!(matches!(result, Err(ExtractError::PdfProcessing(_))));
    }

    #[test]
    fn test_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = PdfTextExtractor::new(Arc::new(FileStore::new(dir.path())));

        let result = extractor.extract("uploads/u1/gone.pdf", "application/pdf");
        assert!(matches!(result, Err(ExtractError::Read(_))));
    }
}
