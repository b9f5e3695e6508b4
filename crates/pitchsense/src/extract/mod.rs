//! Extraction capability seams.
//!
//! Both capabilities are external collaborators from the pipeline's
//! point of view: text extraction turns a stored file into plain text
//! (OCR or embedded text), structured extraction turns that text into an
//! opaque analysis payload (an LLM in production). Components receive
//! them as injected trait objects so tests can substitute doubles.

pub mod pdf;

pub use pdf::PdfTextExtractor;

use crate::error::ExtractError;

/// Text extraction capability: stored file reference + content type in,
/// plain text out.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, locator: &str, content_type: &str) -> Result<String, ExtractError>;
}

/// Structured extraction capability: plain text in, opaque structured
/// analysis payload out. No schema is assumed beyond JSON.
pub trait StructuredExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<serde_json::Value, ExtractError>;
}
