//! cardmail-extract: statement text extraction (PDF and model) and the
//! per-email processing pipeline.

pub mod extractor;
pub mod pdf_text;
pub mod pipeline;

pub use extractor::{parse_model_response, GeminiExtractor, StatementExtractor};
pub use pdf_text::{read_document_text, DocumentReader, PdfDocumentReader};
pub use pipeline::StatementPipeline;
