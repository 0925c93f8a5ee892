//! Document text processing: per-page extraction and chunking.

pub mod chunker;
pub mod pdf;

pub use chunker::TextChunker;
pub use pdf::{extract_pdf_pages, PdfPage};
