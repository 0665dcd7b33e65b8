//! Document ingestion: loading, PDF extraction, chunking and indexing

mod chunker;
mod loader;
mod pdf;
mod pipeline;

pub use chunker::TextChunker;
pub use loader::{
    load_directory, load_text_file, process_upload, process_uploads, IngestFailure, LoadReport,
};
pub use pdf::{LopdfExtractor, PdfExtractor};
pub use pipeline::{IngestPipeline, IngestReport};
