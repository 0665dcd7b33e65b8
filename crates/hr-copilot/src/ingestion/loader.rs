//! Document loading from policy directories and uploads

use std::path::Path;
use walkdir::WalkDir;

use super::pdf::PdfExtractor;
use crate::error::{Error, Result};
use crate::types::{Document, FileType};

/// A file that could not be turned into a document
#[derive(Debug, Clone)]
pub struct IngestFailure {
    /// File name
    pub source: String,
    /// Why it failed
    pub reason: String,
}

impl IngestFailure {
    fn new(source: impl Into<String>, error: &Error) -> Self {
        Self {
            source: source.into(),
            reason: error.to_string(),
        }
    }
}

/// Outcome of loading a batch of files
#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<IngestFailure>,
}

/// Load one UTF-8 text file as a document named after the file
pub fn load_text_file(path: &Path) -> Result<Document> {
    let source_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::file_parse(&source_name, format!("invalid UTF-8: {}", e)))?;

    Ok(Document::new(source_name, text, FileType::Txt))
}

/// Load every `.txt` file directly inside `dir`, in file-name order.
///
/// A missing directory is not an error and yields an empty report.
pub fn load_directory(dir: &Path) -> LoadReport {
    let mut report = LoadReport::default();

    if !dir.is_dir() {
        tracing::warn!("Policies directory {} not found", dir.display());
        return report;
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let source = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string());
                tracing::warn!("Skipping unreadable entry {}: {}", source, e);
                report.failures.push(IngestFailure {
                    source,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let is_txt = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
        if !is_txt {
            continue;
        }

        match load_text_file(entry.path()) {
            Ok(doc) => {
                tracing::debug!("Loaded {} ({} chars)", doc.source_name, doc.char_len());
                report.documents.push(doc);
            }
            Err(e) => {
                let name = entry.file_name().to_string_lossy().to_string();
                tracing::warn!("Failed to load {}: {}", name, e);
                report.failures.push(IngestFailure::new(name, &e));
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {} ({} failures)",
        report.documents.len(),
        dir.display(),
        report.failures.len()
    );
    report
}

/// Turn an uploaded file into a document.
///
/// Text uploads must be UTF-8. PDF pages are concatenated with a
/// `--- Page N ---` marker before each page.
pub fn process_upload(
    filename: &str,
    data: &[u8],
    pdf: &dyn PdfExtractor,
) -> Result<Document> {
    match FileType::from_filename(filename) {
        FileType::Txt => {
            let text = std::str::from_utf8(data)
                .map_err(|e| Error::file_parse(filename, format!("invalid UTF-8: {}", e)))?;
            Ok(Document::new(filename, text, FileType::Txt))
        }
        FileType::Pdf => {
            let pages = pdf.extract_pages(filename, data)?;
            let text: String = pages
                .iter()
                .enumerate()
                .map(|(i, page)| format!("\n\n--- Page {} ---\n\n{}", i + 1, page))
                .collect();
            Ok(Document::new(filename, text, FileType::Pdf))
        }
        FileType::Unknown => Err(Error::UnsupportedFormat(filename.to_string())),
    }
}

/// Process several uploads, collecting per-file failures instead of aborting
pub fn process_uploads(
    uploads: &[(String, Vec<u8>)],
    pdf: &dyn PdfExtractor,
) -> LoadReport {
    let mut report = LoadReport::default();
    for (name, data) in uploads {
        match process_upload(name, data, pdf) {
            Ok(doc) => report.documents.push(doc),
            Err(e) => {
                tracing::warn!("Rejected upload {}: {}", name, e);
                report.failures.push(IngestFailure::new(name.as_str(), &e));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedPages(Vec<&'static str>);

    impl PdfExtractor for FixedPages {
        fn extract_pages(&self, _filename: &str, _data: &[u8]) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|p| p.to_string()).collect())
        }
    }

    #[test]
    fn test_load_directory_txt_only_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b_leave.txt"), "Leave rules").unwrap();
        std::fs::write(dir.path().join("a_benefits.txt"), "Benefits").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.txt"), "ignored").unwrap();

        let report = load_directory(dir.path());
        let names: Vec<&str> = report.documents.iter().map(|d| d.source_name.as_str()).collect();

        assert_eq!(names, vec!["a_benefits.txt", "b_leave.txt"]);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_load_directory_reports_bad_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.txt"), "fine").unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let report = load_directory(dir.path());

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "bad.txt");
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let report = load_directory(Path::new("/definitely/not/here"));
        assert!(report.documents.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_upload_pdf_page_markers() {
        let doc = process_upload("handbook.pdf", b"%PDF", &FixedPages(vec!["One", "Two"])).unwrap();
        assert_eq!(
            doc.raw_text,
            "\n\n--- Page 1 ---\n\nOne\n\n--- Page 2 ---\n\nTwo"
        );
        assert_eq!(doc.file_type, FileType::Pdf);
    }

    #[test]
    fn test_upload_rejects_unknown_format() {
        let result = process_upload("policy.docx", b"PK", &FixedPages(vec![]));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_uploads_partial_success() {
        let uploads = vec![
            ("leave.txt".to_string(), b"Casual leave is 12 days".to_vec()),
            ("slides.pptx".to_string(), vec![1, 2, 3]),
        ];
        let report = process_uploads(&uploads, &FixedPages(vec![]));

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, "slides.pptx");
    }
}
