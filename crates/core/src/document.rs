//! Best-effort plain text from uploaded catalog documents.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use thiserror::Error;

pub const PDF_MAGIC: &[u8] = b"%PDF";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Uploaded file is empty")]
    Empty,
    #[error("File size exceeds {}MB limit", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },
    #[error("Invalid PDF file. The file does not appear to be a valid PDF document.")]
    NotPdf,
    #[error(
        "Failed to parse PDF: The PDF file appears to be corrupted or has invalid \
         cross-reference entries. Please try with a different PDF file."
    )]
    CorruptedXref(String),
    #[error(
        "Failed to parse PDF: The PDF file is password-protected or encrypted. \
         Please upload an unprotected PDF."
    )]
    Encrypted(String),
    #[error(
        "Failed to parse PDF: {0}. This might be due to a corrupted file, unsupported PDF \
         version, or password protection."
    )]
    Unreadable(String),
    #[error(
        "No text content could be extracted from the PDF. The file might be image-based or corrupted."
    )]
    NoText,
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
}

impl DocumentError {
    /// Rejections caused by the upload itself rather than by the parser.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Empty | Self::TooLarge { .. } | Self::NotPdf | Self::NoText)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Size and header checks performed before any parsing.
pub fn validate_upload(bytes: &[u8], max_bytes: u64) -> Result<(), DocumentError> {
    let size = bytes.len() as u64;
    if size == 0 {
        return Err(DocumentError::Empty);
    }
    if size > max_bytes {
        return Err(DocumentError::TooLarge { size, limit: max_bytes });
    }
    if !is_pdf(bytes) {
        return Err(DocumentError::NotPdf);
    }
    Ok(())
}

pub fn extract_pdf_text(bytes: &[u8], max_bytes: u64) -> Result<String, DocumentError> {
    validate_upload(bytes, max_bytes)?;

    // The parser panics on some malformed inputs instead of returning an error.
    let parsed = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| DocumentError::Unreadable("parser aborted on malformed input".to_string()))?;

    let text = parsed.map_err(|error| classify_parse_error(&error.to_string()))?;
    if text.trim().is_empty() {
        return Err(DocumentError::NoText);
    }
    Ok(text)
}

/// Reads a catalog from disk: PDFs go through the parser, anything else is
/// taken as UTF-8 text.
pub fn extract_text_from_path(path: &Path, max_bytes: u64) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path).map_err(|error| DocumentError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    })?;

    if is_pdf(&bytes) {
        return extract_pdf_text(&bytes, max_bytes);
    }
    if bytes.len() as u64 > max_bytes {
        return Err(DocumentError::TooLarge { size: bytes.len() as u64, limit: max_bytes });
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn classify_parse_error(message: &str) -> DocumentError {
    let lowered = message.to_lowercase();
    if lowered.contains("xref") || lowered.contains("cross-reference") {
        DocumentError::CorruptedXref(message.to_string())
    } else if lowered.contains("encrypt") || lowered.contains("password") {
        DocumentError::Encrypted(message.to_string())
    } else {
        DocumentError::Unreadable(message.to_string())
    }
}

/// First `limit` characters, with `...` appended when the text was cut.
pub fn preview(text: &str, limit: usize) -> String {
    let mut preview: String = text.chars().take(limit).collect();
    if text.chars().nth(limit).is_some() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{
        classify_parse_error, extract_pdf_text, extract_text_from_path, preview, validate_upload,
        DocumentError, DEFAULT_MAX_UPLOAD_BYTES,
    };

    #[test]
    fn upload_checks_run_before_parsing() {
        assert_eq!(validate_upload(b"", DEFAULT_MAX_UPLOAD_BYTES), Err(DocumentError::Empty));
        assert_eq!(
            validate_upload(b"%PDF-1.7 too big", 4),
            Err(DocumentError::TooLarge { size: 16, limit: 4 })
        );
        assert_eq!(validate_upload(b"GIF89a", DEFAULT_MAX_UPLOAD_BYTES), Err(DocumentError::NotPdf));
        assert!(validate_upload(b"%PDF-1.4", DEFAULT_MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn non_pdf_bytes_are_rejected_with_client_error() {
        let error = extract_pdf_text(b"plain text", DEFAULT_MAX_UPLOAD_BYTES)
            .expect_err("not a pdf");
        assert!(error.is_client_error());
    }

    #[test]
    fn truncated_pdf_is_rejected() {
        assert!(extract_pdf_text(b"%PDF-1.4\n%garbage", DEFAULT_MAX_UPLOAD_BYTES).is_err());
    }

    #[test]
    fn parse_errors_are_classified() {
        assert!(matches!(classify_parse_error("bad XRef entry"), DocumentError::CorruptedXref(_)));
        assert!(matches!(classify_parse_error("Encrypted PDF"), DocumentError::Encrypted(_)));
        assert!(matches!(classify_parse_error("eof"), DocumentError::Unreadable(_)));
    }

    #[test]
    fn text_files_are_read_verbatim() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "Mug | home | $8").expect("write");

        let text = extract_text_from_path(file.path(), DEFAULT_MAX_UPLOAD_BYTES).expect("read");
        assert_eq!(text, "Mug | home | $8");
    }

    #[test]
    fn preview_appends_ellipsis_only_when_cut() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn size_limit_message_is_in_megabytes() {
        let error = DocumentError::TooLarge { size: 11 * 1024 * 1024, limit: 10 * 1024 * 1024 };
        assert_eq!(error.to_string(), "File size exceeds 10MB limit");
    }
}
