//! Text Extractor — converts stored files into the plain-text payload the
//! analysis pipeline consumes. A pure, stateless transform: extraction
//! failure is fatal for a request, since without text there is nothing to
//! analyze or fall back on.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::anyhow;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

/// Closed set of ingestable formats. Adding a format extends this enum and
/// the `extract_text` match; there is no runtime type sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Maps a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{format} extraction failed: {source}")]
    Failed {
        format: DocumentFormat,
        #[source]
        source: anyhow::Error,
    },
}

fn failed(format: DocumentFormat, source: anyhow::Error) -> ExtractError {
    ExtractError::Failed { format, source }
}

/// Resolves a filename's extension to a supported format, rejecting
/// everything outside the closed set before any bytes are touched.
pub fn format_for_filename(filename: &str) -> Result<DocumentFormat, ExtractError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    DocumentFormat::from_extension(ext)
        .ok_or_else(|| ExtractError::UnsupportedFormat(format!(".{}", ext.to_ascii_lowercase())))
}

/// Extracts plain text from `path` according to `format`. Output is
/// trimmed; page and paragraph boundaries become single newlines.
pub fn extract_text(path: &Path, format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Docx => extract_docx(path),
        DocumentFormat::Txt => extract_txt(path),
    }
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| failed(DocumentFormat::Pdf, anyhow!(e.to_string())))?;
    Ok(text.trim().to_string())
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|e| failed(DocumentFormat::Docx, e.into()))?;
    let docx = docx_rs::read_docx(&bytes)
        .map_err(|e| failed(DocumentFormat::Docx, anyhow!(e.to_string())))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n").trim().to_string())
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|e| failed(DocumentFormat::Txt, e.into()))?;
    // Explicit UTF-8 decode: a binary file declared as .txt must fail here,
    // not surface as mojibake in an analysis.
    let text = String::from_utf8(bytes)
        .map_err(|e| failed(DocumentFormat::Txt, anyhow!("not valid UTF-8: {e}")))?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("DOCX"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("txt"), Some(DocumentFormat::Txt));
        assert_eq!(DocumentFormat::from_extension("zip"), None);
        assert_eq!(DocumentFormat::from_extension(""), None);
    }

    #[test]
    fn test_format_for_filename() {
        assert_eq!(format_for_filename("report.pdf").unwrap(), DocumentFormat::Pdf);
        assert_eq!(format_for_filename("Notes.TXT").unwrap(), DocumentFormat::Txt);
        assert!(matches!(
            format_for_filename("archive.zip"),
            Err(ExtractError::UnsupportedFormat(ext)) if ext == ".zip"
        ));
        assert!(matches!(
            format_for_filename("no_extension"),
            Err(ExtractError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_txt_extraction_preserves_inner_newlines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Hello\nWorld").unwrap();
        let text = extract_text(file.path(), DocumentFormat::Txt).unwrap();
        assert_eq!(text, "Hello\nWorld");
    }

    #[test]
    fn test_txt_extraction_trims_surrounding_whitespace() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"  padded content \n\n").unwrap();
        let text = extract_text(file.path(), DocumentFormat::Txt).unwrap();
        assert_eq!(text, "padded content");
    }

    #[test]
    fn test_txt_extraction_rejects_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();
        let err = extract_text(file.path(), DocumentFormat::Txt).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Failed {
                format: DocumentFormat::Txt,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file_fails_with_format_tag() {
        let err = extract_text(Path::new("/nonexistent/file.docx"), DocumentFormat::Docx)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Failed {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_bytes_are_not_a_docx() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a zip archive").unwrap();
        let err = extract_text(file.path(), DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Failed { .. }));
    }
}
