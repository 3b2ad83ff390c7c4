use bytes::Bytes;
use serde::Serialize;

use crate::errors::AppError;

/// The two supported candidate formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detects the format from a file name. Any extension other than
    /// `.pdf` / `.docx` / `.doc` is a hard per-document error; soft
    /// degradation (empty text) is reserved for files that at least claim
    /// a supported format.
    pub fn from_name(name: &str) -> Result<Self, AppError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" | "doc" => Ok(DocumentFormat::Docx),
            _ => Err(AppError::UnsupportedFormat(if ext.is_empty() {
                name.to_string()
            } else {
                format!(".{ext}")
            })),
        }
    }
}

/// One uploaded candidate as handed to the scoring pipeline: a unique name,
/// the raw payload, and the format declared by its extension.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub bytes: Bytes,
    pub format: DocumentFormat,
}

/// A candidate that survived extraction and cleaning. Discarded when the
/// scoring run completes; nothing is persisted beyond the CSV report.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub name: String,
    pub raw_size: usize,
    pub format: DocumentFormat,
    /// Cleaned, stopword-free, keyword-weighted token stream (space-joined).
    pub cleaned: String,
}
