//! Best-effort text extraction from candidate files.
//!
//! Two formats are supported: PDF (text layer via `pdf-extract`, page count
//! via `lopdf`) and DOCX (`word/document.xml` pulled out of the zip container
//! and read with `quick-xml`). Every resource violation — oversize payload,
//! too many pages, malformed file, exhausted wall-clock budget — degrades to
//! empty text so one bad resume never fails a batch. Unsupported extensions
//! are rejected earlier, at format detection.

use std::io::{Cursor, Read};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Limits;
use crate::models::document::{CandidateFile, DocumentFormat};

/// Extraction seam. The production implementation is [`BoundedExtractor`];
/// tests swap in stubs to drive the pipeline without real documents.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns extracted plain text, or the empty string when the file is
    /// unusable under the configured resource bounds.
    async fn extract(&self, file: &CandidateFile) -> String;
}

/// Extractor enforcing the configured size, page, and wall-clock caps.
///
/// The CPU-bound work runs on the blocking pool; a document that outlives
/// its budget is abandoned (cooperatively — the worker also polls elapsed
/// time) and contributes empty text.
pub struct BoundedExtractor {
    limits: Limits,
}

impl BoundedExtractor {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl Extractor for BoundedExtractor {
    async fn extract(&self, file: &CandidateFile) -> String {
        let bytes = file.bytes.clone();
        let format = file.format;
        let name = file.name.clone();
        let limits = self.limits;

        let work =
            tokio::task::spawn_blocking(move || extract_text(&bytes, format, &name, &limits));
        match tokio::time::timeout(self.limits.extract_budget, work).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(file = %file.name, error = %e, "extraction worker failed");
                String::new()
            }
            Err(_) => {
                warn!(
                    file = %file.name,
                    budget_secs = self.limits.extract_budget.as_secs(),
                    "extraction abandoned after budget"
                );
                String::new()
            }
        }
    }
}

/// Synchronous extraction entry point. Returns empty text on every soft
/// failure; the reasons land in the log, not in the return type.
pub fn extract_text(bytes: &[u8], format: DocumentFormat, name: &str, limits: &Limits) -> String {
    let started = Instant::now();

    if bytes.len() > limits.max_file_bytes {
        warn!(file = %name, size = bytes.len(), "file exceeds size cap, skipping");
        return String::new();
    }

    let text = match format {
        DocumentFormat::Pdf => extract_pdf(bytes, name, limits, started),
        DocumentFormat::Docx => extract_docx(bytes, name, limits, started),
    };

    if text.trim().is_empty() {
        warn!(file = %name, "no text extracted");
        return String::new();
    }
    debug!(
        file = %name,
        chars = text.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction succeeded"
    );
    normalize_ligatures(&text)
}

fn extract_pdf(bytes: &[u8], name: &str, limits: &Limits, started: Instant) -> String {
    // Page structure first: the page cap is enforced before any text work.
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(file = %name, error = %e, "failed to open PDF");
            return String::new();
        }
    };
    let pages = doc.get_pages().len();
    if pages > limits.max_pdf_pages {
        warn!(file = %name, pages, "PDF exceeds page cap, skipping");
        return String::new();
    }
    drop(doc);

    if started.elapsed() > limits.extract_budget {
        warn!(file = %name, "extraction budget exceeded after PDF load");
        return String::new();
    }

    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(file = %name, error = %e, "PDF text extraction failed");
            String::new()
        }
    }
}

fn extract_docx(bytes: &[u8], name: &str, limits: &Limits, started: Instant) -> String {
    let mut archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(a) => a,
        Err(e) => {
            warn!(file = %name, error = %e, "failed to open DOCX container");
            return String::new();
        }
    };
    let mut xml = String::new();
    match archive.by_name("word/document.xml") {
        Ok(mut entry) => {
            if entry.read_to_string(&mut xml).is_err() {
                warn!(file = %name, "failed to read word/document.xml");
                return String::new();
            }
        }
        Err(e) => {
            warn!(file = %name, error = %e, "DOCX has no word/document.xml");
            return String::new();
        }
    }

    // Text lives in <w:t> runs; paragraphs become line breaks.
    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text_run = false;
    let mut paragraphs = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Eof) => break,
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    text.push('\n');
                    paragraphs += 1;
                    if paragraphs % 64 == 0 && started.elapsed() > limits.extract_budget {
                        warn!(file = %name, paragraphs, "extraction budget exceeded mid-DOCX");
                        return String::new();
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(t)) => {
                if in_text_run {
                    text.push_str(&t.unescape().unwrap_or_default());
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(file = %name, error = %e, "malformed DOCX XML");
                return String::new();
            }
        }
        buf.clear();
    }
    text
}

/// PDF text layers frequently carry typographic ligatures; folding them back
/// keeps tokens like "office" from surviving as "oﬃce" and being stripped by
/// the ASCII filter downstream.
fn normalize_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}
