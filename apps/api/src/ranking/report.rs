//! CSV report artifact.
//!
//! After every successful run a two-column report (`Name,RelativeScore`) is
//! written to the configured output directory, replacing the previous one.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ranking::rank::ScoreRecord;

const REPORT_FILE: &str = "output.csv";

/// Writes the ranked records (already in descending order) to
/// `<output_dir>/output.csv`, creating the directory if needed and
/// overwriting any prior report. Returns the report path.
pub fn write_report(records: &[ScoreRecord], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(REPORT_FILE);

    let mut out = String::from("Name,RelativeScore\n");
    for record in records {
        out.push_str(&csv_field(&record.name));
        out.push(',');
        out.push_str(&format!("{:.2}\n", record.score));
    }

    fs::write(&path, out).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Quotes a field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: f64) -> ScoreRecord {
        ScoreRecord {
            name: name.to_string(),
            raw_similarity: score / 10.0,
            score,
        }
    }

    #[test]
    fn test_report_rows_in_given_order() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("top.pdf", 10.0), record("second.docx", 7.25)];
        let path = write_report(&records, dir.path()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "Name,RelativeScore\ntop.pdf,10.00\nsecond.docx,7.25\n"
        );
    }

    #[test]
    fn test_report_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        write_report(&[record("old.pdf", 10.0)], dir.path()).unwrap();
        let path = write_report(&[record("new.pdf", 10.0)], dir.path()).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("new.pdf"));
        assert!(!content.contains("old.pdf"));
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&[record("doe, jane.pdf", 10.0)], dir.path()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("\"doe, jane.pdf\",10.00"));
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results").join("latest");
        let path = write_report(&[record("cv.pdf", 10.0)], &nested).unwrap();
        assert!(path.exists());
    }
}
