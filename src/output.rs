//! Append-only report output

use crate::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const SEPARATOR_WIDTH: usize = 50;

/// Destination for rendered reports
pub trait ReportSink: Send + Sync {
    fn append(&self, rendered: &str) -> Result<()>;
}

/// Appends each report plus a separator line to a UTF-8 text file
pub struct FileReportSink {
    path: PathBuf,
}

impl FileReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Report text followed by a newline and a run of `=`
pub fn with_separator(rendered: &str) -> String {
    format!("{}\n{}\n", rendered, "=".repeat(SEPARATOR_WIDTH))
}

impl ReportSink for FileReportSink {
    fn append(&self, rendered: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(with_separator(rendered).as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_separator_is_fifty_equals() {
        let entry = with_separator("report");
        assert_eq!(entry, format!("report\n{}\n", "=".repeat(50)));
    }

    #[test]
    fn test_file_sink_appends_runs() {
        let dir = tempdir().unwrap();
        let sink = FileReportSink::new(dir.path().join("whale_watcher_output.txt"));

        sink.append("first").unwrap();
        sink.append("second").unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let separator = "=".repeat(50);
        assert_eq!(
            contents,
            format!("first\n{sep}\nsecond\n{sep}\n", sep = separator)
        );
    }

    #[test]
    fn test_file_sink_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let sink = FileReportSink::new(dir.path().join("missing").join("out.txt"));

        let err = sink.append("report").unwrap_err();
        assert!(matches!(err, crate::error::WatcherError::Io(_)));
    }
}
