//! Append-only event log in JSON lines.
//!
//! One [`Event`] per line, in publish order. The file is never rewritten, so a
//! crash loses at most the buffered tail.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::events::Event;
use crate::repository::{RepositoryError, Result};

/// File-backed event log.
pub struct FileEventLog {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl FileEventLog {
    /// Create a new log file. Fails if the file already exists.
    pub fn create(base_dir: impl AsRef<Path>, filename: impl AsRef<str>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;

        let path = base_dir.join(filename.as_ref());
        if path.exists() {
            return Err(RepositoryError::LogAlreadyExists(
                path.display().to_string(),
            ));
        }

        let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        tracing::debug!(target: "runtime::repository", path = %path.display(), "created event log");

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Open an existing log for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn append(&mut self, event: &Event) -> Result<()> {
        let line = serde_json::to_string(event).map_err(|e| RepositoryError::Json(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Events appended through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every event in a log file.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Event>> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event = serde_json::from_str(&line).map_err(|e| RepositoryError::CorruptedData {
                line: index + 1,
                message: e.to_string(),
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

impl Drop for FileEventLog {
    fn drop(&mut self) {
        if let Err(error) = self.writer.flush() {
            tracing::warn!(target: "runtime::repository", path = %self.path.display(), %error, "event log flush failed");
        }
    }
}
