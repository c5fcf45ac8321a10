//! Durable per-day message log.
//!
//! Every accepted message is appended, in its original (un-unwrapped)
//! encoding, to `<logs_dir>/YYYY-MM-DD.log`. Appends are serialized behind
//! a mutex so concurrent requests never interleave partial lines; the open
//! handle is swapped when the calendar date rolls over.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, NaiveDate};

use crate::error::SinkError;

struct SinkInner {
    file: File,
    date: NaiveDate,
}

/// Append-only, date-partitioned log of accepted messages.
pub struct LogSink {
    dir: PathBuf,
    inner: Arc<Mutex<SinkInner>>,
}

impl LogSink {
    /// Open (creating if needed) today's log file under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| SinkError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        let date = Local::now().date_naive();
        let file = open_file(&dir, date)?;
        Ok(Self {
            dir,
            inner: Arc::new(Mutex::new(SinkInner { file, date })),
        })
    }

    /// Append one message in its original form.
    ///
    /// Line format: `[YYYY-MM-DD HH:MM:SS] <original text>`.
    /// The write runs on the blocking pool; the mutex serializes concurrent
    /// appends so lines never interleave.
    pub async fn append(
        &self,
        original_text: &str,
        timestamp: DateTime<Local>,
    ) -> Result<(), SinkError> {
        let inner = Arc::clone(&self.inner);
        let dir = self.dir.clone();
        let date = timestamp.date_naive();
        let line = format!(
            "[{}] {}\n",
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            original_text
        );
        tokio::task::spawn_blocking(move || {
            let mut inner = match inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if date != inner.date {
                inner.file = open_file(&dir, date)?;
                inner.date = date;
            }
            inner.file.write_all(line.as_bytes())?;
            inner.file.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| SinkError::Write(std::io::Error::other(e)))?
    }

    /// Path of the log file for `date`. Used by the viewer's startup replay.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        file_path(&self.dir, date)
    }
}

fn file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", date.format("%Y-%m-%d")))
}

fn open_file(dir: &Path, date: NaiveDate) -> Result<File, SinkError> {
    let path = file_path(dir, date);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| SinkError::Open {
            path: path.display().to_string(),
            source,
        })
}
