//! File-backed audit sink
//!
//! One line per event, prefixed with a ctime-style local timestamp:
//! `[Mon Oct 19 10:00:00 2026] Client alice connected from 127.0.0.1:50412`

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use log::warn;

use super::AuditSink;

const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens `path` for appending, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &str) {
        // Format first so the whole entry goes out in a single write.
        let entry = format!("[{}] {}\n", Local::now().format(TIMESTAMP_FORMAT), event);

        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = file.write_all(entry.as_bytes()).and_then(|_| file.flush()) {
            warn!("Failed to write audit entry to {}: {}", self.path.display(), e);
        }
    }
}
