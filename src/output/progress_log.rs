//! Durable progress log
//!
//! One `user_id:brand` line per counted user, synced to disk before the
//! append returns. The file is truncated whenever a fresh run starts.

use crate::output::traits::{OutputResult, ProgressSink};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed progress sink
#[derive(Debug)]
pub struct FileProgressLog {
    path: PathBuf,
    file: File,
}

impl FileProgressLog {
    /// Creates (or truncates) the log at `path`, creating parent directories
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = open_truncated(path)?;
        tracing::debug!("Progress log opened at {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

impl ProgressSink for FileProgressLog {
    fn append(&mut self, user_id: &str, brand: &str) -> std::io::Result<()> {
        writeln!(self.file, "{}:{}", user_id, brand)?;
        self.file.sync_data()
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()?;
        self.file.sync_all()
    }

    fn reset(&mut self) -> std::io::Result<()> {
        self.file = open_truncated(&self.path)?;
        Ok(())
    }
}
