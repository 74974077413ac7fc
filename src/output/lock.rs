use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

pub const LOCK_FILE: &str = ".vibe_docgen.lock";

/// Advisory lock serializing runs against one output directory.
pub struct RunLock {
    path: PathBuf,
    inner: RwLock<File>,
}

impl RunLock {
    pub fn open(output_dir: &Path) -> Result<Self, PipelineError> {
        fs_err::create_dir_all(output_dir)
            .map_err(|e| PipelineError::Config(format!("creating output directory: {e}")))?;
        let path = output_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| PipelineError::Config(format!("opening lock file {}: {e}", path.display())))?;
        Ok(Self { path, inner: RwLock::new(file) })
    }

    /// Take the lock without waiting. Held until the guard drops.
    pub fn try_hold(&mut self) -> Result<RwLockWriteGuard<'_, File>, PipelineError> {
        let path = &self.path;
        self.inner.try_write().map_err(|e| {
            if e.kind() == io::ErrorKind::WouldBlock {
                PipelineError::Config(format!(
                    "another run is writing to this output directory (lock held on {})",
                    path.display()
                ))
            } else {
                PipelineError::Config(format!("locking {}: {e}", path.display()))
            }
        })
    }
}
