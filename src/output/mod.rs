use chrono::Utc;
use fs_err as fs;
use regex::Regex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::WriteError;
use crate::model::{Document, DocumentKind, GenerationSummary};

pub mod lock;

pub const ARCHIVE_DIR: &str = "archive";

/// File naming of one versioned artifact: `<stem>_v<N>.<ext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName {
    pub stem: &'static str,
    pub ext: &'static str,
}

impl ArtifactName {
    pub const SUMMARY: ArtifactName = ArtifactName { stem: "generation_summary", ext: "json" };

    pub fn for_kind(kind: DocumentKind) -> Self {
        Self { stem: kind.file_stem(), ext: "md" }
    }

    pub fn file_name(&self, version: u32) -> String {
        format!("{}_v{version}.{}", self.stem, self.ext)
    }

    fn pattern(&self) -> Result<Regex, io::Error> {
        Regex::new(&format!(r"^{}_v(\d+)\.{}$", regex::escape(self.stem), regex::escape(self.ext)))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }
}

/// Resolves version numbers for an artifact in a directory.
pub trait VersionStrategy: Send + Sync {
    /// Highest version present, if any.
    fn latest_version(&self, name: &ArtifactName, dir: &Path) -> Result<Option<u32>, WriteError>;

    fn next_version(&self, name: &ArtifactName, dir: &Path) -> Result<u32, WriteError> {
        successor(self.latest_version(name, dir)?, name, dir)
    }
}

fn successor(latest: Option<u32>, name: &ArtifactName, dir: &Path) -> Result<u32, WriteError> {
    match latest {
        None => Ok(1),
        Some(v) => v.checked_add(1).ok_or_else(|| {
            let msg = format!("no version left after {}", name.file_name(v));
            WriteError::new(dir, io::Error::new(io::ErrorKind::Other, msg))
        }),
    }
}

/// Derives versions from the file names already in the directory.
/// Suffixes that do not fit in a `u32` are ignored like any unrelated file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsScanStrategy;

impl VersionStrategy for FsScanStrategy {
    fn latest_version(&self, name: &ArtifactName, dir: &Path) -> Result<Option<u32>, WriteError> {
        if !dir.exists() {
            return Ok(None);
        }
        let re = name.pattern().map_err(|e| WriteError::new(dir, e))?;
        let mut latest = None;
        for entry in fs::read_dir(dir).map_err(|e| WriteError::new(dir, e))? {
            let entry = entry.map_err(|e| WriteError::new(dir, e))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            let version = re
                .captures(file_name)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok());
            if let Some(v) = version {
                latest = latest.max(Some(v));
            }
        }
        Ok(latest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub version: u32,
    pub bytes: u64,
    pub archived: Option<PathBuf>,
}

/// Writes artifacts at the next free version, archiving the predecessor first.
pub struct VersionedWriter {
    strategy: Box<dyn VersionStrategy>,
    archive: bool,
}

impl VersionedWriter {
    pub fn new(strategy: Box<dyn VersionStrategy>, archive: bool) -> Self {
        Self { strategy, archive }
    }

    pub fn fs(archive: bool) -> Self {
        Self::new(Box::new(FsScanStrategy), archive)
    }

    pub fn write(&self, document: &Document, dir: &Path, version: Option<u32>) -> Result<WrittenDocument, WriteError> {
        self.write_artifact(ArtifactName::for_kind(document.kind), &document.render(), dir, version, self.archive)
    }

    /// The summary gets its own version sequence and is never archived.
    pub fn write_summary(
        &self,
        summary: &GenerationSummary,
        dir: &Path,
        version: Option<u32>,
    ) -> Result<WrittenDocument, WriteError> {
        let json = serde_json::to_string_pretty(summary).map_err(|e| WriteError::new(dir, e.into()))?;
        self.write_artifact(ArtifactName::SUMMARY, &json, dir, version, false)
    }

    fn write_artifact(
        &self,
        name: ArtifactName,
        contents: &str,
        dir: &Path,
        version: Option<u32>,
        archive: bool,
    ) -> Result<WrittenDocument, WriteError> {
        fs::create_dir_all(dir).map_err(|e| WriteError::new(dir, e))?;

        let latest = self.strategy.latest_version(&name, dir)?;
        let version = match version {
            Some(v) => v,
            None => successor(latest, &name, dir)?,
        };
        let path = dir.join(name.file_name(version));

        // Predecessor: the file being replaced under a pinned version, else the latest one.
        let previous = if path.exists() {
            Some(version)
        } else {
            latest.filter(|v| dir.join(name.file_name(*v)).exists())
        };
        let archived = match previous {
            Some(prev) if archive => Some(archive_copy(&name, dir, prev)?),
            _ => None,
        };

        atomic_write(&path, contents.as_bytes())?;
        info!(path = %path.display(), version, "wrote artifact");
        Ok(WrittenDocument { path, version, bytes: contents.len() as u64, archived })
    }
}

fn archive_copy(name: &ArtifactName, dir: &Path, version: u32) -> Result<PathBuf, WriteError> {
    let source = dir.join(name.file_name(version));
    let archive_dir = dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir).map_err(|e| WriteError::new(&archive_dir, e))?;

    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    let base = format!("{}_v{version}_{stamp}", name.stem);
    let mut target = archive_dir.join(format!("{base}.{}", name.ext));
    let mut n = 1;
    while target.exists() {
        target = archive_dir.join(format!("{base}-{n}.{}", name.ext));
        n += 1;
    }
    fs::copy(&source, &target).map_err(|e| WriteError::new(&target, e))?;
    debug!(from = %source.display(), to = %target.display(), "archived previous version");
    Ok(target)
}

/// Write through a temp file in the same directory, then rename into place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), WriteError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| WriteError::new(path, e))?;
    tmp.write_all(data).map_err(|e| WriteError::new(path, e))?;
    tmp.flush().map_err(|e| WriteError::new(path, e))?;
    tmp.persist(path).map_err(|e| WriteError::new(path, e.error))?;
    Ok(())
}
