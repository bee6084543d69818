//! Local filesystem asset store addressed by content hash.
//!
//! Layout: `<root>/<kind>/<sha256>.jpg`. Files are written to a sibling
//! `*.part` file first and renamed into place, so a reader never sees a
//! partially written asset. Partials left behind by a crashed ingestion are
//! swept at the start of the next one.

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::process::ProcessedImage;
use super::OUTPUT_EXTENSION;
use crate::content::ContentKind;
use crate::error::CoreError;

const PART_SUFFIX: &str = ".part";

/// Partial files younger than this may belong to an in-flight ingestion.
pub const PARTIAL_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// A file written by [`LocalAssetStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Path relative to the store root, with `/` separators.
    pub relative_path: String,
    /// True when this call created the file, false when identical content
    /// was already stored.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative path an image with `content_hash` is stored at.
    pub fn relative_path(kind: ContentKind, content_hash: &str) -> String {
        format!("{}/{content_hash}.{OUTPUT_EXTENSION}", kind.media_dir())
    }

    /// Resolve a stored relative path, refusing anything that escapes the
    /// store root.
    pub fn absolute(&self, relative: &str) -> Result<PathBuf, CoreError> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(CoreError::Internal(format!(
                "stored path escapes media root: {relative}"
            )));
        }
        Ok(self.root.join(rel))
    }

    /// Atomically write `image` under its content hash.
    ///
    /// Writing content that is already stored is a no-op.
    pub fn put(&self, kind: ContentKind, image: &ProcessedImage) -> Result<StoredAsset, CoreError> {
        let relative_path = Self::relative_path(kind, &image.content_hash);
        let target = self.absolute(&relative_path)?;
        let dir = self.root.join(kind.media_dir());

        fs::create_dir_all(&dir).map_err(|e| ingest_io("create media directory", &dir, e))?;

        if target.is_file() {
            return Ok(StoredAsset {
                relative_path,
                created: false,
            });
        }

        let partial = dir.join(format!(
            "{}.{}{PART_SUFFIX}",
            image.content_hash,
            uuid::Uuid::new_v4().simple()
        ));

        let written = write_synced(&partial, &image.bytes)
            .and_then(|()| fs::rename(&partial, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&partial);
            return Err(ingest_io("write asset", &target, e));
        }

        Ok(StoredAsset {
            relative_path,
            created: true,
        })
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub fn remove(&self, relative: &str) -> Result<(), CoreError> {
        let path = self.absolute(relative)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ingest_io("remove asset", &path, e)),
        }
    }

    /// Delete `*.part` files older than `max_age` in `kind`'s directory.
    ///
    /// Returns the number of files removed. Failures are logged and skipped.
    pub fn sweep_partials(&self, kind: ContentKind, max_age: Duration) -> usize {
        let dir = self.root.join(kind.media_dir());
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Cannot scan for partial uploads");
                return 0;
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_partial = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(PART_SUFFIX));
            if !is_partial {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok());
            if age.is_some_and(|age| age >= max_age) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload")
                    }
                }
            }
        }

        if removed > 0 {
            tracing::info!(kind = %kind, removed, "Swept stale partial uploads");
        }
        removed
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn ingest_io(action: &str, path: &Path, e: io::Error) -> CoreError {
    CoreError::IngestFailed(format!("{action} {}: {e}", path.display()))
}
