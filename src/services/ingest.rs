use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::Context;
use tokio::sync::watch;

use crate::ports::uploader::MediaUploader;
use crate::services::upload::UploadOutcome;

pub const SUPPORTED_FILE_TYPES: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tif", "tiff", "avif", "mp4",
    "mov",
];

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub watch_directory: PathBuf,
    pub archive_directory: PathBuf,
    pub album_title: String,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub found: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Polls the watch directory, uploads each supported file and archives the ones that made it.
///
/// Files that fail stay where they are and are retried on the next poll.
pub struct IngestionLoop<U> {
    uploader: U,
    settings: WatchSettings,
}

impl<U: MediaUploader> IngestionLoop<U> {
    pub fn new(uploader: U, settings: WatchSettings) -> Self {
        Self { uploader, settings }
    }

    pub fn prepare_directories(&self) -> Result<()> {
        for dir in [
            &self.settings.watch_directory,
            &self.settings.archive_directory,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Poll until `shutdown` flips to true or its sender goes away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.prepare_directories()?;
        log::info!(
            "Watching {} for new images (album: {})",
            self.settings.watch_directory.display(),
            self.settings.album_title
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.run_once(&shutdown).await {
                Ok(summary) if summary.found > 0 => {
                    tracing::info!(
                        uploaded = summary.uploaded,
                        failed = summary.failed,
                        "Poll cycle finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Poll cycle failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Stopped watching {}", self.settings.watch_directory.display());
        Ok(())
    }

    /// One scan of the watch directory. Shutdown is only checked between files.
    pub async fn run_once(&self, shutdown: &watch::Receiver<bool>) -> Result<PollSummary> {
        let files = scan_directory(&self.settings.watch_directory)?;
        let mut summary = PollSummary {
            found: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            tracing::info!(
                directory = %self.settings.watch_directory.display(),
                "No images found"
            );
            return Ok(summary);
        }

        let album = self.settings.album_title.as_str();
        for path in files {
            if *shutdown.borrow() {
                tracing::info!("Shutdown requested, leaving remaining files for later");
                break;
            }

            match self.uploader.upload(&path, album).await {
                UploadOutcome::Success { media_item_id } => {
                    tracing::info!(
                        file = %path.display(),
                        album,
                        media_item_id = media_item_id.as_deref().unwrap_or("unknown"),
                        "Uploaded"
                    );
                    summary.uploaded += 1;
                    if let Err(e) = relocate(&path, &self.settings.archive_directory).await {
                        tracing::error!(
                            file = %path.display(),
                            reason = %e,
                            "Uploaded but could not be archived"
                        );
                    }
                }
                UploadOutcome::Failure(failure) => {
                    tracing::warn!(
                        file = %path.display(),
                        album,
                        reason = %failure,
                        "Upload failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Supported files directly inside `directory`, sorted by name.
pub fn scan_directory(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(e)
                    .with_context(|| format!("Failed to list {}", directory.display()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_FILE_TYPES.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Move `path` into `archive_directory` and return where it landed.
pub async fn relocate(path: &Path, archive_directory: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| color_eyre::eyre::eyre!("No file name in {}", path.display()))?;
    let destination = unique_destination(archive_directory, Path::new(file_name));

    if let Err(rename_err) = tokio::fs::rename(path, &destination).await {
        // Rename fails across filesystems
        tracing::debug!(
            file = %path.display(),
            error = %rename_err,
            "Rename failed, copying instead"
        );
        copy_then_remove(path, &destination, tokio::fs::remove_file(path)).await?;
    }

    tracing::debug!(file = %path.display(), destination = %destination.display(), "Archived");
    Ok(destination)
}

/// Copy `path` to `destination`, then run `remove_source`.
///
/// If the source cannot be removed the copy is deleted again, so the file is never
/// left in both directories.
async fn copy_then_remove(
    path: &Path,
    destination: &Path,
    remove_source: impl Future<Output = std::io::Result<()>>,
) -> Result<()> {
    tokio::fs::copy(path, destination).await.with_context(|| {
        format!("Failed to copy {} to {}", path.display(), destination.display())
    })?;

    if let Err(e) = remove_source.await {
        if let Err(cleanup_err) = tokio::fs::remove_file(destination).await {
            tracing::error!(
                file = %path.display(),
                destination = %destination.display(),
                error = %cleanup_err,
                "Archived copy left behind"
            );
        }
        return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
    }
    Ok(())
}

/// `cat.jpg`, then `cat-1.jpg`, `cat-2.jpg`, ... until a free name is found.
fn unique_destination(directory: &Path, file_name: &Path) -> PathBuf {
    let candidate = directory.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| e.to_string_lossy().into_owned());

    (1..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{}-{}.{}", stem, n, ext),
                None => format!("{}-{}", stem, n),
            };
            directory.join(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}
