//! Local filesystem storage provider.
//!
//! Writes go to a uniquely named file under `<root>/.tmp`, are synced, and
//! are then published into place: `rename` for overwrites, `hard_link` for
//! create-only publication. Readers listing or opening the final path never
//! see a partially written file.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

use pagevault_core::error::{AppError, ErrorKind};
use pagevault_core::result::AppResult;
use pagevault_core::traits::storage::{ByteStream, StorageObjectMeta, StorageProvider};

/// Staging directory for in-progress writes, relative to the root.
const TEMP_DIR: &str = ".tmp";

/// Local filesystem storage provider.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored records.
    root: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(root.join(TEMP_DIR)).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;

        let swept = sweep_staging(&root.join(TEMP_DIR)).await;
        if swept > 0 {
            debug!(root = %root.display(), swept, "Removed stale staging files");
        }
        Ok(Self { root })
    }

    /// Resolve a relative path to an absolute path within the root.
    ///
    /// Rejects paths that could escape the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = path.trim_start_matches('/');
        let relative = Path::new(clean);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::validation(format!("Invalid storage path: {path}")));
        }
        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::StorageWrite,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Write `data` to a fresh staging file and fsync it.
    async fn stage(&self, data: &[u8]) -> AppResult<PathBuf> {
        let staged = self
            .root
            .join(TEMP_DIR)
            .join(format!("{}.tmp", Uuid::new_v4()));

        let write = async {
            let mut file = fs::File::create(&staged).await?;
            file.write_all(data).await?;
            file.sync_all().await
        };

        if let Err(e) = write.await {
            discard(&staged).await;
            return Err(AppError::with_source(
                ErrorKind::StorageWrite,
                "Failed to stage write",
                e,
            ));
        }
        Ok(staged)
    }
}

/// Remove staging files left by writes that never finished, such as a
/// request cancelled between staging and publication.
///
/// Runs before the provider serves any write, so every file present is
/// stale. Returns the number of files removed.
async fn sweep_staging(dir: &Path) -> usize {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Failed to scan staging directory");
            return 0;
        }
    };

    let mut swept = 0;
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "tmp") {
                    discard(&path).await;
                    swept += 1;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to read staging entry");
                break;
            }
        }
    }
    swept
}

/// Best-effort removal of a staging file.
async fn discard(staged: &Path) {
    if let Err(e) = fs::remove_file(staged).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %staged.display(), error = %e, "Failed to remove staging file");
        }
    }
}

fn read_error(path: &str, e: std::io::Error) -> AppError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AppError::not_found(format!("Object not found: {path}"))
    } else {
        AppError::with_source(
            ErrorKind::StorageRead,
            format!("Failed to read object: {path}"),
            e,
        )
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match fs::metadata(&self.root).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(_) => Ok(false),
        }
    }

    async fn read(&self, path: &str) -> AppResult<ByteStream> {
        let full_path = self.resolve(path)?;
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| read_error(path, e))?;

        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn read_bytes(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| read_error(path, e))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let staged = self.stage(&data).await?;
        if let Err(e) = fs::rename(&staged, &full_path).await {
            discard(&staged).await;
            return Err(AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to publish object: {path}"),
                e,
            ));
        }

        debug!(path, bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn write_new(&self, path: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        self.ensure_parent(&full_path).await?;

        let staged = self.stage(&data).await?;
        let published = fs::hard_link(&staged, &full_path).await;
        discard(&staged).await;

        match published {
            Ok(()) => {
                debug!(path, bytes = data.len(), "Published new object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AppError::conflict(format!("Object already exists: {path}")))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to publish object: {path}"),
                e,
            )),
        }
    }

    async fn delete(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::StorageWrite,
                format!("Failed to delete object: {path}"),
                e,
            )),
        }
    }

    async fn exists(&self, path: &str) -> AppResult<bool> {
        let full_path = self.resolve(path)?;
        fs::try_exists(&full_path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageRead,
                format!("Failed to stat object: {path}"),
                e,
            )
        })
    }

    async fn list(&self, path: &str) -> AppResult<Vec<StorageObjectMeta>> {
        let full_path = self.resolve(path)?;

        let mut dir = match fs::read_dir(&full_path).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::StorageRead,
                    format!("Failed to list directory: {path}"),
                    e,
                ));
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::StorageRead, "Failed to read directory entry", e)
        })? {
            // Entries can disappear between readdir and stat.
            let entry_meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::StorageRead,
                        "Failed to get entry metadata",
                        e,
                    ));
                }
            };

            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = if path.is_empty() || path == "/" {
                name
            } else {
                format!("{}/{}", path.trim_end_matches('/'), name)
            };

            entries.push(StorageObjectMeta {
                path: entry_path,
                size_bytes: entry_meta.len(),
                last_modified: entry_meta
                    .modified()
                    .ok()
                    .map(chrono::DateTime::<chrono::Utc>::from),
                is_directory: entry_meta.is_dir(),
            });
        }

        entries.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(a.path.cmp(&b.path))
        });

        Ok(entries)
    }
}
