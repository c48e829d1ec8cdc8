//! File-backed resource store.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StorageError;

/// Resources live at `<root>/<resource path>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a resource path onto the store, refusing anything that would escape it.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        let mut depth = 0;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(path.to_string())),
            }
        }
        if depth == 0 {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(resolved)
    }

    pub async fn fetch(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file = self.resolve(path)?;
        fs::read(&file).await.map_err(|e| not_found_or(e, path))
    }

    /// Create a new resource. Fails if it already exists.
    pub async fn create(&self, path: &str, body: &[u8]) -> Result<(), StorageError> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut handle = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
                _ => StorageError::Io(e),
            })?;
        handle.write_all(body).await?;
        handle.flush().await?;
        Ok(())
    }

    /// Replace an existing resource's content.
    pub async fn update(&self, path: &str, body: &[u8]) -> Result<(), StorageError> {
        let file = self.resolve(path)?;
        let mut handle = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&file)
            .await
            .map_err(|e| not_found_or(e, path))?;
        handle.write_all(body).await?;
        handle.flush().await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let file = self.resolve(path)?;
        fs::remove_file(&file).await.map_err(|e| not_found_or(e, path))
    }
}

fn not_found_or(e: std::io::Error, path: &str) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
        _ => StorageError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileStore {
        FileStore::new(std::env::temp_dir().join(format!("shardgate-files-{}", uuid::Uuid::new_v4())))
    }

    #[test]
    fn resolve_rejects_escapes() {
        let store = FileStore::new("/srv/data");
        assert_eq!(
            store.resolve("/docs/readme").unwrap(),
            PathBuf::from("/srv/data/docs/readme")
        );
        assert!(matches!(store.resolve("/../etc/passwd"), Err(StorageError::InvalidPath(_))));
        assert!(matches!(store.resolve("/"), Err(StorageError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn create_fetch_update_delete() {
        let store = temp_store();

        assert!(matches!(store.fetch("/docs/readme").await, Err(StorageError::NotFound(_))));
        store.create("/docs/readme", b"hello").await.unwrap();
        assert!(matches!(
            store.create("/docs/readme", b"again").await,
            Err(StorageError::AlreadyExists(_))
        ));
        assert_eq!(store.fetch("/docs/readme").await.unwrap(), b"hello");

        store.update("/docs/readme", b"hi").await.unwrap();
        assert_eq!(store.fetch("/docs/readme").await.unwrap(), b"hi");
        assert!(matches!(
            store.update("/docs/missing", b"x").await,
            Err(StorageError::NotFound(_))
        ));

        store.delete("/docs/readme").await.unwrap();
        assert!(matches!(store.delete("/docs/readme").await, Err(StorageError::NotFound(_))));

        let _ = std::fs::remove_dir_all(store.root());
    }
}
