use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{path::Path as ObjPath, ObjectStore};

use crate::utils::config::{AppConfig, StorageKind};

pub type DynStore = Arc<dyn ObjectStore>;

/// Storage manager for the on-disk artifact caches.
///
/// Everything under its root is derivable state: deleting a location forces
/// the corresponding stage to recompute on the next run.
#[derive(Clone)]
pub struct StorageManager {
    store: DynStore,
    backend_kind: StorageKind,
    local_base: Option<PathBuf>,
}

impl StorageManager {
    /// Create a new StorageManager with the specified configuration.
    pub async fn new(cfg: &AppConfig) -> object_store::Result<Self> {
        let backend_kind = cfg.storage.clone();
        let (store, local_base) = create_storage_backend(cfg).await?;

        Ok(Self {
            store,
            backend_kind,
            local_base,
        })
    }

    /// Create a StorageManager with a custom storage backend.
    ///
    /// This method is useful for testing scenarios where you want to inject
    /// a specific storage backend.
    pub fn with_backend(store: DynStore, backend_kind: StorageKind) -> Self {
        Self {
            store,
            backend_kind,
            local_base: None,
        }
    }

    /// Get the storage backend kind.
    pub fn backend_kind(&self) -> &StorageKind {
        &self.backend_kind
    }

    /// Access the resolved local base directory when using the local backend.
    pub fn local_base_path(&self) -> Option<&Path> {
        self.local_base.as_deref()
    }

    /// Store bytes at the specified location.
    pub async fn put(&self, location: &str, data: Bytes) -> object_store::Result<()> {
        let path = ObjPath::from(location);
        let payload = object_store::PutPayload::from_bytes(data);
        self.store.put(&path, payload).await.map(|_| ())
    }

    /// Retrieve bytes from the specified location.
    ///
    /// Returns the full contents buffered in memory.
    pub async fn get(&self, location: &str) -> object_store::Result<Bytes> {
        let path = ObjPath::from(location);
        let result = self.store.get(&path).await?;
        result.bytes().await
    }

    /// Delete all objects below the specified prefix.
    pub async fn delete_prefix(&self, prefix: &str) -> object_store::Result<()> {
        let prefix_path = ObjPath::from(prefix);
        let locations = self
            .store
            .list(Some(&prefix_path))
            .map_ok(|m| m.location)
            .boxed();
        self.store
            .delete_stream(locations)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    /// List all objects below the specified prefix.
    pub async fn list(
        &self,
        prefix: Option<&str>,
    ) -> object_store::Result<Vec<object_store::ObjectMeta>> {
        let prefix_path = prefix.map(ObjPath::from);
        self.store.list(prefix_path.as_ref()).try_collect().await
    }

    /// Check if an object exists at the specified location.
    pub async fn exists(&self, location: &str) -> object_store::Result<bool> {
        let path = ObjPath::from(location);
        self.store
            .head(&path)
            .await
            .map(|_| true)
            .or_else(|e| match e {
                object_store::Error::NotFound { .. } => Ok(false),
                _ => Err(e),
            })
    }
}

/// Create a storage backend based on configuration.
async fn create_storage_backend(
    cfg: &AppConfig,
) -> object_store::Result<(DynStore, Option<PathBuf>)> {
    match cfg.storage {
        StorageKind::Local => {
            let base = resolve_base_dir(cfg);
            if !base.exists() {
                tokio::fs::create_dir_all(&base).await.map_err(|e| {
                    object_store::Error::Generic {
                        store: "LocalFileSystem",
                        source: e.into(),
                    }
                })?;
            }
            let store = LocalFileSystem::new_with_prefix(base.clone())?;
            Ok((Arc::new(store), Some(base)))
        }
        StorageKind::Memory => {
            let store = InMemory::new();
            Ok((Arc::new(store), None))
        }
    }
}

fn resolve_base_dir(cfg: &AppConfig) -> PathBuf {
    let configured = Path::new(&cfg.data_dir);
    if configured
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        tracing::warn!(
            data_dir = %cfg.data_dir,
            "data_dir contains parent traversals; falling back to ./data"
        );
        return PathBuf::from("./data");
    }
    configured.to_path_buf()
}

/// Testing utilities for storage operations.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    /// A StorageManager backed by `InMemory`, isolated per test.
    pub fn memory_storage() -> StorageManager {
        StorageManager::with_backend(Arc::new(InMemory::new()), StorageKind::Memory)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::memory_storage;
    use bytes::Bytes;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let storage = memory_storage();

        storage
            .put("artifacts/text/mat101.txt", Bytes::from_static(b"calculus"))
            .await
            .expect("put failed");

        let fetched = storage
            .get("artifacts/text/mat101.txt")
            .await
            .expect("get failed");
        assert_eq!(fetched.as_ref(), b"calculus");
    }

    #[tokio::test]
    async fn exists_reports_presence() {
        let storage = memory_storage();

        assert!(!storage.exists("artifacts/text/absent.txt").await.unwrap());

        storage
            .put("artifacts/text/present.txt", Bytes::from_static(b"x"))
            .await
            .unwrap();

        assert!(storage.exists("artifacts/text/present.txt").await.unwrap());
    }

    #[tokio::test]
    async fn delete_prefix_clears_stage() {
        let storage = memory_storage();
        storage
            .put("artifacts/course/a.json", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        storage
            .put("artifacts/course/b.json", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        storage
            .put("artifacts/text/a.txt", Bytes::from_static(b"t"))
            .await
            .unwrap();

        storage.delete_prefix("artifacts/course").await.unwrap();

        assert!(!storage.exists("artifacts/course/a.json").await.unwrap());
        assert!(!storage.exists("artifacts/course/b.json").await.unwrap());
        assert!(storage.exists("artifacts/text/a.txt").await.unwrap());
    }
}
