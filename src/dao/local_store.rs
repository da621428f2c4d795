//! Device-local key-value store backed by one JSON file per namespace.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tokio::{fs, sync::Mutex};
use uuid::Uuid;

use crate::dao::storage::StorageError;

/// Namespace holding streak records keyed by device id.
pub const STREAK_NAMESPACE: &str = "streak";
/// Namespace holding the persisted daily word slot.
pub const DAILY_WORD_NAMESPACE: &str = "daily_word";
/// Namespace holding the device identity.
pub const DEVICE_NAMESPACE: &str = "device";

const DEVICE_ID_KEY: &str = "id";

/// Convenient result alias returning [`LocalStoreError`] failures.
pub type LocalResult<T> = Result<T, LocalStoreError>;

/// Failures that can occur while touching the device-local files.
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// Reading, writing or creating a file failed.
    #[error("local store I/O failed for `{path}`")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A namespace file exists but is not a JSON object.
    #[error("local store file `{path}` is corrupted")]
    Corrupted {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be converted to or from JSON.
    #[error("failed to convert value `{namespace}/{key}`")]
    Value {
        /// Namespace file.
        namespace: String,
        /// Entry key.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<LocalStoreError> for StorageError {
    fn from(err: LocalStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Key-value pairs scoped to this device, namespaced per feature.
#[derive(Debug)]
pub struct LocalKvStore {
    root: PathBuf,
    // Serializes read-modify-write cycles on namespace files.
    write_gate: Mutex<()>,
}

impl LocalKvStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> LocalResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| LocalStoreError::Io {
                path: root.clone(),
                source,
            })?;
        Ok(Self {
            root,
            write_gate: Mutex::new(()),
        })
    }

    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{namespace}.json"))
    }

    async fn read_namespace(&self, namespace: &str) -> LocalResult<BTreeMap<String, Value>> {
        let path = self.namespace_path(namespace);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|source| LocalStoreError::Corrupted { path, source }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(LocalStoreError::Io { path, source }),
        }
    }

    async fn write_namespace(
        &self,
        namespace: &str,
        entries: &BTreeMap<String, Value>,
    ) -> LocalResult<()> {
        let path = self.namespace_path(namespace);
        let staging = self.root.join(format!(".{namespace}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(entries).map_err(|source| {
            LocalStoreError::Corrupted {
                path: path.clone(),
                source,
            }
        })?;

        fs::write(&staging, bytes)
            .await
            .map_err(|source| LocalStoreError::Io {
                path: staging.clone(),
                source,
            })?;
        fs::rename(&staging, &path)
            .await
            .map_err(|source| LocalStoreError::Io { path, source })
    }

    /// Fetch the value stored under `namespace/key`.
    pub async fn get<T>(&self, namespace: &str, key: &str) -> LocalResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut entries = self.read_namespace(namespace).await?;
        entries
            .remove(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|source| LocalStoreError::Value {
                namespace: namespace.to_owned(),
                key: key.to_owned(),
                source,
            })
    }

    /// Replace the value stored under `namespace/key`.
    pub async fn put<T>(&self, namespace: &str, key: &str, value: &T) -> LocalResult<()>
    where
        T: ?Sized + Serialize,
    {
        let value = serde_json::to_value(value).map_err(|source| LocalStoreError::Value {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
            source,
        })?;

        let _gate = self.write_gate.lock().await;
        let mut entries = self.read_namespace(namespace).await?;
        entries.insert(key.to_owned(), value);
        self.write_namespace(namespace, &entries).await
    }

    /// Stable identifier of this device, generated on first use.
    pub async fn device_id(&self) -> LocalResult<String> {
        let _gate = self.write_gate.lock().await;
        let mut entries = self.read_namespace(DEVICE_NAMESPACE).await?;
        if let Some(Value::String(id)) = entries.get(DEVICE_ID_KEY) {
            return Ok(id.clone());
        }

        let id = Uuid::new_v4().to_string();
        entries.insert(DEVICE_ID_KEY.to_owned(), Value::String(id.clone()));
        self.write_namespace(DEVICE_NAMESPACE, &entries).await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_round_trip_per_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        store.put(STREAK_NAMESPACE, "dev-1", &3u32).await.unwrap();
        store.put(DAILY_WORD_NAMESPACE, "dev-1", &"other").await.unwrap();

        assert_eq!(store.get::<u32>(STREAK_NAMESPACE, "dev-1").await.unwrap(), Some(3));
        assert_eq!(store.get::<u32>(STREAK_NAMESPACE, "dev-2").await.unwrap(), None);
        assert_eq!(
            store.get::<String>(DAILY_WORD_NAMESPACE, "dev-1").await.unwrap().as_deref(),
            Some("other")
        );
    }

    #[tokio::test]
    async fn device_id_is_stable_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalKvStore::open(dir.path()).await.unwrap().device_id().await.unwrap();
        let again = LocalKvStore::open(dir.path()).await.unwrap().device_id().await.unwrap();
        assert_eq!(first, again);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn corrupted_namespace_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("streak.json"), b"{not json").unwrap();
        let store = LocalKvStore::open(dir.path()).await.unwrap();

        let err = store.get::<u32>(STREAK_NAMESPACE, "dev-1").await.unwrap_err();
        assert!(matches!(err, LocalStoreError::Corrupted { .. }));
    }
}
