use std::{
    collections::HashMap,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use serde_json::Value;
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt},
    sync::RwLock,
};
use tracing::{debug, warn};

/// Interface for abstracting the persistence of top level records. Mirrors a browser extension's
/// local storage: values are JSON documents addressed by a key, there are no transactions, and a
/// single `set` call either stores every entry or fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Returns [None] if nothing was ever stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()>;
}

#[async_trait]
impl<T> KeyValueBackend for T
where
    T: Deref + Send + Sync,
    T::Target: KeyValueBackend,
{
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.deref().get(key).await
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()> {
        self.deref().set(entries).await
    }
}

/// Keeps everything in memory. Used in tests and for dry runs.
#[derive(Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()> {
        let mut values = self.values.write().await;
        values.extend(entries);
        Ok(())
    }
}

const LOCK_FILE: &str = ".lock";

/// Stores every key as `<dir>/<key>.json`.
///
/// Writes go to temporary files first and are renamed into place only after every entry of the
/// call was written, so a reader sees either the old or the new documents. A lock file
/// serializes readers and writers across processes.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn open_lock(&self) -> Result<File> {
        let path = self.dir.join(LOCK_FILE);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open lock file {path:?}"))?;
        Ok(file)
    }

    async fn read_value(path: &Path) -> Result<Option<Value>> {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to open {path:?}"))?,
        };
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Stored value in {path:?} is not valid json"))?;
        Ok(Some(value))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.tmp"))
    }

    /// Writes the value next to its final location without touching the stored document.
    async fn stage_value(&self, key: &str, value: &Value) -> Result<()> {
        let temp = self.temp_path(key);

        let mut file = File::create(&temp)
            .await
            .with_context(|| format!("Failed to create {temp:?}"))?;
        file.write_all(&serde_json::to_vec(value)?).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn commit_value(&self, key: &str) -> Result<()> {
        let temp = self.temp_path(key);
        let path = self.key_path(key);
        fs::rename(&temp, &path)
            .await
            .with_context(|| format!("Failed to move {temp:?} to {path:?}"))?;
        Ok(())
    }

    /// Stages every entry first and renames only once all of them are on disk, so a failed write
    /// never leaves one key updated and another stale.
    async fn write_all(&self, entries: &[(String, Value)]) -> Result<()> {
        for (index, (key, value)) in entries.iter().enumerate() {
            debug!("Staging {key}");
            if let Err(e) = self.stage_value(key, value).await {
                for (key, _) in &entries[..=index] {
                    let temp = self.temp_path(key);
                    if let Err(e) = fs::remove_file(&temp).await {
                        if e.kind() != ErrorKind::NotFound {
                            warn!("Failed to remove {temp:?}: {e}");
                        }
                    }
                }
                return Err(e);
            }
        }

        for (key, _) in entries {
            self.commit_value(key).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);
        debug!("Reading {path:?}");

        let lock = self.open_lock().await?;
        lock.lock_shared()?;
        let result = Self::read_value(&path).await;
        lock.unlock_async().await?;
        result
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<()> {
        let lock = self.open_lock().await?;
        lock.lock_exclusive()?;
        let result = self.write_all(&entries).await;
        lock.unlock_async().await?;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{FileBackend, KeyValueBackend, MemoryBackend};

    #[tokio::test]
    async fn memory_backend_overwrites_keys() -> Result<()> {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("a").await?, None);

        backend
            .set(vec![("a".into(), json!(1)), ("b".into(), json!({"x": 2}))])
            .await?;
        backend.set(vec![("a".into(), json!(3))]).await?;

        assert_eq!(backend.get("a").await?, Some(json!(3)));
        assert_eq!(backend.get("b").await?, Some(json!({"x": 2})));
        Ok(())
    }

    #[tokio::test]
    async fn shared_backend_through_arc() -> Result<()> {
        let backend = Arc::new(MemoryBackend::new());
        let other = backend.clone();
        backend.set(vec![("k".into(), json!("v"))]).await?;
        assert_eq!(other.get("k").await?, Some(json!("v")));
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_persists_between_instances() -> Result<()> {
        let dir = tempdir()?;
        {
            let backend = FileBackend::new(dir.path().join("data"))?;
            assert_eq!(backend.get("usageByDay").await?, None);
            backend
                .set(vec![
                    ("usageByDay".into(), json!({"2025-01-01": {"domains": {}}})),
                    ("totalMsByDomain".into(), json!({"a.com": 5})),
                ])
                .await?;
        }

        let backend = FileBackend::new(dir.path().join("data"))?;
        assert_eq!(
            backend.get("usageByDay").await?,
            Some(json!({"2025-01-01": {"domains": {}}}))
        );
        assert_eq!(backend.get("totalMsByDomain").await?, Some(json!({"a.com": 5})));
        assert!(!dir.path().join("data/usageByDay.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_keeps_old_values_when_one_entry_fails() -> Result<()> {
        let dir = tempdir()?;
        let backend = FileBackend::new(dir.path().to_owned())?;
        backend
            .set(vec![("first".into(), json!(1)), ("second".into(), json!(1))])
            .await?;

        // A directory in place of the temp file makes staging the second key fail
        std::fs::create_dir(dir.path().join("second.json.tmp"))?;
        let result = backend
            .set(vec![("first".into(), json!(2)), ("second".into(), json!(2))])
            .await;

        assert!(result.is_err());
        assert_eq!(backend.get("first").await?, Some(json!(1)));
        assert_eq!(backend.get("second").await?, Some(json!(1)));
        assert!(!dir.path().join("first.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_treats_empty_file_as_missing() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("disabledDomains.json"), "")?;
        let backend = FileBackend::new(dir.path().to_owned())?;
        assert_eq!(backend.get("disabledDomains").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn file_backend_rejects_corrupted_json() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("totalMsByDomain.json"), "{\"a.com\": 1")?;
        let backend = FileBackend::new(dir.path().to_owned())?;
        assert!(backend.get("totalMsByDomain").await.is_err());
        Ok(())
    }
}
