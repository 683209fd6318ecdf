//! Flat-file persistence: every collection is a pretty-printed JSON array on disk.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{auth::otp::OtpRecord, users::repo::User};

/// One JSON-array file. Clones share the same lock.
pub struct JsonFile<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for JsonFile<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole collection. A missing file is an empty collection.
    pub async fn load(&self) -> anyhow::Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        read_items(&self.path).await
    }

    /// Run `f` over the collection and persist the result, all under the file lock.
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn update<R, E>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> anyhow::Result<Result<R, E>> {
        let _guard = self.lock.lock().await;
        let mut items = read_items(&self.path).await?;
        let out = match f(&mut items) {
            Ok(r) => r,
            Err(e) => return Ok(Err(e)),
        };
        write_items(&self.path, &items).await?;
        Ok(Ok(out))
    }
}

async fn read_items<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&raw).with_context(|| format!("parse {}", path.display()))
}

async fn write_items<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    let body = serde_json::to_vec_pretty(items).context("serialize collection")?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    debug!(path = %path.display(), count = items.len(), "collection saved");
    Ok(())
}

/// Handle to every collection the service persists.
#[derive(Clone)]
pub struct Database {
    pub users: JsonFile<User>,
    pub otps: JsonFile<OtpRecord>,
}

impl Database {
    pub async fn open(dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create data dir {}", dir.display()))?;
        Ok(Self {
            users: JsonFile::new(dir.join("users.json")),
            otps: JsonFile::new(dir.join("otps.json")),
        })
    }
}
