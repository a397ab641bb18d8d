use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Minimal key-value persistence used for the local mirror.
///
/// Writes are last-write-wins per key; there are no transactions.
pub trait KvStore: Send + Sync {
    fn put(&self, key: &str, value: &Value) -> Result<()>;
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn list_keys(&self) -> Result<Vec<String>>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// One JSON document per key inside a directory.
///
/// File names are the hex encoding of the key, so any key (including the
/// reserved history key) maps to a safe, reversible name.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create store dir {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key.as_bytes())))
    }
}

fn key_from_file_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".json")?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}

impl KvStore for DirStore {
    fn put(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec(value).context("encode value")?;
        fs::write(&tmp, data).with_context(|| format!("write {:?}", tmp))?;
        fs::rename(&tmp, &path).with_context(|| format!("rename {:?}", path))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("read {:?}", path)),
        };
        let v = serde_json::from_slice(&data).with_context(|| format!("parse {:?}", path))?;
        Ok(Some(v))
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let rd = fs::read_dir(&self.dir).with_context(|| format!("read_dir {:?}", self.dir))?;
        let mut keys: Vec<String> = rd
            .flatten()
            .filter_map(|e| key_from_file_name(&e.file_name().to_string_lossy()))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {:?}", path)),
        }
    }
}

/// In-process store, used when no data directory is wanted (and in tests).
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KvStore for MemoryStore {
    fn put(&self, key: &str, value: &Value) -> Result<()> {
        self.entries().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries().get(key).cloned())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}
