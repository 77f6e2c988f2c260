use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;

/// String key/value persistence for client state.
pub trait KeyValueStore: Send + Sync {
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
}

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStorage {
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .items
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?
            .get(key)
            .cloned())
    }
}

/// One file per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create storage dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStorage {
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path(key);
        std::fs::write(&path, value).with_context(|| format!("write {}", path.display()))
    }

    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }
}
