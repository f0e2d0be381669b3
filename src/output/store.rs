use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CaptureResult;

/// Durable, namespaced key-value storage
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> CaptureResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> CaptureResult<()>;
}

/// One JSON document per namespace: `<dir>/<namespace>.json`
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub async fn open(dir: impl AsRef<Path>, namespace: &str) -> CaptureResult<Self> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(format!("{}.json", namespace));
        info!("Opened key-value store: {}", path.display());

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document; a missing or unreadable one counts as empty
    async fn read_all(&self) -> CaptureResult<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                warn!(
                    "{} does not contain a JSON object, starting over",
                    self.path.display()
                );
                Ok(Map::new())
            }
            Err(e) => {
                warn!("{} is not valid JSON, starting over: {}", self.path.display(), e);
                Ok(Map::new())
            }
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> CaptureResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> CaptureResult<()> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);

        // Write-then-rename so a crash never leaves a truncated document
        let tmp = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(&Value::Object(map))?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Stored key '{}' in {}", key, self.path.display());
        Ok(())
    }
}

/// Non-durable store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> CaptureResult<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> CaptureResult<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
