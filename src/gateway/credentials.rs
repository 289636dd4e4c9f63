use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;

/// Key the credential is stored under
pub const CREDENTIAL_KEY: &str = "token";

const CREDENTIAL_FILE: &str = "credentials.json";

/// Durable home of the single bearer credential.
///
/// Reads never fail: an unreadable store behaves as "no credential". Writes are
/// last-write-wins.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, token: &str) -> anyhow::Result<()>;

    /// Remove the credential; returns whether one was present
    fn clear(&self) -> bool;
}

/// Process-local store, used by tests and embedders that persist elsewhere
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("credential lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> bool {
        match self.token.write() {
            Ok(mut slot) => slot.take().is_some(),
            Err(_) => false,
        }
    }
}

/// Store backed by `credentials.json` in the client configuration directory.
///
/// The file is read once at open; afterwards reads are served from memory and
/// writes go through to disk.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileCredentialStore {
    pub fn open(config_dir: &Path) -> anyhow::Result<Self> {
        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let path = config_dir.join(CREDENTIAL_FILE);
        let token = read_token(&path);

        Ok(Self {
            path,
            token: RwLock::new(token),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, token: Option<&str>) -> anyhow::Result<()> {
        let mut entries: BTreeMap<String, Value> = fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        match token {
            Some(token) => {
                entries.insert(CREDENTIAL_KEY.to_string(), Value::String(token.to_string()));
            }
            None => {
                entries.remove(CREDENTIAL_KEY);
            }
        }

        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn read_token(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let entries: BTreeMap<String, Value> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Ignoring unreadable credential file {}: {}", path.display(), e);
            return None;
        }
    };

    entries
        .get(CREDENTIAL_KEY)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> anyhow::Result<()> {
        self.persist(Some(token))?;
        let mut slot = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("credential lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> bool {
        let had_token = match self.token.write() {
            Ok(mut slot) => slot.take().is_some(),
            Err(_) => false,
        };

        if had_token {
            if let Err(e) = self.persist(None) {
                tracing::error!("Failed to remove credential from {}: {}", self.path.display(), e);
            }
        }

        had_token
    }
}

/// Client configuration directory: `$PHISHGUARD_CONFIG_DIR`, else `~/.config/phishguard`
pub fn default_config_dir(configured: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }

    let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
    Ok(PathBuf::from(home).join(".config").join("phishguard"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("phishguard-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_store_clear_is_idempotent() {
        let store = MemoryCredentialStore::with_token("t1");
        assert_eq!(store.get().as_deref(), Some("t1"));
        assert!(store.clear());
        assert!(!store.clear());
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = scratch_dir("file-store");
        let store = FileCredentialStore::open(&dir).unwrap();
        assert_eq!(store.get(), None);

        store.set("t1").unwrap();
        let reopened = FileCredentialStore::open(&dir).unwrap();
        assert_eq!(reopened.get().as_deref(), Some("t1"));

        assert!(reopened.clear());
        let reopened = FileCredentialStore::open(&dir).unwrap();
        assert_eq!(reopened.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = scratch_dir("file-keys");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CREDENTIAL_FILE), r#"{"theme":"dark","token":"old"}"#).unwrap();

        let store = FileCredentialStore::open(&dir).unwrap();
        assert_eq!(store.get().as_deref(), Some("old"));
        store.clear();

        let content = fs::read_to_string(dir.join(CREDENTIAL_FILE)).unwrap();
        assert!(content.contains("theme"));
        assert!(!content.contains("old"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = scratch_dir("file-corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CREDENTIAL_FILE), "not json").unwrap();

        let store = FileCredentialStore::open(&dir).unwrap();
        assert_eq!(store.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
