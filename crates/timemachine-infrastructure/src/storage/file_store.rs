//! File-backed key-value store: one JSON file per key.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use timemachine_core::error::{Result, TimeMachineError};
use timemachine_core::session_store::KeyValueStore;

use super::atomic_file::AtomicFile;

/// Stores each key as `<root>/<sanitized key>.json`.
///
/// Blocking file work (including the `fs2` lock) runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, key: &str) -> AtomicFile {
        AtomicFile::new(self.root.join(format!("{}.json", sanitize_key(key))))
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(op)
            .await
            .map_err(|e| TimeMachineError::internal(format!("storage task failed: {}", e)))?
    }
}

/// Maps a key to a file stem: ASCII alphanumerics and `-` pass through,
/// every other byte becomes `_XX` hex. The mapping is injective.
fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => out.push(byte as char),
            _ => out.push_str(&format!("_{:02x}", byte)),
        }
    }
    out
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key);
        self.run_blocking(move || file.load()).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let file = self.file_for(key);
        let value = value.to_string();
        tracing::debug!("Writing '{}' to {}", key, file.path().display());
        self.run_blocking(move || file.save(&value)).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let file = self.file_for(key);
        self.run_blocking(move || file.remove()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("currentUser"), "currentUser");
        assert_eq!(sanitize_key("diary_42"), "diary_5f42");
        assert_eq!(sanitize_key("diary_a@b.com"), "diary_5fa_40b_2ecom");
        assert_eq!(sanitize_key("../x"), "_2e_2e_2fx");
        // distinct keys never collide
        assert_ne!(sanitize_key("a_b"), sanitize_key("a/b"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path());

        assert!(store.get("currentUser").await.unwrap().is_none());
        store.set("currentUser", "{\"a\":1}").await.unwrap();
        assert_eq!(
            store.get("currentUser").await.unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        store.remove("currentUser").await.unwrap();
        assert!(store.get("currentUser").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        FileKeyValueStore::new(temp_dir.path())
            .set("diary_jisu", "[]")
            .await
            .unwrap();

        let reopened = FileKeyValueStore::new(temp_dir.path());
        assert_eq!(
            reopened.get("diary_jisu").await.unwrap().as_deref(),
            Some("[]")
        );
    }
}
