//! Persisted client session: the logged-in identity and per-identity diaries.
//!
//! Storage is an injectable [`KeyValueStore`]; [`SessionStore`] layers the
//! key layout and JSON encoding on top of it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::reflection::Reflection;
use crate::user::Identity;

/// Key holding the serialized identity.
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Prefix of per-identity diary keys (`diary_<storage key>`).
pub const DIARY_KEY_PREFIX: &str = "diary_";

/// String key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

pub fn diary_key(storage_key: &str) -> String {
    format!("{}{}", DIARY_KEY_PREFIX, storage_key)
}

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored identity, if any.
    ///
    /// A malformed record is treated as logged out.
    pub async fn load_identity(&self) -> Result<Option<Identity>> {
        let Some(raw) = self.store.get(CURRENT_USER_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!("Ignoring malformed stored identity: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save_identity(&self, identity: &Identity) -> Result<()> {
        let raw = serde_json::to_string(identity)?;
        self.store.set(CURRENT_USER_KEY, &raw).await
    }

    pub async fn clear_identity(&self) -> Result<()> {
        self.store.remove(CURRENT_USER_KEY).await
    }

    /// Diary stored for `identity`.
    ///
    /// When nothing is stored under the preferred key, the legacy keys are
    /// tried in order; the first hit is copied to the preferred key and the
    /// legacy entry removed.
    ///
    /// A stored diary that does not decode is an error and is left in place.
    pub async fn load_diary(&self, identity: &Identity) -> Result<Vec<Reflection>> {
        let Some(preferred) = identity.storage_key() else {
            return Ok(Vec::new());
        };
        let preferred_key = diary_key(&preferred);

        if let Some(raw) = self.store.get(&preferred_key).await? {
            return decode_diary(&preferred_key, &raw);
        }

        for legacy in identity.legacy_storage_keys() {
            let legacy_key = diary_key(&legacy);
            let Some(raw) = self.store.get(&legacy_key).await? else {
                continue;
            };
            let diary = decode_diary(&legacy_key, &raw)?;
            tracing::info!("Migrating diary from '{}' to '{}'", legacy_key, preferred_key);
            self.store.set(&preferred_key, &raw).await?;
            self.store.remove(&legacy_key).await?;
            return Ok(diary);
        }

        Ok(Vec::new())
    }

    pub async fn save_diary(&self, identity: &Identity, diary: &[Reflection]) -> Result<()> {
        let Some(preferred) = identity.storage_key() else {
            tracing::warn!("Identity has no storage key; diary not saved");
            return Ok(());
        };
        let raw = serde_json::to_string(diary)?;
        self.store.set(&diary_key(&preferred), &raw).await
    }
}

fn decode_diary(key: &str, raw: &str) -> Result<Vec<Reflection>> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!("Malformed diary under '{}': {}", key, e);
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimeMachineError;
    use crate::reflection::Situation;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().await.remove(key);
            Ok(())
        }
    }

    fn reflection(id: &str) -> Reflection {
        Reflection {
            id: id.to_string(),
            date: "2024년 1월 1일".to_string(),
            situation: Situation::default(),
            conversation: Vec::new(),
            report: None,
        }
    }

    #[tokio::test]
    async fn test_identity_roundtrip_and_clear() {
        let store = SessionStore::new(Arc::new(MapStore::default()));
        assert!(store.load_identity().await.unwrap().is_none());

        let identity = Identity::new("jisu", "tok", "bearer");
        store.save_identity(&identity).await.unwrap();
        assert_eq!(store.load_identity().await.unwrap(), Some(identity));

        store.clear_identity().await.unwrap();
        assert!(store.load_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_identity_is_logged_out() {
        let backing = Arc::new(MapStore::default());
        backing.set(CURRENT_USER_KEY, "{oops").await.unwrap();
        let store = SessionStore::new(backing);
        assert!(store.load_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_diary_is_keyed_by_preferred_identity_key() {
        let backing = Arc::new(MapStore::default());
        let store = SessionStore::new(backing.clone());
        let mut identity = Identity::new("jisu", "tok", "");
        identity.id = Some(42);

        store
            .save_diary(&identity, &[reflection("r1")])
            .await
            .unwrap();
        assert!(backing.get("diary_42").await.unwrap().is_some());
        assert_eq!(store.load_diary(&identity).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_diary_is_an_error_and_kept() {
        let backing = Arc::new(MapStore::default());
        let mut entry = serde_json::to_value(reflection("old")).unwrap();
        entry["emotions"] = serde_json::json!(["unknown-tag"]);
        let raw = serde_json::to_string(&vec![entry]).unwrap();
        backing.set("diary_3", &raw).await.unwrap();

        let store = SessionStore::new(backing.clone());
        let mut identity = Identity::new("jisu", "tok", "");
        identity.id = Some(3);

        let err = store.load_diary(&identity).await.unwrap_err();
        assert!(matches!(err, TimeMachineError::Serialization { .. }));
        assert_eq!(backing.get("diary_3").await.unwrap(), Some(raw));
    }

    #[tokio::test]
    async fn test_undecodable_legacy_diary_is_not_migrated() {
        let backing = Arc::new(MapStore::default());
        backing.set("diary_jisu", "[{oops").await.unwrap();

        let store = SessionStore::new(backing.clone());
        let mut identity = Identity::new("jisu", "tok", "");
        identity.id = Some(7);

        assert!(store.load_diary(&identity).await.is_err());
        assert!(backing.get("diary_7").await.unwrap().is_none());
        assert!(backing.get("diary_jisu").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_legacy_diary_is_migrated_once() {
        let backing = Arc::new(MapStore::default());
        let legacy = serde_json::to_string(&vec![reflection("old")]).unwrap();
        backing.set("diary_jisu", &legacy).await.unwrap();

        let store = SessionStore::new(backing.clone());
        let mut identity = Identity::new("jisu", "tok", "");
        identity.id = Some(7);

        let diary = store.load_diary(&identity).await.unwrap();
        assert_eq!(diary[0].id, "old");
        assert!(backing.get("diary_7").await.unwrap().is_some());
        assert!(backing.get("diary_jisu").await.unwrap().is_none());
    }
}
