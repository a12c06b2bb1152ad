//! Diary ownership strategies.
//!
//! [`LocalDiary`] keeps the collection in client storage; [`RemoteDiary`]
//! treats the backend's report history as the source of truth.

use std::sync::Arc;

use async_trait::async_trait;
use timemachine_core::config::DiaryMode;
use timemachine_core::error::Result;
use timemachine_core::gateway::ReflectionGateway;
use timemachine_core::reflection::Reflection;
use timemachine_core::session_store::SessionStore;
use timemachine_core::user::Identity;

/// Where the diary lives and how mutations reach it.
///
/// `save` and `delete` return the diary the caller should now show; on error
/// the caller keeps its current list.
#[async_trait]
pub trait DiaryStrategy: Send + Sync {
    fn mode(&self) -> DiaryMode;

    async fn load(&self, identity: &Identity) -> Result<Vec<Reflection>>;

    async fn save(
        &self,
        identity: &Identity,
        diary: &[Reflection],
        reflection: Reflection,
    ) -> Result<Vec<Reflection>>;

    async fn delete(
        &self,
        identity: &Identity,
        diary: &[Reflection],
        reflection_id: &str,
    ) -> Result<Vec<Reflection>>;
}

/// Client-authoritative diary, written back on every change.
///
/// Mutations start from what is stored rather than from the caller's list,
/// so a stored diary that failed to load is refused instead of overwritten.
pub struct LocalDiary {
    store: SessionStore,
}

impl LocalDiary {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DiaryStrategy for LocalDiary {
    fn mode(&self) -> DiaryMode {
        DiaryMode::Local
    }

    async fn load(&self, identity: &Identity) -> Result<Vec<Reflection>> {
        self.store.load_diary(identity).await
    }

    async fn save(
        &self,
        identity: &Identity,
        _diary: &[Reflection],
        reflection: Reflection,
    ) -> Result<Vec<Reflection>> {
        let mut updated = self.store.load_diary(identity).await?;
        updated.retain(|r| r.id != reflection.id);
        updated.push(reflection);
        self.store.save_diary(identity, &updated).await?;
        Ok(updated)
    }

    async fn delete(
        &self,
        identity: &Identity,
        _diary: &[Reflection],
        reflection_id: &str,
    ) -> Result<Vec<Reflection>> {
        let mut updated = self.store.load_diary(identity).await?;
        updated.retain(|r| r.id != reflection_id);
        self.store.save_diary(identity, &updated).await?;
        Ok(updated)
    }
}

/// Server-authoritative diary backed by the report history endpoint.
pub struct RemoteDiary {
    gateway: Arc<dyn ReflectionGateway>,
}

impl RemoteDiary {
    pub fn new(gateway: Arc<dyn ReflectionGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl DiaryStrategy for RemoteDiary {
    fn mode(&self) -> DiaryMode {
        DiaryMode::Server
    }

    /// Finished history records only.
    async fn load(&self, identity: &Identity) -> Result<Vec<Reflection>> {
        let records = self.gateway.report_history(&identity.credentials()).await?;
        let total = records.len();
        let diary: Vec<Reflection> = records
            .into_iter()
            .filter_map(|record| record.into_reflection())
            .collect();
        tracing::info!("Loaded {} of {} history records", diary.len(), total);
        Ok(diary)
    }

    /// The backend stored the reflection when its report was generated, so
    /// saving is a refetch.
    async fn save(
        &self,
        identity: &Identity,
        _diary: &[Reflection],
        _reflection: Reflection,
    ) -> Result<Vec<Reflection>> {
        self.load(identity).await
    }

    async fn delete(
        &self,
        identity: &Identity,
        diary: &[Reflection],
        reflection_id: &str,
    ) -> Result<Vec<Reflection>> {
        self.gateway
            .delete_reflection(&identity.credentials(), reflection_id)
            .await?;
        Ok(diary
            .iter()
            .filter(|r| r.id != reflection_id)
            .cloned()
            .collect())
    }
}
