//! Registration store persisted through a [`StorageBackend`]
//!
//! Layout: one JSON object per registration at `registrations/<id>.json`,
//! holding the record and its insertion sequence. The full set is loaded into
//! an in-memory index on open; every mutation writes through to storage
//! before the index is updated.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::index::RecordIndex;
use super::RegistrationStore;
use crate::storage::StorageBackend;
use crate::types::{
    ApplicationEndpointList, ApplicationEndpointListId, ApplicationEndpointsInfo, Pagination,
};
use crate::{Error, Result};

const RECORD_PREFIX: &str = "registrations";

/// On-disk envelope for a single registration
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    sequence: u64,
    record: ApplicationEndpointList,
}

pub struct PersistentStore {
    storage: Arc<dyn StorageBackend>,
    index: Arc<RwLock<RecordIndex>>,
}

impl PersistentStore {
    /// Open the store, loading every persisted registration.
    pub async fn open(storage: Arc<dyn StorageBackend>) -> Result<Self> {
        let mut index = RecordIndex::default();

        for key in storage.list(RECORD_PREFIX).await? {
            if !key.ends_with(".json") {
                continue;
            }

            let data = storage.get(&key).await?;
            let persisted: PersistedRecord = serde_json::from_slice(&data).map_err(|e| {
                Error::storage(format!("corrupt registration file {}: {}", key, e))
            })?;

            if record_key(&persisted.record.id) != key {
                return Err(Error::storage(format!(
                    "registration file {} holds record {}",
                    key, persisted.record.id
                )));
            }

            if persisted.sequence == u64::MAX {
                return Err(Error::storage(format!(
                    "registration file {} has an out-of-range sequence",
                    key
                )));
            }

            if index.contains_sequence(persisted.sequence) {
                return Err(Error::storage(format!(
                    "registration file {} reuses sequence {}",
                    key, persisted.sequence
                )));
            }

            index.insert(persisted.sequence, persisted.record);
        }

        tracing::info!(records = index.len(), "Loaded persisted registrations");

        Ok(Self {
            storage,
            index: Arc::new(RwLock::new(index)),
        })
    }

    /// Run a mutation under the write lock on its own task.
    ///
    /// Once the lock is held the storage write and the index update always run
    /// to completion together, even if the caller's future is dropped.
    async fn mutate<T, F, Fut>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(OwnedRwLockWriteGuard<RecordIndex>, Arc<dyn StorageBackend>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let index = self.index.clone().write_owned().await;
        tokio::spawn(op(index, self.storage.clone()))
            .await
            .map_err(|e| Error::internal(format!("registration write task failed: {}", e)))?
    }
}

async fn write_record(
    storage: &dyn StorageBackend,
    sequence: u64,
    record: &ApplicationEndpointList,
) -> Result<()> {
    let persisted = PersistedRecord {
        sequence,
        record: record.clone(),
    };
    let json = serde_json::to_vec(&persisted)?;
    storage.put(&record_key(&record.id), Bytes::from(json)).await
}

fn record_key(id: &ApplicationEndpointListId) -> String {
    format!("{}/{}.json", RECORD_PREFIX, id)
}

#[async_trait]
impl RegistrationStore for PersistentStore {
    async fn create(&self, info: ApplicationEndpointsInfo) -> Result<ApplicationEndpointList> {
        self.mutate(move |mut index, storage| async move {
            let (sequence, record) = index.allocate(info);
            write_record(storage.as_ref(), sequence, &record).await?;
            index.insert(sequence, record.clone());
            Ok::<_, Error>(record)
        })
        .await
    }

    async fn get(&self, id: &ApplicationEndpointListId) -> Result<ApplicationEndpointList> {
        let index = self.index.read().await;
        index.get(id).cloned().ok_or(Error::NotFound(*id))
    }

    async fn list(&self, page: Pagination) -> Result<Vec<ApplicationEndpointList>> {
        let index = self.index.read().await;
        Ok(index.page(page))
    }

    async fn replace(
        &self,
        id: &ApplicationEndpointListId,
        info: ApplicationEndpointsInfo,
    ) -> Result<ApplicationEndpointList> {
        let id = *id;
        self.mutate(move |mut index, storage| async move {
            let (sequence, record) = index.replaced(&id, info).ok_or(Error::NotFound(id))?;
            write_record(storage.as_ref(), sequence, &record).await?;
            index.insert(sequence, record.clone());
            Ok::<_, Error>(record)
        })
        .await
    }

    async fn delete(&self, id: &ApplicationEndpointListId) -> Result<()> {
        let id = *id;
        self.mutate(move |mut index, storage| async move {
            if index.get(&id).is_none() {
                return Err(Error::NotFound(id));
            }
            storage.delete(&record_key(&id)).await?;
            index.remove(&id);
            Ok::<_, Error>(())
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.index.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
