//! In-memory registration store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::index::RecordIndex;
use super::RegistrationStore;
use crate::types::{
    ApplicationEndpointList, ApplicationEndpointListId, ApplicationEndpointsInfo, Pagination,
};
use crate::{Error, Result};

/// Registration store held entirely in process memory.
///
/// A single `RwLock` guards the index: each mutation runs under the write
/// lock, reads share the read lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: RwLock<RecordIndex>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn create(&self, info: ApplicationEndpointsInfo) -> Result<ApplicationEndpointList> {
        let mut index = self.index.write().await;
        let (sequence, record) = index.allocate(info);
        index.insert(sequence, record.clone());
        Ok(record)
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
        let mut index = self.index.write().await;
        let (sequence, record) = index.replaced(id, info).ok_or(Error::NotFound(*id))?;
        index.insert(sequence, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &ApplicationEndpointListId) -> Result<()> {
        let mut index = self.index.write().await;
        index.remove(id).map(|_| ()).ok_or(Error::NotFound(*id))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.index.read().await.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
