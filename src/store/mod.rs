//! Registration store
//!
//! Owns every application endpoint list. Implementations must make each
//! operation atomic with respect to the others: a racing replace and delete
//! on the same id resolve to exactly one outcome, and no caller ever observes
//! a partially written record.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::local::LocalStorage;
use crate::types::{
    ApplicationEndpointList, ApplicationEndpointListId, ApplicationEndpointsInfo, Pagination,
};
use crate::Result;

mod index;
pub mod memory;
pub mod persistent;

pub use memory::MemoryStore;
pub use persistent::PersistentStore;

/// Keyed collection of registrations.
///
/// Payloads are expected to have passed [`crate::validation::validate`].
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Store a new registration under a freshly generated id
    async fn create(&self, info: ApplicationEndpointsInfo) -> Result<ApplicationEndpointList>;

    async fn get(&self, id: &ApplicationEndpointListId) -> Result<ApplicationEndpointList>;

    /// Page through registrations in insertion order
    async fn list(&self, page: Pagination) -> Result<Vec<ApplicationEndpointList>>;

    /// Overwrite the payload of `id`, keeping its id and creation time
    async fn replace(
        &self,
        id: &ApplicationEndpointListId,
        info: ApplicationEndpointsInfo,
    ) -> Result<ApplicationEndpointList>;

    async fn delete(&self, id: &ApplicationEndpointListId) -> Result<()>;

    async fn count(&self) -> Result<usize>;

    /// Short backend label for health reporting
    fn backend_name(&self) -> &'static str;
}

/// Store configuration
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Memory,
    Local { root_path: PathBuf },
}

/// Create registration store from config
pub async fn create_store(config: StoreConfig) -> Result<Arc<dyn RegistrationStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreConfig::Local { root_path } => {
            let storage = Arc::new(LocalStorage::new(root_path)?);
            let store = PersistentStore::open(storage).await?;
            Ok(Arc::new(store))
        }
    }
}
