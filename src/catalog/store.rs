use async_trait::async_trait;
use uuid::Uuid;

use super::entity::Entity;
use super::error::CatalogError;
use crate::pagination::PageRequest;

/// Persistence operations for one entity type. Each call maps to a single
/// statement; the owning user is supplied on create and never changed afterwards.
#[async_trait]
pub trait CatalogStore<E: Entity>: Send + Sync {
    /// One page of listing rows with references resolved, in creation order.
    async fn list(&self, page: PageRequest) -> Result<Vec<E::Table>, CatalogError>;

    async fn count(&self) -> Result<i64, CatalogError>;

    async fn get(&self, id: Uuid) -> Result<E::Row, CatalogError>;

    /// Insert a new row owned by `user` and return its generated id.
    async fn create(&self, user: Uuid, draft: &E::Draft) -> Result<Uuid, CatalogError>;

    /// Replace the business fields of an existing row.
    async fn edit(&self, id: Uuid, draft: &E::Draft) -> Result<(), CatalogError>;

    async fn delete(&self, id: Uuid) -> Result<(), CatalogError>;
}

/// Connectivity probe for the health endpoint.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn ping(&self) -> Result<(), CatalogError>;
}
