use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use super::manager::{classify, to_catalog_error, Failure};
use super::statements::PgEntity;
use crate::catalog::{CatalogError, CatalogStore, Readiness};
use crate::pagination::PageRequest;

/// Postgres-backed store for one entity type.
pub struct Repository<E> {
    pool: PgPool,
    _phantom: PhantomData<fn() -> E>,
}

impl<E: PgEntity> Repository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: PhantomData,
        }
    }

    fn fail(err: sqlx::Error) -> CatalogError {
        to_catalog_error(err, E::LABEL, E::REFERENCES)
    }

    /// On delete a foreign key violation means other rows still point here.
    fn fail_delete(err: sqlx::Error) -> CatalogError {
        match classify(&err) {
            Failure::ForeignKeyViolation => {
                CatalogError::ForeignKeyInvalid(format!("{} is still referenced", E::LABEL))
            }
            _ => Self::fail(err),
        }
    }
}

#[async_trait]
impl<E: PgEntity> CatalogStore<E> for Repository<E> {
    async fn list(&self, page: PageRequest) -> Result<Vec<E::Table>, CatalogError> {
        sqlx::query_as::<_, E::Table>(E::SELECT_PAGE)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(Self::fail)
    }

    async fn count(&self) -> Result<i64, CatalogError> {
        sqlx::query_scalar::<_, i64>(E::COUNT)
            .fetch_one(&self.pool)
            .await
            .map_err(Self::fail)
    }

    async fn get(&self, id: Uuid) -> Result<E::Row, CatalogError> {
        sqlx::query_as::<_, E::Row>(E::SELECT_ONE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Self::fail)?
            .ok_or(CatalogError::NotFound(E::LABEL))
    }

    async fn create(&self, user: Uuid, draft: &E::Draft) -> Result<Uuid, CatalogError> {
        let id = Uuid::new_v4();
        E::insert(id, Utc::now(), user, draft)
            .execute(&self.pool)
            .await
            .map_err(Self::fail)?;
        Ok(id)
    }

    async fn edit(&self, id: Uuid, draft: &E::Draft) -> Result<(), CatalogError> {
        let result = E::update(id, draft)
            .execute(&self.pool)
            .await
            .map_err(Self::fail)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(E::LABEL));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let result = sqlx::query(E::DELETE)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Self::fail_delete)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(E::LABEL));
        }
        Ok(())
    }
}

/// Hands out a repository per entity over one shared pool.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn store<E: PgEntity>(&self) -> Arc<dyn CatalogStore<E>> {
        Arc::new(Repository::<E>::new(self.pool.clone()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Readiness for PgCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| to_catalog_error(e, "Database", "database"))?;
        Ok(())
    }
}
