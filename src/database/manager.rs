use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::catalog::CatalogError;
use crate::config::DatabaseConfig;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const QUERY_CANCELED: &str = "57014";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the shared pool. Every connection carries the configured
/// `statement_timeout` so a stuck query fails instead of holding the request.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|_| DatabaseError::InvalidDatabaseUrl)?
        .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await?;

    info!(
        "Created database pool (max_connections={}, statement_timeout={}ms)",
        config.max_connections, config.statement_timeout_ms
    );
    Ok(pool)
}

/// What a failed statement means for the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    UniqueViolation,
    ForeignKeyViolation,
    Timeout,
    Other,
}

pub fn classify(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::PoolTimedOut => Failure::Timeout,
        sqlx::Error::Database(db) => classify_code(db.code().as_deref()),
        _ => Failure::Other,
    }
}

fn classify_code(code: Option<&str>) -> Failure {
    match code {
        Some(UNIQUE_VIOLATION) => Failure::UniqueViolation,
        Some(FOREIGN_KEY_VIOLATION) => Failure::ForeignKeyViolation,
        Some(QUERY_CANCELED) => Failure::Timeout,
        _ => Failure::Other,
    }
}

/// Translate a driver error into the catalog taxonomy for entity `label`.
/// `references` names what a foreign key violation points at.
pub fn to_catalog_error(err: sqlx::Error, label: &'static str, references: &str) -> CatalogError {
    match classify(&err) {
        Failure::UniqueViolation => CatalogError::DuplicateName(label),
        Failure::ForeignKeyViolation => {
            CatalogError::ForeignKeyInvalid(format!("Referenced {} does not exist", references))
        }
        Failure::Timeout => CatalogError::DeadlineExceeded(err.to_string()),
        Failure::Other => {
            tracing::error!("{} statement failed: {}", label, err);
            CatalogError::Storage(err.to_string())
        }
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_postgres_sqlstates() {
        assert_eq!(classify_code(Some("23505")), Failure::UniqueViolation);
        assert_eq!(classify_code(Some("23503")), Failure::ForeignKeyViolation);
        assert_eq!(classify_code(Some("57014")), Failure::Timeout);
        assert_eq!(classify_code(Some("42P01")), Failure::Other);
        assert_eq!(classify_code(None), Failure::Other);
    }

    #[test]
    fn pool_timeout_is_a_deadline() {
        let err = to_catalog_error(sqlx::Error::PoolTimedOut, "Brand", "brand");
        assert!(matches!(err, CatalogError::DeadlineExceeded(_)));
    }

    #[test]
    fn missing_row_is_storage_error() {
        let err = to_catalog_error(sqlx::Error::RowNotFound, "Brand", "brand");
        assert!(matches!(err, CatalogError::Storage(_)));
    }
}
