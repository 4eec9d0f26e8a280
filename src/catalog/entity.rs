use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow};

use super::error::CatalogError;

/// A user-owned catalog record type.
///
/// `Row` is the bare entity with foreign keys left as opaque ids, `Table` is the
/// listing view with referenced entities joined in. `Payload` is the request body
/// as sent by the client and `Draft` the validated business fields that create
/// and edit both write.
pub trait Entity: Send + Sync + 'static {
    /// Human-readable name used in response messages, e.g. "Brand".
    const LABEL: &'static str;

    type Row: Serialize + Send + Unpin + 'static + for<'r> FromRow<'r, PgRow>;
    type Table: Serialize + Send + Unpin + 'static + for<'r> FromRow<'r, PgRow>;
    type Payload: DeserializeOwned + Send + 'static;
    type Draft: Send + Sync + 'static;

    fn validate(payload: Self::Payload) -> Result<Self::Draft, CatalogError>;
}
