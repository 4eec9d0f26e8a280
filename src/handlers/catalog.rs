use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::validation::parse_identifier;
use crate::catalog::{CatalogStore, Entity};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::pagination::{paginate, Page, PageQuery, PageRequest};

/// Router state for one entity's endpoints.
pub struct Resource<E: Entity> {
    pub store: Arc<dyn CatalogStore<E>>,
    pub max_page_size: i64,
}

impl<E: Entity> Resource<E> {
    pub fn new(store: Arc<dyn CatalogStore<E>>, max_page_size: i64) -> Self {
        Self {
            store,
            max_page_size,
        }
    }
}

impl<E: Entity> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_page_size: self.max_page_size,
        }
    }
}

/// GET /list?pageIndex=&pageSize=
pub async fn list<E: Entity>(
    State(resource): State<Resource<E>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Page<E::Table>>, ApiError> {
    let Query(query) = query?;
    let request = PageRequest::from_query(&query, resource.max_page_size)?;

    let store = &resource.store;
    let page = paginate(request, store.list(request), store.count()).await?;
    Ok(Json(page))
}

/// GET /:id
pub async fn get_one<E: Entity>(
    State(resource): State<Resource<E>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<E::Row>, ApiError> {
    let Path(id) = path?;
    let id = parse_identifier("id", &id)?;
    let row = resource.store.get(id).await?;
    Ok(Json(row))
}

/// POST /
pub async fn create<E: Entity>(
    State(resource): State<Resource<E>>,
    user: CurrentUser,
    payload: Result<Json<E::Payload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;
    let draft = E::validate(payload)?;

    let id = resource.store.create(user.id, &draft).await?;
    tracing::info!("{} {} created by {}", E::LABEL, id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("{} Created", E::LABEL),
            "id": id
        })),
    ))
}

/// PUT /:id
pub async fn edit<E: Entity>(
    State(resource): State<Resource<E>>,
    path: Result<Path<String>, PathRejection>,
    user: CurrentUser,
    payload: Result<Json<E::Payload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    let id = parse_identifier("id", &id)?;
    let Json(payload) = payload?;
    let draft = E::validate(payload)?;

    resource.store.edit(id, &draft).await?;
    tracing::info!("{} {} edited by {}", E::LABEL, id, user.id);

    Ok(Json(json!({ "message": format!("{} Edited", E::LABEL) })))
}

/// DELETE /:id
pub async fn delete<E: Entity>(
    State(resource): State<Resource<E>>,
    path: Result<Path<String>, PathRejection>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    let id = parse_identifier("id", &id)?;

    resource.store.delete(id).await?;
    tracing::info!("{} {} deleted by {}", E::LABEL, id, user.id);

    Ok(Json(json!({ "message": format!("{} Deleted", E::LABEL) })))
}
