//! 通用实体资源处理器
//!
//! 每个实体挂载四个端点：
//! - `GET /{resource}/{id}`
//! - `PUT /{resource}/{id}`
//! - `GET /{resource}?filter&limit&offset`
//! - `GET /{resource}/exists?filter`

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use domain::{Entity, EntityId, EntityRepository, Page};
use serde::Serialize;
use validator::Validate;

use crate::error::ApiError;

type Repository<E> = Arc<dyn EntityRepository<E>>;

#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ExistsResponse {
    exists: bool,
}

pub fn entity_routes<E: Entity>(repository: Repository<E>) -> Router {
    let base = format!("/{}", E::RESOURCE);
    Router::new()
        .route(&base, get(search::<E>))
        .route(&format!("{}/exists", base), get(exists::<E>))
        .route(
            &format!("{}/{{id}}", base),
            get(find_by_id::<E>).put(update::<E>),
        )
        .with_state(repository)
}

fn parse_id(raw: &str) -> Result<EntityId, ApiError> {
    Ok(EntityId::parse(raw)?)
}

fn query_or_bad_request<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn find_by_id<E: Entity>(
    State(repository): State<Repository<E>>,
    Path(raw_id): Path<String>,
) -> Result<Json<E>, ApiError> {
    let id = parse_id(&raw_id)?;
    repository
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(E::RESOURCE))
}

async fn update<E: Entity>(
    State(repository): State<Repository<E>>,
    Path(raw_id): Path<String>,
    payload: Result<Json<E::Changes>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let Json(changes) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    changes
        .validate()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    if !repository.update(id, changes).await? {
        return Err(ApiError::not_found(E::RESOURCE));
    }

    tracing::info!(resource = E::RESOURCE, id = %id, "entity updated");
    Ok(Json(UpdateResponse { success: true }))
}

async fn search<E: Entity>(
    State(repository): State<Repository<E>>,
    filter: Result<Query<E::Filter>, QueryRejection>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<E>>, ApiError> {
    let filter = query_or_bad_request(filter)?;
    let page = query_or_bad_request(page)?;
    let items = repository.search(filter, page).await?;
    Ok(Json(items))
}

async fn exists<E: Entity>(
    State(repository): State<Repository<E>>,
    filter: Result<Query<E::Filter>, QueryRejection>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let filter = query_or_bad_request(filter)?;
    let exists = repository.exists(filter).await?;
    Ok(Json(ExistsResponse { exists }))
}
