// src/handlers/updates.rs
use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::SharedStore;

pub async fn get_latest_update(store: SharedStore) -> Result<Json, Rejection> {
    info!("Handling request for latest data update");

    let latest = store.latest_update().await.map_err(|e| {
        error!("Failed to read data_updates: {}", e);
        warp::reject::custom(ApiError::database_error(e.to_string()))
    })?;

    match latest {
        Some(record) => Ok(warp::reply::json(&record)),
        None => Err(warp::reject::custom(ApiError::not_found("No ingestion runs recorded yet"))),
    }
}
