// src/handlers/fiscal.rs
use chrono::NaiveDate;
use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::SharedStore;

/// Fiscal index in effect on `date`: the latest score dated on or before it.
pub async fn get_fiscal_as_of(date: String, store: SharedStore) -> Result<Json, Rejection> {
    info!("Handling request for fiscal index as of {}", date);

    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
        warp::reject::custom(ApiError::bad_request(format!("'{}' is not a YYYY-MM-DD date", date)))
    })?;

    let index = store.fiscal_index_as_of(date).await.map_err(|e| {
        error!("Failed to read fiscal_policy_indices: {}", e);
        warp::reject::custom(ApiError::database_error(e.to_string()))
    })?;

    match index {
        Some(index) => Ok(warp::reply::json(&index)),
        None => Err(warp::reject::custom(ApiError::not_found(format!(
            "No fiscal index on or before {}",
            date
        )))),
    }
}
