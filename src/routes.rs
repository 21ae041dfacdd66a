// src/routes.rs
use log::info;
use std::convert::Infallible;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::fiscal::get_fiscal_as_of;
use crate::handlers::updates::get_latest_update;
use crate::handlers::SharedStore;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(store: SharedStore) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let store_filter = warp::any().map(move || store.clone());

    let latest_update_route = warp::path!("api" / "v1" / "updates" / "latest")
        .and(warp::get())
        .and(store_filter.clone())
        .and_then(get_latest_update);

    let fiscal_route = warp::path!("api" / "v1" / "fiscal" / String)
        .and(warp::get())
        .and(store_filter.clone())
        .and_then(get_fiscal_as_of);

    info!("All routes configured successfully.");

    latest_update_route.or(fiscal_route).recover(handle_rejection)
}
