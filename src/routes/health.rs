use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::dto::api_dto::VERSION;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "version": VERSION,
    });
    (StatusCode::OK, Json(body))
}
