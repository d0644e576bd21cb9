use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::{
    dto::api_dto::{peek_method, Response},
    error::Error,
    middleware::method_policy::is_privileged,
    AppState,
};

/// Single JSON command endpoint. Private methods need the admin token; the
/// body is only fully parsed once the method is allowed.
#[axum::debug_handler]
pub async fn handle_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let method = peek_method(&body).unwrap_or_default();
    if !state.api.is_public_method(&method)
        && !is_privileged(&headers, state.admin_token.as_deref())
    {
        warn!(method = %method, "private method on unauthenticated channel");
        let err = Error::Forbidden(format!("method {} is not public", method));
        return (err.status_code(), Json(Response::from_error(&err)));
    }

    let (response, result) = state.api.handle_json(&body).await;
    let status = match result {
        Ok(()) => StatusCode::OK,
        Err(err) => err.status_code(),
    };
    (status, Json(response))
}
