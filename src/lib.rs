pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::database::store::UserStore;
use crate::middleware::method_policy::MethodPolicy;
use crate::services::{api_service::ApiService, credential_cache::CredentialCache};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiService,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, config: &Config) -> Self {
        let cache = CredentialCache::new(Duration::from_secs(config.cache_ttl_secs));
        let policy = MethodPolicy::new(config.public_methods.iter().cloned());

        Self {
            api: ApiService::new(store, cache, policy),
            admin_token: config.admin_token.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/v1", post(routes::api::handle_command))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
