pub mod api_service;
pub mod credential_cache;
pub mod event_service;
