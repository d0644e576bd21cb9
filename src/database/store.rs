use async_trait::async_trait;

use crate::error::Result;
use crate::models::user::User;

/// Durable user-record persistence. Source of truth for every account; it
/// knows nothing about the credential cache sitting in front of it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates an account with a fresh apikey and secret token. The password
    /// is left unset.
    async fn create_user(&self, email: &str, username: &str) -> Result<User>;

    async fn get_user_by_username(&self, username: &str) -> Result<User>;

    async fn get_user_by_apikey(&self, apikey: &str) -> Result<User>;

    async fn get_users(&self) -> Result<Vec<User>>;

    async fn get_version(&self) -> Result<String>;

    /// Persists email, password, flags and `updated_at`, keyed by username.
    async fn update_user(&self, user: &User) -> Result<()>;
}
