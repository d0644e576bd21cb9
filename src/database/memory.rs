//! In-process [`UserStore`] used when no `DATABASE_URL` is configured and by
//! the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::store::UserStore;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::{time, token};

pub const MEMORY_STORE_VERSION: &str = "in-memory user store";

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    // apikey -> username
    apikeys: HashMap<String, String>,
    // usernames in creation order
    order: Vec<String>,
}

#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, email: &str, username: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(username) {
            return Err(Error::Conflict(format!("user {} already exists", username)));
        }

        let now = time::now();
        let user = User {
            username: username.to_string(),
            password: String::new(),
            email: email.to_string(),
            apikey: token::generate_apikey(),
            secret_token: token::generate_secret_token(),
            is_deleted: false,
            is_active: true,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };

        tables
            .apikeys
            .insert(user.apikey.clone(), user.username.clone());
        tables.order.push(user.username.clone());
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(username)
            .cloned()
            .ok_or_else(|| Error::NotFound("user not found".to_string()))
    }

    async fn get_user_by_apikey(&self, apikey: &str) -> Result<User> {
        let tables = self.tables.read().await;
        tables
            .apikeys
            .get(apikey)
            .and_then(|username| tables.users.get(username))
            .cloned()
            .ok_or_else(|| Error::NotFound("user not found".to_string()))
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order
            .iter()
            .filter_map(|username| tables.users.get(username))
            .cloned()
            .collect())
    }

    async fn get_version(&self) -> Result<String> {
        Ok(MEMORY_STORE_VERSION.to_string())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .get_mut(&user.username)
            .ok_or_else(|| Error::NotFound(format!("user {}", user.username)))?;

        // Identity, credentials and creation time are owned by the store.
        stored.email = user.email.clone();
        stored.password = user.password.clone();
        stored.is_deleted = user.is_deleted;
        stored.is_active = user.is_active;
        stored.updated_at = user.updated_at;
        Ok(())
    }
}
