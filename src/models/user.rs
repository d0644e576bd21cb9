use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::store::UserStore;
use crate::error::Result;
use crate::utils::{crypto, time};

/// Account record. The password hash is never serialized outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub apikey: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret_token: String,
    pub is_deleted: bool,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// State transitions. Each one refreshes `updated_at` and persists the whole
// record through the store it was fetched from.
impl User {
    pub async fn update(&mut self, store: &dyn UserStore) -> Result<()> {
        self.updated_at = time::now();
        store.update_user(self).await
    }

    pub async fn set_email(&mut self, email: &str, store: &dyn UserStore) -> Result<()> {
        self.email = email.to_string();
        self.update(store).await
    }

    /// An empty password clears the stored hash, leaving the account unable
    /// to log in by password.
    pub async fn set_password(&mut self, password: &str, store: &dyn UserStore) -> Result<()> {
        self.password = if password.is_empty() {
            String::new()
        } else {
            crypto::hash_password(password)?
        };
        self.update(store).await
    }

    /// Soft delete; the record stays in the store with `is_deleted` set.
    pub async fn delete(&mut self, store: &dyn UserStore) -> Result<()> {
        self.is_deleted = true;
        self.update(store).await
    }

    pub async fn activate(&mut self, store: &dyn UserStore) -> Result<()> {
        self.is_active = true;
        self.update(store).await
    }

    pub async fn deactivate(&mut self, store: &dyn UserStore) -> Result<()> {
        self.is_active = false;
        self.update(store).await
    }

    pub fn is_password(&self, password: &str) -> Result<bool> {
        crypto::verify_password(password, &self.password)
    }
}
