use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::UserStore;
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::{time, token};

const USER_COLUMNS: &str = r#"
    username,
    COALESCE(password, '') AS password,
    email,
    apikey,
    secret_token,
    is_deleted,
    is_active,
    is_superuser,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, email: &str, username: &str) -> Result<User> {
        let now = time::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, apikey, secret_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(token::generate_apikey())
        .bind(token::generate_secret_token())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict(format!("user {} already exists", username))
            }
            other => other.into(),
        })?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_apikey(&self, apikey: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE apikey = $1",
            USER_COLUMNS
        ))
        .bind(apikey)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_version(&self) -> Result<String> {
        let version: (String,) = sqlx::query_as("SELECT version()")
            .fetch_one(&self.pool)
            .await?;

        Ok(version.0)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                email = $1,
                password = NULLIF($2, ''),
                is_deleted = $3,
                is_active = $4,
                updated_at = $5
            WHERE username = $6
            "#,
        )
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.is_deleted)
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(&user.username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("user {}", user.username)));
        }
        Ok(())
    }
}
