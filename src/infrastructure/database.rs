//! 数据库基础设施

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::{error, info};

use crate::app::user::{
    model::User,
    store::{StoreError, UserStore},
};
use crate::config::DatabaseConfig;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL DEFAULT '',
        email VARCHAR(100) NOT NULL DEFAULT '',
        age INT NOT NULL DEFAULT 0
    )
"#;

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 建立连接池，检查连通性并确保 `users` 表存在
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!("[PostgresDB]: Connecting to database at {}...", config.describe());

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(8))
            .connect_with(connect_options(config))
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        let manager = Self { pool };
        manager.ensure_schema().await?;
        info!("Database connection successful");

        Ok(manager)
    }

    async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub fn user_store(&self) -> PgUserStore {
        PgUserStore::new(self.pool.clone())
    }
}

fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .ssl_mode(PgSslMode::Disable);

    if config.dbname.is_empty() {
        options
    } else {
        options.database(&config.dbname)
    }
}

/// 基于 PostgreSQL 的用户存储
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn add_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO users (name, email, age) VALUES ($1, $2, $3)")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("[PostgresDB]: Error inserting row: {}", e);
                e
            })?;
        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email, age FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("[PostgresDB]: Error scanning row: {}", e);
                e
            })?;

        user.ok_or(StoreError::NotFound(id))
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET name = $1, email = $2, age = $3 WHERE id = $4")
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("[PostgresDB]: Error updating row: {}", e);
                e
            })?;
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("[PostgresDB]: Error deleting row: {}", e);
                e
            })?;
        Ok(())
    }
}
