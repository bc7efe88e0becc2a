//! 用户存储端口

use async_trait::async_trait;

use super::model::User;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(i32),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 其他存储实现的失败
    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// 用户行的增删改查能力，由关系型数据库适配器实现
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 插入新行，`user.id` 被忽略
    async fn add_user(&self, user: &User) -> Result<(), StoreError>;

    /// 按 ID 读取；出错即视为不存在
    async fn get_user(&self, id: i32) -> Result<User, StoreError>;

    /// 覆盖 `user.id` 对应行的全部可变字段
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    async fn delete_user(&self, id: i32) -> Result<(), StoreError>;
}
