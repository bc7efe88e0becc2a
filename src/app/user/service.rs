//! 用户业务服务

use std::sync::Arc;

use super::{
    model::User,
    store::{StoreError, UserStore},
};

/// 更新/删除的失败原因
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 写入前的存在性检查失败
    #[error("user {id} is missing: {source}")]
    Missing {
        id: i32,
        #[source]
        source: StoreError,
    },

    /// 存在性检查通过后写入失败
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 基于存储端口的业务编排
///
/// 更新与删除先读取目标行，读取失败则直接返回，不触发写入。
/// 检查与写入之间不是原子的，并发安全依赖处理器持有的写锁。
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.store.add_user(user).await
    }

    pub async fn get(&self, id: i32) -> Result<User, StoreError> {
        self.store.get_user(id).await
    }

    pub async fn update(&self, user: &User) -> Result<(), ServiceError> {
        self.ensure_exists(user.id).await?;
        Ok(self.store.update_user(user).await?)
    }

    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.ensure_exists(id).await?;
        Ok(self.store.delete_user(id).await?)
    }

    async fn ensure_exists(&self, id: i32) -> Result<(), ServiceError> {
        self.store
            .get_user(id)
            .await
            .map(|_| ())
            .map_err(|source| ServiceError::Missing { id, source })
    }
}
