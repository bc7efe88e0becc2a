//! 用户数据模型

use serde::{Deserialize, Serialize};

/// `users` 表中的一行
///
/// `id` 由存储分配，创建前为 0。缺失的字段按零值解码。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub age: i32,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}
