//! # 用户管理服务
//!
//! 单一 `User` 资源的 HTTP CRUD 服务，分层结构：
//! - `app`：用户模型、存储端口、业务服务与请求处理器
//! - `common`：统一错误、响应信封、中间件、在途请求计数
//! - `infrastructure`：PostgreSQL 存储、日志初始化、请求耗时日志工作池
//! - `server`：路由装配与服务生命周期

pub mod app;
pub mod config;
pub mod common;
pub mod infrastructure;
pub mod server;

pub use app::user::{
    handler::UserHandler,
    model::User,
    service::{ServiceError, UserService},
    store::{StoreError, UserStore},
};
pub use config::Config;
pub use server::{build_router, Server};
