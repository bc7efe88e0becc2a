//! 用户资源：模型、存储端口、业务服务与处理器

pub mod handler;
pub mod model;
pub mod service;
pub mod store;
