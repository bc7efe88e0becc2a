//! 基础设施层

pub mod database;
pub mod duration_logger;
pub mod logger;
