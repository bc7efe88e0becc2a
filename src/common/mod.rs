//! 公共层：错误、响应、中间件与在途请求计数

pub mod error;
pub mod middleware;
pub mod pending;
pub mod response;
