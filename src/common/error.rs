//! 核心错误处理模块

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::response::Envelope;

/// 面向 HTTP 的错误类型，统一转换为信封响应
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// 请求体无法解析
    #[error("Invalid input")]
    InvalidInput,
    /// 路径中的用户 ID 不是整数
    #[error("Invalid user ID")]
    InvalidUserId,
    #[error("Not found")]
    NotFound,
    /// 存储失败或处理过程中的意外异常
    #[error("Server failure")]
    ServerFailure,
}

impl CoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CoreError::InvalidInput | CoreError::InvalidUserId => StatusCode::BAD_REQUEST,
            CoreError::NotFound => StatusCode::NOT_FOUND,
            CoreError::ServerFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        Envelope::new(self.status_code(), self.to_string()).into_response()
    }
}
